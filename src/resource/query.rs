//! Query Builder
//!
//! Turns [`FilterParams`] into the canonical query string of a resource.
//! All inputs are defaulted; nothing here fails.
//!
//! Rules, with `MIN` the resource's minimum year:
//! - `from` is always emitted; values `<= MIN` (or absent) become `MIN`
//! - `to` is emitted only when `>= MIN`
//! - `ageGroups` is emitted only when non-empty, comma-joined in caller order
//! - `code` is emitted first for resources identified by a code
//! - `nocode` is emitted whenever it was supplied, even when `false`

use super::{FilterParams, Param, ResourceDescriptor};
use urlencoding::encode;

/// Build the query string, including the leading `?`
pub fn build_query(descriptor: &ResourceDescriptor, params: &FilterParams) -> String {
    let min = descriptor.min_year;
    let mut pairs: Vec<(Param, String)> = Vec::with_capacity(5);

    if descriptor.identity == Some(Param::Code) {
        let code = params.code.as_deref().unwrap_or_default();
        pairs.push((Param::Code, encode(code).into_owned()));
    }

    // Keep the caller's year only when strictly after MIN
    let from = match params.from {
        Some(year) if year > min => year,
        _ => min,
    };
    pairs.push((Param::From, from.to_string()));

    if let Some(to) = params.to.filter(|&year| year >= min) {
        pairs.push((Param::To, to.to_string()));
    }

    if descriptor.supports(Param::AgeGroups) {
        if let Some(groups) = params.age_groups.as_ref().filter(|g| !g.is_empty()) {
            let joined = groups
                .iter()
                .map(|group| encode(group))
                .collect::<Vec<_>>()
                .join(",");
            pairs.push((Param::AgeGroups, joined));
        }
    }

    if descriptor.supports(Param::Nocode) {
        if let Some(nocode) = params.nocode {
            pairs.push((Param::Nocode, nocode.to_string()));
        }
    }

    let mut query = String::from("?");
    for (i, (param, value)) in pairs.iter().enumerate() {
        if i > 0 {
            query.push('&');
        }
        query.push_str(param.query_name());
        query.push('=');
        query.push_str(value);
    }
    query
}

/// Full request URL: endpoint, then path, then query
///
/// A non-empty path is joined with exactly one `/`, whether or not it was
/// configured with a leading slash.
pub fn request_url(
    endpoint: &str,
    path: &str,
    descriptor: &ResourceDescriptor,
    params: &FilterParams,
) -> String {
    let separator = if path.is_empty() || path.starts_with('/') {
        ""
    } else {
        "/"
    };
    format!(
        "{}{}{}{}",
        endpoint.trim_end_matches('/'),
        separator,
        path,
        build_query(descriptor, params)
    )
}
