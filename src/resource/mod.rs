//! Resource Registry
//!
//! The statistical datasets served by the backend services. Each kind is a
//! row in a static table: default endpoint, path segment, minimum accepted
//! year and the filter parameters the service understands.
//!
//! Adding a dataset means adding a [`ResourceKind`] variant and a row to
//! [`REGISTRY`]; the query builder and the client are driven by the row.

pub mod query;

pub use query::{build_query, request_url};

use std::fmt;
use std::str::FromStr;

/// The statistical datasets known to the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    TotalDeaths,
    ExcessMortality,
    Icd10Cases,
    PcrPlusDeaths,
}

impl ResourceKind {
    /// Every kind, in registry order
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::TotalDeaths,
        ResourceKind::ExcessMortality,
        ResourceKind::Icd10Cases,
        ResourceKind::PcrPlusDeaths,
    ];

    /// Registry row for this kind
    pub fn descriptor(self) -> &'static ResourceDescriptor {
        match self {
            ResourceKind::TotalDeaths => &REGISTRY[0],
            ResourceKind::ExcessMortality => &REGISTRY[1],
            ResourceKind::Icd10Cases => &REGISTRY[2],
            ResourceKind::PcrPlusDeaths => &REGISTRY[3],
        }
    }

    /// Kebab-case name, e.g. `total-deaths`
    pub fn slug(self) -> &'static str {
        self.descriptor().slug
    }

    /// Earliest year the backing service accepts
    pub fn min_year(self) -> i32 {
        self.descriptor().min_year
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.slug())
    }
}

impl FromStr for ResourceKind {
    type Err = UnknownResource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.slug() == normalized)
            .ok_or_else(|| UnknownResource(s.to_string()))
    }
}

/// Returned when a resource name does not match any registry row
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown resource: {0}")]
pub struct UnknownResource(pub String);

/// A filter parameter understood by at least one backing service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    Code,
    From,
    To,
    AgeGroups,
    Nocode,
}

impl Param {
    /// Name of the parameter in the query string
    pub fn query_name(self) -> &'static str {
        match self {
            Param::Code => "code",
            Param::From => "from",
            Param::To => "to",
            Param::AgeGroups => "ageGroups",
            Param::Nocode => "nocode",
        }
    }
}

/// One row of the resource registry
#[derive(Debug)]
pub struct ResourceDescriptor {
    pub kind: ResourceKind,
    pub slug: &'static str,
    /// Base endpoint used when the configuration does not name one
    pub default_endpoint: &'static str,
    /// Path appended to the endpoint; may be empty when baked into the endpoint
    pub default_path: &'static str,
    pub min_year: i32,
    /// Parameter identifying the series within the dataset, always emitted first
    pub identity: Option<Param>,
    /// Optional filters the service accepts
    pub filters: &'static [Param],
    /// Fixed prefix of the message stored in the error cell
    pub error_prefix: &'static str,
}

impl ResourceDescriptor {
    /// Whether the service accepts `param`
    pub fn supports(&self, param: Param) -> bool {
        self.identity == Some(param) || self.filters.contains(&param)
    }
}

/// Static, read-only resource table
pub static REGISTRY: [ResourceDescriptor; 4] = [
    ResourceDescriptor {
        kind: ResourceKind::TotalDeaths,
        slug: "total-deaths",
        default_endpoint: "http://localhost:8080",
        default_path: "/total-deaths",
        min_year: 2005,
        identity: None,
        filters: &[Param::From, Param::To, Param::AgeGroups],
        error_prefix: "Failed to load total deaths",
    },
    ResourceDescriptor {
        kind: ResourceKind::ExcessMortality,
        slug: "excess-mortality",
        default_endpoint: "http://localhost:8081",
        default_path: "/excess-mortality",
        min_year: 2005,
        identity: None,
        filters: &[Param::From, Param::To, Param::AgeGroups],
        error_prefix: "Failed to load excess mortalities",
    },
    ResourceDescriptor {
        kind: ResourceKind::Icd10Cases,
        slug: "icd-10-cases",
        default_endpoint: "http://localhost:8081",
        default_path: "/icd-10-cases",
        min_year: 2016,
        identity: Some(Param::Code),
        filters: &[Param::From, Param::To, Param::Nocode],
        error_prefix: "Failed to load ICD-10 cases",
    },
    ResourceDescriptor {
        kind: ResourceKind::PcrPlusDeaths,
        slug: "pcr-plus-deaths",
        default_endpoint: "http://localhost:8080",
        default_path: "/pcr-plus-deaths",
        min_year: 2005,
        identity: None,
        filters: &[Param::From, Param::To],
        error_prefix: "Failed to load pcr plus deaths",
    },
];

/// User-supplied filters for a load
///
/// Every field is optional; the query builder applies the defaulting rules
/// of the target resource and ignores fields the resource does not support.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterParams {
    pub from: Option<i32>,
    pub to: Option<i32>,
    /// Age-group codes, emitted in the order given
    pub age_groups: Option<Vec<String>>,
    pub code: Option<String>,
    /// Emitted whenever supplied, including `Some(false)`
    pub nocode: Option<bool>,
}

impl FilterParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters for an ICD-10 series
    pub fn icd10(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            ..Self::default()
        }
    }

    pub fn from_year(mut self, year: i32) -> Self {
        self.from = Some(year);
        self
    }

    pub fn to_year(mut self, year: i32) -> Self {
        self.to = Some(year);
        self
    }

    pub fn age_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.age_groups = Some(groups.into_iter().map(Into::into).collect());
        self
    }

    pub fn nocode(mut self, nocode: bool) -> Self {
        self.nocode = Some(nocode);
        self
    }
}
