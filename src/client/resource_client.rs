//! Resource Client
//!
//! One client per resource kind. A client owns its endpoint, its load state
//! triple and a handle to the HTTP collaborator; clients never share state.
//!
//! [`ResourceClient::load`] is the load orchestrator:
//!
//! 1. raise `loading`, clear `error` (`result` keeps its stale value)
//! 2. fetch and decode the records
//! 3. on success store the records in `result`
//! 4. on failure store `"{prefix}: {message}"` in `error`, keeping `result`
//! 5. always lower `loading`, also when the caller drops the load future
//!
//! Overlapping loads on one client are neither queued nor cancelled. What
//! happens when they settle out of order is decided by [`OverlapPolicy`].

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::error::{ClientError, LoadError};
use super::fetch::Fetch;
use crate::config::Config;
use crate::resource::{request_url, FilterParams, ResourceDescriptor, ResourceKind};
use crate::state::{Cell, LoadState, Payload};

/// Opaque row of a remote dataset
pub type Record = serde_json::Value;

/// How a client treats loads that settle after a newer load was issued
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlapPolicy {
    /// Every settlement writes its outcome; the last one to settle wins
    #[default]
    LastSettled,
    /// Settlements of superseded loads are dropped without touching the cells
    LatestIssued,
}

impl std::str::FromStr for OverlapPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last-settled" => Ok(OverlapPolicy::LastSettled),
            "latest-issued" => Ok(OverlapPolicy::LatestIssued),
            other => Err(format!("Unknown overlap policy: {}", other)),
        }
    }
}

/// Reactive client for one remote resource
pub struct ResourceClient<R = Record> {
    descriptor: &'static ResourceDescriptor,
    endpoint: String,
    path: String,
    fetcher: Arc<dyn Fetch>,
    policy: OverlapPolicy,
    /// Generation of the most recently issued load
    issued: AtomicU64,
    state: LoadState<R>,
}

impl<R> std::fmt::Debug for ResourceClient<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceClient")
            .field("kind", &self.descriptor.kind)
            .field("endpoint", &self.endpoint)
            .field("path", &self.path)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl<R> ResourceClient<R>
where
    R: DeserializeOwned + Send + Sync + 'static,
{
    /// Create a client with a fresh idle state triple
    ///
    /// The path defaults to the registry's path for `kind`.
    pub fn new(
        kind: ResourceKind,
        endpoint: impl Into<String>,
        fetcher: Arc<dyn Fetch>,
    ) -> Result<Self, ClientError> {
        let endpoint = endpoint.into();
        validate_endpoint(&endpoint)?;
        let descriptor = kind.descriptor();

        Ok(Self {
            descriptor,
            endpoint,
            path: descriptor.default_path.to_string(),
            fetcher,
            policy: OverlapPolicy::default(),
            issued: AtomicU64::new(0),
            state: LoadState::new(),
        })
    }

    /// Client for `kind` with the endpoint, path and overlap policy from `config`
    ///
    /// Only the endpoint of `kind` is validated.
    pub fn from_config(
        kind: ResourceKind,
        config: &Config,
        fetcher: Arc<dyn Fetch>,
    ) -> Result<Self, ClientError> {
        Ok(Self::new(kind, config.resources.endpoint(kind), fetcher)?
            .with_path(config.resources.path(kind))
            .with_policy(config.http.overlap_policy))
    }

    /// Override the path appended to the endpoint
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_policy(mut self, policy: OverlapPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn kind(&self) -> ResourceKind {
        self.descriptor.kind
    }

    pub fn descriptor(&self) -> &'static ResourceDescriptor {
        self.descriptor
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn policy(&self) -> OverlapPolicy {
        self.policy
    }

    /// Request URL a load with `params` would hit
    pub fn url_for(&self, params: &FilterParams) -> String {
        request_url(&self.endpoint, &self.path, self.descriptor, params)
    }

    pub fn state(&self) -> &LoadState<R> {
        &self.state
    }

    pub fn loading(&self) -> &Cell<bool> {
        self.state.loading()
    }

    pub fn result(&self) -> &Cell<Option<Payload<R>>> {
        self.state.result()
    }

    pub fn error(&self) -> &Cell<Option<String>> {
        self.state.error()
    }

    /// Load the resource with `params`
    ///
    /// Never fails: the outcome is published through the state cells.
    pub async fn load(&self, params: &FilterParams) {
        let generation = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let url = self.url_for(params);
        let resource = self.descriptor.slug;

        self.state.begin();
        let settle = Settle {
            state: &self.state,
            issued: &self.issued,
            policy: self.policy,
            generation,
        };
        tracing::debug!(resource, generation, url = %url, "Loading resource");

        let outcome = self.fetch_records(&url).await;

        if !settle.is_current() {
            tracing::debug!(resource, generation, "Discarding superseded response");
            return;
        }

        match outcome {
            Ok(records) => {
                tracing::info!(
                    resource,
                    generation,
                    records = records.len(),
                    "Resource loaded"
                );
                self.state.succeed(records);
            }
            Err(e) => {
                tracing::warn!(resource, generation, error = %e, "Resource load failed");
                self.state.fail(e.describe(self.descriptor.error_prefix));
            }
        }
    }

    async fn fetch_records(&self, url: &str) -> Result<Vec<R>, LoadError> {
        let body = self.fetcher.get(url).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Lowers `loading` when a load ends, however it ends
///
/// Runs on normal completion and when the load future is dropped mid-flight.
/// A load superseded under [`OverlapPolicy::LatestIssued`] leaves the cells
/// to the newer load.
struct Settle<'a, R> {
    state: &'a LoadState<R>,
    issued: &'a AtomicU64,
    policy: OverlapPolicy,
    generation: u64,
}

impl<R> Settle<'_, R> {
    /// Whether this load may still write the cells
    fn is_current(&self) -> bool {
        self.policy == OverlapPolicy::LastSettled
            || self.issued.load(Ordering::SeqCst) == self.generation
    }
}

impl<R> Drop for Settle<'_, R> {
    fn drop(&mut self) {
        if self.is_current() {
            self.state.finish();
        }
    }
}

fn validate_endpoint(endpoint: &str) -> Result<(), ClientError> {
    let invalid = |reason: String| ClientError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };

    let url = reqwest::Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(format!("unsupported scheme {}", other))),
    }
}
