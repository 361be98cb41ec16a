//! # Mortality Stats
//!
//! Reactive clients for public-health time series served over HTTP:
//! total deaths, excess mortality, ICD-10 coded cases and PCR-positive deaths.
//!
//! ## Modules
//!
//! - [`resource`]: resource registry, filter parameters and query builder
//! - [`state`]: observable cells and the per-client load state triple
//! - [`client`]: resource clients and the load orchestrator
//! - [`config`]: TOML and environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mortality_stats::{Config, ResourceSet};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let resources = ResourceSet::from_config(&Config::load_default())?;
//!     let client = resources.icd10_cases();
//!
//!     // Observe the busy flag from another task
//!     let mut loading = client.loading().subscribe();
//!     tokio::spawn(async move {
//!         while loading.changed().await.is_ok() {
//!             println!("loading: {}", *loading.borrow_and_update());
//!         }
//!     });
//!
//!     resources.load_icd10_cases("A00", Some(2018), Some(2020), None).await;
//!
//!     match client.error().get() {
//!         Some(message) => eprintln!("{}", message),
//!         None => {
//!             let records = client.result().get().unwrap_or_default();
//!             println!("Loaded {} records", records.len());
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod resource;
pub mod state;

pub use client::{
    ClientError, Fetch, HttpFetcher, LoadError, OverlapPolicy, Record, ResourceClient,
    ResourceSet,
};

pub use config::{Config, ConfigError, EndpointConfig, HttpConfig, LoggingConfig, ResourcesConfig};

pub use resource::{
    build_query, request_url, FilterParams, Param, ResourceDescriptor, ResourceKind, REGISTRY,
};

pub use state::{Cell, LoadPhase, LoadSnapshot, LoadState, Payload};
