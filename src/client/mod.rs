//! Resource Clients
//!
//! Reactive clients for the remote statistics services.
//!
//! ## Architecture
//!
//! - **Fetch**: the HTTP collaborator (reqwest in production)
//! - **ResourceClient**: one resource, one state triple, one load operation
//! - **ResourceSet**: a client per resource kind, built from configuration
//!
//! ## Data Flow
//!
//! 1. Presentation code calls `load` with filter parameters
//! 2. The query builder turns them into the request URL
//! 3. The orchestrator fetches and decodes the records
//! 4. The outcome is published through the `loading`, `result` and `error` cells

mod error;
mod fetch;
mod resource_client;
mod set;

pub use error::{ClientError, LoadError};
pub use fetch::{Fetch, HttpFetcher};
pub use resource_client::{OverlapPolicy, Record, ResourceClient};
pub use set::ResourceSet;
