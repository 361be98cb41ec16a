//! HTTP collaborator
//!
//! [`Fetch`] is the seam between the load orchestrator and the network.
//! [`HttpFetcher`] is the reqwest implementation used in production.

use async_trait::async_trait;
use reqwest::{header::ACCEPT, Client};
use std::time::Duration;

use super::error::{ClientError, LoadError};

/// Performs a GET and returns the response body of a 2xx response
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn get(&self, url: &str) -> Result<String, LoadError>;
}

/// reqwest-backed [`Fetch`]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher; without a timeout a hung request never settles
    pub fn new(timeout: Option<Duration>) -> Result<Self, ClientError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ClientError::HttpClient)?;

        Ok(Self { client })
    }

    /// Wrap an already configured client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn get(&self, url: &str) -> Result<String, LoadError> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}
