//! Resource set
//!
//! One independently owned [`ResourceClient`] per resource kind, wired from
//! the configuration. This is the surface presentation code binds to: each
//! resource exposes its load operation and its three cells by name.

use std::sync::Arc;

use super::error::ClientError;
use super::fetch::{Fetch, HttpFetcher};
use super::resource_client::{Record, ResourceClient};
use crate::config::Config;
use crate::resource::{FilterParams, ResourceKind};

/// All resource clients of the dashboard
#[derive(Debug)]
pub struct ResourceSet {
    total_deaths: ResourceClient,
    excess_mortality: ResourceClient,
    icd10_cases: ResourceClient,
    pcr_plus_deaths: ResourceClient,
}

impl ResourceSet {
    /// Build clients backed by reqwest
    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        let fetcher = HttpFetcher::new(config.http.request_timeout())?;
        Self::with_fetcher(config, Arc::new(fetcher))
    }

    /// Build clients sharing `fetcher`; each still gets its own state triple
    pub fn with_fetcher(config: &Config, fetcher: Arc<dyn Fetch>) -> Result<Self, ClientError> {
        let build = |kind: ResourceKind| -> Result<ResourceClient, ClientError> {
            ResourceClient::from_config(kind, config, Arc::clone(&fetcher))
        };

        Ok(Self {
            total_deaths: build(ResourceKind::TotalDeaths)?,
            excess_mortality: build(ResourceKind::ExcessMortality)?,
            icd10_cases: build(ResourceKind::Icd10Cases)?,
            pcr_plus_deaths: build(ResourceKind::PcrPlusDeaths)?,
        })
    }

    pub fn get(&self, kind: ResourceKind) -> &ResourceClient<Record> {
        match kind {
            ResourceKind::TotalDeaths => &self.total_deaths,
            ResourceKind::ExcessMortality => &self.excess_mortality,
            ResourceKind::Icd10Cases => &self.icd10_cases,
            ResourceKind::PcrPlusDeaths => &self.pcr_plus_deaths,
        }
    }

    pub fn total_deaths(&self) -> &ResourceClient {
        &self.total_deaths
    }

    pub fn excess_mortality(&self) -> &ResourceClient {
        &self.excess_mortality
    }

    pub fn icd10_cases(&self) -> &ResourceClient {
        &self.icd10_cases
    }

    pub fn pcr_plus_deaths(&self) -> &ResourceClient {
        &self.pcr_plus_deaths
    }

    pub async fn load_total_deaths(
        &self,
        from: Option<i32>,
        to: Option<i32>,
        age_groups: Option<Vec<String>>,
    ) {
        let params = FilterParams {
            from,
            to,
            age_groups,
            ..FilterParams::default()
        };
        self.total_deaths.load(&params).await;
    }

    pub async fn load_excess_mortalities(
        &self,
        from: Option<i32>,
        to: Option<i32>,
        age_groups: Option<Vec<String>>,
    ) {
        let params = FilterParams {
            from,
            to,
            age_groups,
            ..FilterParams::default()
        };
        self.excess_mortality.load(&params).await;
    }

    pub async fn load_icd10_cases(
        &self,
        code: &str,
        from: Option<i32>,
        to: Option<i32>,
        nocode: Option<bool>,
    ) {
        let params = FilterParams {
            code: Some(code.to_string()),
            from,
            to,
            nocode,
            ..FilterParams::default()
        };
        self.icd10_cases.load(&params).await;
    }

    pub async fn load_pcr_plus_deaths(&self, from: Option<i32>, to: Option<i32>) {
        let params = FilterParams {
            from,
            to,
            ..FilterParams::default()
        };
        self.pcr_plus_deaths.load(&params).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_default_config() {
        let set = ResourceSet::from_config(&Config::default()).unwrap();
        for kind in ResourceKind::ALL {
            let client = set.get(kind);
            assert_eq!(client.kind(), kind);
            assert_eq!(client.endpoint(), kind.descriptor().default_endpoint);
            assert!(!client.loading().get());
        }
        assert_eq!(
            set.icd10_cases().url_for(&FilterParams::icd10("A00")),
            "http://localhost:8081/icd-10-cases?code=A00&from=2016"
        );
    }

    #[test]
    fn test_invalid_endpoint_in_config() {
        let mut config = Config::default();
        config.resources.total_deaths.endpoint = Some("localhost:8080".to_string());
        // "localhost:8080" parses with scheme "localhost"
        let err = ResourceSet::from_config(&config).unwrap_err();
        assert!(matches!(err, ClientError::InvalidEndpoint { .. }));
    }

    #[test]
    fn test_clients_do_not_share_state() {
        let set = ResourceSet::from_config(&Config::default()).unwrap();
        set.total_deaths().state().fail("boom".to_string());
        assert!(set.excess_mortality().error().get().is_none());
        assert!(set.pcr_plus_deaths().error().get().is_none());
    }
}
