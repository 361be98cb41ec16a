//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::OverlapPolicy;
use crate::resource::ResourceKind;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub resources: ResourcesConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP behaviour shared by all resource clients
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in milliseconds; unset means requests may hang forever
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,

    #[serde(default)]
    pub overlap_policy: OverlapPolicy,
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

/// Where each resource is served from
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourcesConfig {
    #[serde(default)]
    pub total_deaths: EndpointConfig,

    #[serde(default)]
    pub excess_mortality: EndpointConfig,

    #[serde(default)]
    pub icd10_cases: EndpointConfig,

    #[serde(default)]
    pub pcr_plus_deaths: EndpointConfig,
}

/// Endpoint of one resource; unset fields fall back to the registry
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EndpointConfig {
    pub endpoint: Option<String>,
    pub path: Option<String>,
}

impl ResourcesConfig {
    pub fn get(&self, kind: ResourceKind) -> &EndpointConfig {
        match kind {
            ResourceKind::TotalDeaths => &self.total_deaths,
            ResourceKind::ExcessMortality => &self.excess_mortality,
            ResourceKind::Icd10Cases => &self.icd10_cases,
            ResourceKind::PcrPlusDeaths => &self.pcr_plus_deaths,
        }
    }

    fn get_mut(&mut self, kind: ResourceKind) -> &mut EndpointConfig {
        match kind {
            ResourceKind::TotalDeaths => &mut self.total_deaths,
            ResourceKind::ExcessMortality => &mut self.excess_mortality,
            ResourceKind::Icd10Cases => &mut self.icd10_cases,
            ResourceKind::PcrPlusDeaths => &mut self.pcr_plus_deaths,
        }
    }

    /// Effective base endpoint for `kind`
    pub fn endpoint(&self, kind: ResourceKind) -> &str {
        self.get(kind)
            .endpoint
            .as_deref()
            .unwrap_or(kind.descriptor().default_endpoint)
    }

    /// Effective path for `kind`
    pub fn path(&self, kind: ResourceKind) -> &str {
        self.get(kind)
            .path
            .as_deref()
            .unwrap_or(kind.descriptor().default_path)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Environment variable naming the endpoint of `kind`
pub fn endpoint_env_var(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::TotalDeaths => "MORTALITY_TOTAL_DEATHS_URL",
        ResourceKind::ExcessMortality => "MORTALITY_EXCESS_MORTALITY_URL",
        ResourceKind::Icd10Cases => "MORTALITY_ICD10_CASES_URL",
        ResourceKind::PcrPlusDeaths => "MORTALITY_PCR_PLUS_DEATHS_URL",
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("mortality-stats").join("config.toml")),
            Some(PathBuf::from("./mortality-stats.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::debug!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for kind in ResourceKind::ALL {
            if let Some(url) = lookup(endpoint_env_var(kind)) {
                self.resources.get_mut(kind).endpoint = Some(url);
            }
        }

        if let Some(timeout) = lookup("MORTALITY_REQUEST_TIMEOUT_MS") {
            match timeout.parse() {
                Ok(ms) => self.http.request_timeout_ms = Some(ms),
                Err(_) => tracing::warn!("Ignoring invalid MORTALITY_REQUEST_TIMEOUT_MS: {}", timeout),
            }
        }
        if let Some(policy) = lookup("MORTALITY_OVERLAP_POLICY") {
            match policy.parse() {
                Ok(policy) => self.http.overlap_policy = policy,
                Err(e) => tracing::warn!("Ignoring MORTALITY_OVERLAP_POLICY: {}", e),
            }
        }

        if let Some(level) = lookup("MORTALITY_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("MORTALITY_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Mortality Stats Configuration
#
# Environment variables override these settings:
# - MORTALITY_TOTAL_DEATHS_URL
# - MORTALITY_EXCESS_MORTALITY_URL
# - MORTALITY_ICD10_CASES_URL
# - MORTALITY_PCR_PLUS_DEATHS_URL
# - MORTALITY_REQUEST_TIMEOUT_MS
# - MORTALITY_OVERLAP_POLICY
# - MORTALITY_LOG_LEVEL
# - MORTALITY_LOG_FORMAT

[http]
# Request timeout in milliseconds. Unset: a hung request keeps loading forever.
# request_timeout_ms = 10000

# What happens when a load settles after a newer one was started:
# "last-settled" (the last response to arrive wins) or
# "latest-issued" (responses of superseded loads are dropped)
overlap_policy = "last-settled"

[resources.total_deaths]
endpoint = "http://localhost:8080"
path = "/total-deaths"

[resources.excess_mortality]
endpoint = "http://localhost:8081"
path = "/excess-mortality"

[resources.icd10_cases]
endpoint = "http://localhost:8081"
path = "/icd-10-cases"

[resources.pcr_plus_deaths]
# The path may be empty when it is part of the endpoint
endpoint = "http://localhost:8080"
path = "/pcr-plus-deaths"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
