//! NEF configuration (YAML)

use std::path::Path;
use std::time::Duration;

use ogs_sbi::HttpVersion;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parse error: {0}")]
    ParseError(#[from] serde_yaml::Error),
    #[error("configuration validation error: {0}")]
    ValidationError(String),
}

/// Southbound (SBI) settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SbiConf {
    /// NRF base URL
    pub nrf_svc: String,
    /// Discover the PCF through the NRF
    pub use_nrf: bool,
    /// Static PCF base URL, used when `use_nrf` is false
    pub pcf_svc: String,
    /// Outbound HTTP version, 1 or 2
    pub http_version: u8,
    /// Bound on every outbound request, in milliseconds
    pub request_timeout: u64,
}

impl Default for SbiConf {
    fn default() -> Self {
        Self {
            nrf_svc: "http://127.0.0.10:7777".to_string(),
            use_nrf: true,
            pcf_svc: String::new(),
            http_version: 2,
            request_timeout: 10_000,
        }
    }
}

impl SbiConf {
    pub fn http_version(&self) -> HttpVersion {
        HttpVersion::from_config(self.http_version).unwrap_or_default()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout)
    }
}

/// Northbound server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NbiConf {
    /// Bind address
    pub fqdn: String,
    pub port: u16,
}

impl Default for NbiConf {
    fn default() -> Self {
        Self {
            fqdn: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NefConfig {
    pub sbi: SbiConf,
    pub nbi: NbiConf,
    /// Copied into suppFeat of every app session context
    pub supported_features: String,
}

impl NefConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Reject configurations the NEF cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sbi.use_nrf {
            if self.sbi.nrf_svc.is_empty() {
                return Err(ConfigError::ValidationError(
                    "NRF is enabled and NRF svc is not set".to_string(),
                ));
            }
        } else if self.sbi.pcf_svc.is_empty() {
            return Err(ConfigError::ValidationError(
                "NRF is disabled and PCF svc is not set".to_string(),
            ));
        }
        if HttpVersion::from_config(self.sbi.http_version).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "unsupported sbi.httpVersion {}",
                self.sbi.http_version
            )));
        }
        if self.sbi.request_timeout == 0 {
            return Err(ConfigError::ValidationError(
                "sbi.requestTimeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// YAML rendering for the startup log
    pub fn dumps(&self) -> String {
        serde_yaml::to_string(self).unwrap_or_else(|e| format!("<unprintable configuration: {e}>"))
    }
}
