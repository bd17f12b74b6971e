//! Configuration management for do-ddns.

use crate::error::{DdnsError, Result};
use crate::record::AddressFamily;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Shortest accepted update period.
pub const MIN_PERIOD: Duration = Duration::from_secs(5);

/// Period used when the configured one is missing or too short.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(15 * 60);

/// Longest accepted update period.
pub const MAX_PERIOD: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// DigitalOcean API base URL.
pub const DEFAULT_API_URL: &str = "https://api.digitalocean.com";

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to a file holding the API token.
    pub token_file: PathBuf,

    /// Domain (zone) the records live in, e.g. "example.com".
    pub domain: String,

    /// Hostname or subdomain inside the domain; "@" for the apex.
    pub hostname: String,

    /// Update period in seconds.
    #[serde(default, rename = "period")]
    pub period_secs: Option<f64>,

    /// Manage A records.
    #[serde(default = "default_true")]
    pub ipv4: bool,

    /// Manage AAAA records.
    #[serde(default)]
    pub ipv6: bool,

    /// Public IP service used for A records.
    #[serde(default = "default_ipv4_service")]
    pub ipv4_service: ServiceConfig,

    /// Public IP service used for AAAA records.
    #[serde(default = "default_ipv6_service")]
    pub ipv6_service: ServiceConfig,

    /// Provider API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

fn default_true() -> bool {
    true
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_ipv4_service() -> ServiceConfig {
    ServiceConfig::text("https://api.ipify.org")
}

fn default_ipv6_service() -> ServiceConfig {
    ServiceConfig::text("https://api6.ipify.org")
}

fn default_field() -> String {
    "query".to_string()
}

/// A public IP service endpoint and how to read its answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub url: String,

    #[serde(default)]
    pub format: ResponseFormat,

    /// JSON field holding the address (json format only).
    #[serde(default = "default_field")]
    pub field: String,
}

impl ServiceConfig {
    /// A service whose body is the bare address.
    pub fn text(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            format: ResponseFormat::Text,
            field: default_field(),
        }
    }

    /// A service answering `{"<field>": "<ip>"}`.
    pub fn json(url: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            format: ResponseFormat::Json,
            field: field.into(),
        }
    }
}

/// Body format of a public IP service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    #[default]
    Text,
    Json,
}

impl Config {
    /// Load configuration from a specific path.
    ///
    /// Files ending in `.toml` are read as TOML, everything else as JSON.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DdnsError::Config(format!("read {}: {}", path.display(), e))
        })?;

        let config: Config = if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content)?
        } else {
            serde_json::from_str(&content)
                .map_err(|e| DdnsError::Config(format!("parse {}: {}", path.display(), e)))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Check the fields that cannot be defaulted.
    pub fn validate(&self) -> Result<()> {
        if self.domain.trim().is_empty() {
            return Err(DdnsError::Config("domain is empty".to_string()));
        }
        if !self.ipv4 && !self.ipv6 {
            return Err(DdnsError::Config(
                "at least one must be set to true: ipv4, ipv6".to_string(),
            ));
        }
        if let Some(secs) = self.period_secs {
            if secs > MAX_PERIOD.as_secs_f64() {
                return Err(DdnsError::Config(format!(
                    "period {}s out of range; must be at most {}s",
                    secs,
                    MAX_PERIOD.as_secs()
                )));
            }
        }
        Ok(())
    }

    /// Fully qualified name of the managed records.
    pub fn fqdn(&self) -> String {
        match self.hostname.trim() {
            "" | "@" => self.domain.clone(),
            host => format!("{}.{}", host, self.domain),
        }
    }

    /// Record name as the provider expects it on edit.
    pub fn record_name(&self) -> &str {
        match self.hostname.trim() {
            "" => "@",
            host => host,
        }
    }

    /// Families this configuration manages, in tick order.
    pub fn families(&self) -> Vec<AddressFamily> {
        AddressFamily::ALL
            .into_iter()
            .filter(|family| self.manages(*family))
            .collect()
    }

    pub fn manages(&self, family: AddressFamily) -> bool {
        match family {
            AddressFamily::V4 => self.ipv4,
            AddressFamily::V6 => self.ipv6,
        }
    }

    /// Public IP service for `family`.
    pub fn service(&self, family: AddressFamily) -> &ServiceConfig {
        match family {
            AddressFamily::V4 => &self.ipv4_service,
            AddressFamily::V6 => &self.ipv6_service,
        }
    }

    /// Update period, replacing anything shorter than [`MIN_PERIOD`] with
    /// [`DEFAULT_PERIOD`] and capping it at [`MAX_PERIOD`].
    pub fn period(&self) -> Duration {
        let Some(secs) = self.period_secs else {
            tracing::info!("period not set; using {}s", DEFAULT_PERIOD.as_secs());
            return DEFAULT_PERIOD;
        };

        match Duration::try_from_secs_f64(secs) {
            Ok(period) if period > MAX_PERIOD => {
                tracing::warn!("period {}s too long; capping at {}s", secs, MAX_PERIOD.as_secs());
                MAX_PERIOD
            }
            Ok(period) if period >= MIN_PERIOD => period,
            Ok(_) => {
                tracing::warn!(
                    "period {}s too short; increasing to {}s",
                    secs,
                    DEFAULT_PERIOD.as_secs()
                );
                DEFAULT_PERIOD
            }
            Err(_) if secs > 0.0 => {
                tracing::warn!(
                    "period {}s out of range; capping at {}s",
                    secs,
                    MAX_PERIOD.as_secs()
                );
                MAX_PERIOD
            }
            Err(_) => {
                tracing::warn!(
                    "period {} is not a valid duration; using {}s",
                    secs,
                    DEFAULT_PERIOD.as_secs()
                );
                DEFAULT_PERIOD
            }
        }
    }

    /// Read the API token named by `token_file`.
    pub fn load_token(&self) -> Result<String> {
        load_token(&self.token_file)
    }
}

/// Read an API token from `path`, trimming surrounding whitespace.
pub fn load_token(path: &Path) -> Result<String> {
    if path.as_os_str().is_empty() {
        return Err(DdnsError::Config("token file path is empty".to_string()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| DdnsError::Config(format!("read {}: {}", path.display(), e)))?;

    let token = content.trim();
    if token.is_empty() {
        return Err(DdnsError::Config(format!(
            "API token in {} is empty",
            path.display()
        )));
    }

    Ok(token.to_string())
}

/// Default config file locations, most specific first.
pub fn default_paths() -> Vec<PathBuf> {
    [
        dirs::config_dir().map(|p| p.join("do-ddns/config.json")),
        Some(PathBuf::from("/etc/do-ddns/config.json")),
        Some(PathBuf::from("config.json")),
    ]
    .into_iter()
    .flatten()
    .collect()
}
