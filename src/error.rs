//! Error types for do-ddns.

use thiserror::Error;

/// Result type alias for do-ddns.
pub type Result<T> = std::result::Result<T, DdnsError>;

/// DDNS error types.
#[derive(Error, Debug)]
pub enum DdnsError {
    /// Malformed or missing configuration or credentials.
    #[error("Configuration error: {0}")]
    Config(String),

    /// None of the requested record types exist for the hostname.
    #[error("no A or AAAA records found for {fqdn}; create them at the provider first")]
    NoRecordsFound { fqdn: String },

    /// Listing records failed during discovery.
    #[error("failed to list DNS records (page {page}): {source}")]
    ProviderQueryFailed {
        page: u32,
        #[source]
        source: Box<DdnsError>,
    },

    /// The public IP service could not be reached or answered with a non-success status.
    #[error("public IP service {url} unavailable: {reason}")]
    ServiceUnavailable { url: String, reason: String },

    /// The public IP service answered with something that is not an address of the wanted family.
    #[error("invalid response from public IP service {url}: {reason}")]
    InvalidResponse { url: String, reason: String },

    /// A record edit was rejected.
    #[error("failed to edit record {record_id}: {source}")]
    ProviderEditFailed {
        record_id: u64,
        #[source]
        source: Box<DdnsError>,
    },

    /// Network/HTTP error.
    #[error("Network error: {0}")]
    Network(String),

    /// Provider-specific error.
    #[error("Provider error ({provider}): {message}")]
    Provider { provider: String, message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DdnsError {
    /// Whether this error can only occur during startup and must end the process.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DdnsError::Config(_)
                | DdnsError::NoRecordsFound { .. }
                | DdnsError::ProviderQueryFailed { .. }
                | DdnsError::Io(_)
        )
    }
}

impl From<reqwest::Error> for DdnsError {
    fn from(e: reqwest::Error) -> Self {
        DdnsError::Network(e.to_string())
    }
}

impl From<toml::de::Error> for DdnsError {
    fn from(e: toml::de::Error) -> Self {
        DdnsError::Config(e.to_string())
    }
}

impl From<serde_json::Error> for DdnsError {
    fn from(e: serde_json::Error) -> Self {
        DdnsError::Serialization(e.to_string())
    }
}
