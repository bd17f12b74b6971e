//! DNS provider implementations.

mod digitalocean;


pub use digitalocean::DigitalOceanProvider;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A DNS record as the provider reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRecord {
    pub id: u64,
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub data: String,
}

/// One page of a record listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPage {
    pub records: Vec<ProviderRecord>,
    /// No further pages follow this one.
    pub last_page: bool,
}

/// New contents for an existing record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordEdit {
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub data: String,
}

/// Operations consumed from a DNS hosting API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &'static str;

    /// List records of `domain` named `fqdn`. Pages are numbered from 1.
    async fn list_records(&self, domain: &str, fqdn: &str, page: u32) -> Result<RecordPage>;

    /// Overwrite record `record_id` of `domain`.
    async fn edit_record(&self, domain: &str, record_id: u64, edit: &RecordEdit) -> Result<()>;
}
