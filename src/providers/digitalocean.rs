//! DigitalOcean DNS provider.

use super::{DnsProvider, ProviderRecord, RecordEdit, RecordPage};
use crate::error::{DdnsError, Result};
use async_trait::async_trait;
use serde::Deserialize;

/// Records requested per listing page.
const PER_PAGE: u32 = 200;

/// DigitalOcean DNS provider.
pub struct DigitalOceanProvider {
    client: reqwest::Client,
    api_token: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct RecordsResponse {
    domain_records: Vec<ProviderRecord>,
    #[serde(default)]
    links: Option<Links>,
}

#[derive(Debug, Deserialize)]
struct Links {
    #[serde(default)]
    pages: Option<Pages>,
}

#[derive(Debug, Deserialize)]
struct Pages {
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    id: String,
    message: String,
}

impl RecordsResponse {
    fn is_last_page(&self) -> bool {
        self.links
            .as_ref()
            .and_then(|links| links.pages.as_ref())
            .map_or(true, |pages| pages.next.is_none())
    }
}

impl DigitalOceanProvider {
    /// Create a provider talking to `base_url`, normally
    /// [`DEFAULT_API_URL`](crate::config::DEFAULT_API_URL).
    pub fn with_base_url(api_token: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_token,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn records_url(&self, domain: &str) -> String {
        format!("{}/v2/domains/{}/records", self.base_url, domain)
    }

    /// Turn a non-success response into a provider error.
    async fn api_error(response: reqwest::Response) -> DdnsError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        let message = match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(error) => format!("{} ({}): {}", status, error.id, error.message),
            Err(_) => format!("{}: {}", status, body.trim()),
        };

        DdnsError::Provider {
            provider: "digitalocean".to_string(),
            message,
        }
    }
}

#[async_trait]
impl DnsProvider for DigitalOceanProvider {
    fn name(&self) -> &'static str {
        "digitalocean"
    }

    async fn list_records(&self, domain: &str, fqdn: &str, page: u32) -> Result<RecordPage> {
        tracing::debug!("Listing records named {} in {} (page {})", fqdn, domain, page);

        let response = self
            .client
            .get(self.records_url(domain))
            .bearer_auth(&self.api_token)
            .query(&[
                ("name", fqdn.to_string()),
                ("page", page.to_string()),
                ("per_page", PER_PAGE.to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let body: RecordsResponse = response.json().await?;
        let last_page = body.is_last_page();

        Ok(RecordPage {
            records: body.domain_records,
            last_page,
        })
    }

    async fn edit_record(&self, domain: &str, record_id: u64, edit: &RecordEdit) -> Result<()> {
        let url = format!("{}/{}", self.records_url(domain), record_id);

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.api_token)
            .json(edit)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        Ok(())
    }
}
