//! Public IP resolution.

use crate::config::{ResponseFormat, ServiceConfig};
use crate::error::{DdnsError, Result};
use crate::record::AddressFamily;
use async_trait::async_trait;
use std::net::IpAddr;

/// Source of the caller's public address for one family.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IpResolver: Send + Sync {
    /// Family every returned address belongs to.
    fn family(&self) -> AddressFamily;

    /// Endpoint description, for logs.
    fn endpoint(&self) -> String;

    /// Resolve the current public address.
    async fn resolve(&self) -> Result<IpAddr>;
}

/// Resolver backed by an HTTP "what is my IP" service.
pub struct HttpResolver {
    client: reqwest::Client,
    service: ServiceConfig,
    family: AddressFamily,
}

impl HttpResolver {
    /// Create a resolver for `family` using `service`.
    pub fn new(service: ServiceConfig, family: AddressFamily) -> Self {
        Self::with_client(reqwest::Client::new(), service, family)
    }

    /// Create a resolver sharing an existing HTTP client.
    pub fn with_client(
        client: reqwest::Client,
        service: ServiceConfig,
        family: AddressFamily,
    ) -> Self {
        Self {
            client,
            service,
            family,
        }
    }

    /// Pull the address string out of a response body.
    fn extract<'a>(&self, body: &'a str) -> Result<std::borrow::Cow<'a, str>> {
        match self.service.format {
            ResponseFormat::Text => Ok(body.trim().into()),
            ResponseFormat::Json => {
                let value: serde_json::Value =
                    serde_json::from_str(body).map_err(|e| self.invalid(e.to_string()))?;
                value
                    .get(&self.service.field)
                    .and_then(serde_json::Value::as_str)
                    .map(|ip| ip.trim().to_string().into())
                    .ok_or_else(|| {
                        self.invalid(format!("missing string field {:?}", self.service.field))
                    })
            }
        }
    }

    /// Parse and family-check an extracted address.
    fn validate(&self, raw: &str) -> Result<IpAddr> {
        let ip: IpAddr = raw
            .parse()
            .map_err(|_| self.invalid(format!("response was not an IP address: {:?}", raw)))?;

        if !self.family.matches(&ip) {
            return Err(self.invalid(format!("{} is not an {} address", ip, self.family)));
        }

        Ok(ip)
    }

    fn invalid(&self, reason: String) -> DdnsError {
        DdnsError::InvalidResponse {
            url: self.service.url.clone(),
            reason,
        }
    }

    fn unavailable(&self, reason: String) -> DdnsError {
        DdnsError::ServiceUnavailable {
            url: self.service.url.clone(),
            reason,
        }
    }
}

#[async_trait]
impl IpResolver for HttpResolver {
    fn family(&self) -> AddressFamily {
        self.family
    }

    fn endpoint(&self) -> String {
        self.service.url.clone()
    }

    async fn resolve(&self) -> Result<IpAddr> {
        let response = self
            .client
            .get(&self.service.url)
            .send()
            .await
            .map_err(|e| self.unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(self.unavailable(format!("HTTP status {}", response.status())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.unavailable(format!("read body: {}", e)))?;

        let ip = self.validate(&self.extract(&body)?)?;
        tracing::debug!("Resolved public {} {} from {}", self.family, ip, self.service.url);
        Ok(ip)
    }
}
