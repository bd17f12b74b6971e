//! Process startup: everything that must succeed before the loop begins.

use crate::config::Config;
use crate::error::Result;
use crate::locator::locate_records;
use crate::providers::{DigitalOceanProvider, DnsProvider};
use crate::resolver::{HttpResolver, IpResolver};
use crate::scheduler::Scheduler;

/// Validate `config`, load the API token and discover the managed records.
///
/// Every error returned here is fatal.
pub async fn startup(config: &Config) -> Result<Scheduler> {
    config.validate()?;
    let token = config.load_token()?;
    let provider = DigitalOceanProvider::with_base_url(token, config.api_url.clone());
    build_scheduler(config, Box::new(provider)).await
}

/// Discover records through `provider` and wire up one job per managed family.
pub async fn build_scheduler(config: &Config, provider: Box<dyn DnsProvider>) -> Result<Scheduler> {
    let fqdn = config.fqdn();
    tracing::info!("fully qualified domain set to {}", fqdn);

    let families = config.families();
    let records = locate_records(
        provider.as_ref(),
        &config.domain,
        config.record_name(),
        &fqdn,
        &families,
    )
    .await?;

    let client = reqwest::Client::new();
    let resolvers: Vec<Box<dyn IpResolver>> = families
        .into_iter()
        .map(|family| {
            Box::new(HttpResolver::with_client(
                client.clone(),
                config.service(family).clone(),
                family,
            )) as Box<dyn IpResolver>
        })
        .collect();

    Ok(Scheduler::new(
        provider,
        config.domain.clone(),
        config.record_name(),
        &records,
        resolvers,
    ))
}
