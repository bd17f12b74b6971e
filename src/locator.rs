//! Startup discovery of the records to manage.

use crate::error::{DdnsError, Result};
use crate::providers::DnsProvider;
use crate::record::{AddressFamily, DiscoveredRecords, ManagedRecord};

/// Walk every page of records named `fqdn` in `domain` and keep those whose
/// type belongs to one of `families`.
///
/// `hostname` is the record name used on later edits. Any page failure aborts
/// discovery, and finding nothing for every requested family is an error:
/// records are never created.
pub async fn locate_records(
    provider: &dyn DnsProvider,
    domain: &str,
    hostname: &str,
    fqdn: &str,
    families: &[AddressFamily],
) -> Result<DiscoveredRecords> {
    let mut found = DiscoveredRecords::new();
    let mut page = 1;

    loop {
        let listing = provider
            .list_records(domain, fqdn, page)
            .await
            .map_err(|e| DdnsError::ProviderQueryFailed {
                page,
                source: Box::new(e),
            })?;

        for record in listing.records {
            let Some(family) = AddressFamily::from_record_type(&record.record_type) else {
                continue;
            };
            if !families.contains(&family) {
                continue;
            }

            tracing::info!(
                "found {} record ID {}: {}",
                family.record_type(),
                record.id,
                record.data
            );
            found.push(ManagedRecord {
                id: record.id,
                family,
                domain: domain.to_string(),
                hostname: hostname.to_string(),
                data: record.data,
            });
        }

        if listing.last_page {
            break;
        }
        page += 1;
    }

    if found.is_empty() {
        return Err(DdnsError::NoRecordsFound {
            fqdn: fqdn.to_string(),
        });
    }

    tracing::info!("discovered {} record(s) for {}", found.len(), fqdn);
    for family in families {
        if found.get(*family).is_empty() {
            tracing::warn!(
                "no {} record found for {}; {} updates disabled",
                family.record_type(),
                fqdn,
                family
            );
        }
    }

    Ok(found)
}
