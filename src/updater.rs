//! Applying a new public address to the records of one family.

use crate::change::{detect_change, Change};
use crate::error::{DdnsError, Result};
use crate::providers::{DnsProvider, RecordEdit};
use crate::record::{AddressFamily, ManagedRecord};
use crate::resolver::IpResolver;
use crate::state::TrackingState;

/// One family's worth of work for a single tick.
pub struct UpdateJob<'a> {
    pub family: AddressFamily,
    pub records: &'a [ManagedRecord],
    pub domain: &'a str,
    pub hostname: &'a str,
    pub resolver: &'a dyn IpResolver,
}

/// What a successful job did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The family has no managed records.
    NoRecords,
    /// The public address matches the last applied one.
    Unchanged(std::net::IpAddr),
    /// Every record now carries the new address.
    Updated { change: Change, edited: usize },
}

impl UpdateJob<'_> {
    /// Resolve the public address and, if it moved, edit every record.
    ///
    /// The first failing edit aborts the rest of the job. Edits already made
    /// stay in place, and `state` only advances once all edits succeeded so
    /// the next tick retries the whole set.
    pub async fn run(
        &self,
        provider: &dyn DnsProvider,
        state: &mut TrackingState,
    ) -> Result<JobOutcome> {
        if self.records.is_empty() {
            return Ok(JobOutcome::NoRecords);
        }

        let ip = self.resolver.resolve().await?;

        let change = detect_change(state.last_ip(self.family), ip);
        if !change.needs_update() {
            if let Some(tracked) = state.get(self.family) {
                tracing::debug!(
                    "{} address {} unchanged since {}",
                    self.family,
                    ip,
                    tracked.applied_at.format("%Y-%m-%d %H:%M:%S")
                );
            }
            return Ok(JobOutcome::Unchanged(ip));
        }

        tracing::info!("{}", change);
        let ip = change.current();

        let edit = RecordEdit {
            record_type: self.family.record_type().to_string(),
            name: self.hostname.to_string(),
            data: ip.to_string(),
        };

        for record in self.records {
            provider
                .edit_record(self.domain, record.id, &edit)
                .await
                .map_err(|e| DdnsError::ProviderEditFailed {
                    record_id: record.id,
                    source: Box::new(e),
                })?;
            tracing::debug!(
                "edited {} record ID {} to {}",
                edit.record_type,
                record.id,
                edit.data
            );
        }

        state.advance(self.family, ip);
        tracing::info!(
            "updated {} {} record(s) for {}.{} to {}",
            self.records.len(),
            edit.record_type,
            self.hostname,
            self.domain,
            ip
        );

        Ok(JobOutcome::Updated {
            change,
            edited: self.records.len(),
        })
    }
}
