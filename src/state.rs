//! In-memory record of the last address applied per family.

use crate::record::AddressFamily;
use chrono::{DateTime, Utc};
use std::net::IpAddr;

/// An address successfully applied to every record of its family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackedIp {
    pub ip: IpAddr,
    pub applied_at: DateTime<Utc>,
}

/// Last known public address per family. Starts empty and lives for the
/// process lifetime; nothing is persisted.
#[derive(Debug, Clone, Default)]
pub struct TrackingState {
    ipv4: Option<TrackedIp>,
    ipv6: Option<TrackedIp>,
}

impl TrackingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, family: AddressFamily) -> Option<&TrackedIp> {
        self.slot(family).as_ref()
    }

    pub fn last_ip(&self, family: AddressFamily) -> Option<IpAddr> {
        self.get(family).map(|tracked| tracked.ip)
    }

    /// Record `ip` as applied to every record of `family`.
    pub fn advance(&mut self, family: AddressFamily, ip: IpAddr) {
        *self.slot_mut(family) = Some(TrackedIp {
            ip,
            applied_at: Utc::now(),
        });
    }

    fn slot(&self, family: AddressFamily) -> &Option<TrackedIp> {
        match family {
            AddressFamily::V4 => &self.ipv4,
            AddressFamily::V6 => &self.ipv6,
        }
    }

    fn slot_mut(&mut self, family: AddressFamily) -> &mut Option<TrackedIp> {
        match family {
            AddressFamily::V4 => &mut self.ipv4,
            AddressFamily::V6 => &mut self.ipv6,
        }
    }
}
