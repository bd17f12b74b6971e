//! Managed DNS record types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// IP address family, mapped onto DNS record types A and AAAA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AddressFamily {
    #[serde(rename = "ipv4")]
    V4,
    #[serde(rename = "ipv6")]
    V6,
}

impl AddressFamily {
    /// Families in tick order.
    pub const ALL: [AddressFamily; 2] = [AddressFamily::V4, AddressFamily::V6];

    /// The DNS record type carrying addresses of this family.
    pub fn record_type(self) -> &'static str {
        match self {
            AddressFamily::V4 => "A",
            AddressFamily::V6 => "AAAA",
        }
    }

    /// Map a provider record type onto a family. Case-insensitive.
    pub fn from_record_type(record_type: &str) -> Option<Self> {
        if record_type.eq_ignore_ascii_case("A") {
            Some(AddressFamily::V4)
        } else if record_type.eq_ignore_ascii_case("AAAA") {
            Some(AddressFamily::V6)
        } else {
            None
        }
    }

    /// Whether `ip` belongs to this family.
    pub fn matches(self, ip: &IpAddr) -> bool {
        match self {
            AddressFamily::V4 => ip.is_ipv4(),
            AddressFamily::V6 => ip.is_ipv6(),
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::V4 => f.write_str("IPv4"),
            AddressFamily::V6 => f.write_str("IPv6"),
        }
    }
}

/// A provider record discovered at startup. Never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedRecord {
    /// Provider record ID.
    pub id: u64,
    pub family: AddressFamily,
    pub domain: String,
    /// Record name relative to the domain, as the provider expects it on edit.
    pub hostname: String,
    /// Record data at discovery time.
    pub data: String,
}

/// Discovery result: record lists per family, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredRecords {
    ipv4: Vec<ManagedRecord>,
    ipv6: Vec<ManagedRecord>,
}

impl DiscoveredRecords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ManagedRecord) {
        match record.family {
            AddressFamily::V4 => self.ipv4.push(record),
            AddressFamily::V6 => self.ipv6.push(record),
        }
    }

    /// Records tracked for `family`.
    pub fn get(&self, family: AddressFamily) -> &[ManagedRecord] {
        match family {
            AddressFamily::V4 => &self.ipv4,
            AddressFamily::V6 => &self.ipv6,
        }
    }

    /// Record IDs tracked for `family`, in discovery order.
    pub fn ids(&self, family: AddressFamily) -> Vec<u64> {
        self.get(family).iter().map(|r| r.id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.ipv4.is_empty() && self.ipv6.is_empty()
    }

    /// Total number of records across both families.
    pub fn len(&self) -> usize {
        self.ipv4.len() + self.ipv6.len()
    }
}
