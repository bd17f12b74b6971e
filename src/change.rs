//! Public IP change detection.

use std::fmt;
use std::net::IpAddr;

/// Outcome of comparing a freshly resolved address with the last applied one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// Nothing to do.
    Unchanged(IpAddr),
    /// No address was known before.
    FirstDetected(IpAddr),
    /// The address moved.
    Changed { from: IpAddr, to: IpAddr },
}

impl Change {
    pub fn needs_update(&self) -> bool {
        !matches!(self, Change::Unchanged(_))
    }

    /// The address records should carry after this change.
    pub fn current(&self) -> IpAddr {
        match *self {
            Change::Unchanged(ip) | Change::FirstDetected(ip) => ip,
            Change::Changed { to, .. } => to,
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::Unchanged(ip) => write!(f, "public IP address unchanged at {}", ip),
            Change::FirstDetected(ip) => write!(f, "public IP address detected as {}", ip),
            Change::Changed { from, to } => {
                write!(f, "public IP address changed from {} to {}", from, to)
            }
        }
    }
}

/// Compare `resolved` against `last_known`.
pub fn detect_change(last_known: Option<IpAddr>, resolved: IpAddr) -> Change {
    match last_known {
        None => Change::FirstDetected(resolved),
        Some(last) if last == resolved => Change::Unchanged(resolved),
        Some(last) => Change::Changed {
            from: last,
            to: resolved,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_first_detection() {
        let change = detect_change(None, ip("203.0.113.5"));
        assert_eq!(change, Change::FirstDetected(ip("203.0.113.5")));
        assert!(change.needs_update());
        assert_eq!(change.current(), ip("203.0.113.5"));
        assert_eq!(change.to_string(), "public IP address detected as 203.0.113.5");
    }

    #[test]
    fn test_same_address_needs_no_update() {
        for addr in ["203.0.113.5", "2001:db8::1"] {
            let change = detect_change(Some(ip(addr)), ip(addr));
            assert_eq!(change, Change::Unchanged(ip(addr)));
            assert!(!change.needs_update());
        }
    }

    #[test]
    fn test_equivalent_ipv6_spellings_are_unchanged() {
        let change = detect_change(Some(ip("2001:0db8:0:0::1")), ip("2001:db8::1"));
        assert!(!change.needs_update());
    }

    #[test]
    fn test_transition() {
        let change = detect_change(Some(ip("198.51.100.1")), ip("203.0.113.5"));
        assert_eq!(
            change,
            Change::Changed {
                from: ip("198.51.100.1"),
                to: ip("203.0.113.5")
            }
        );
        assert!(change.needs_update());
        assert_eq!(change.current(), ip("203.0.113.5"));
        assert_eq!(
            change.to_string(),
            "public IP address changed from 198.51.100.1 to 203.0.113.5"
        );
    }
}
