//! # do-ddns
//!
//! Keeps existing DigitalOcean A/AAAA records pointed at the machine's
//! current public IP address.
//!
//! ## Features
//!
//! - IPv4, IPv6 or dual-stack updates of records that already exist
//! - Plain-text or JSON public IP services, configurable per family
//! - Paginated record discovery at startup
//! - Edits only when the public address actually changed
//!
//! ## Usage
//!
//! ```bash
//! # Run forever, updating every `period` seconds
//! do-ddns --config /etc/do-ddns/config.json
//!
//! # Single update pass
//! do-ddns --config config.json once
//!
//! # Show managed records and the current public IPs
//! do-ddns --config config.json status
//! ```

pub mod app;
pub mod change;
pub mod config;
pub mod error;
pub mod locator;
pub mod providers;
pub mod record;
pub mod resolver;
pub mod scheduler;
pub mod state;
pub mod updater;

pub use config::Config;
pub use error::{DdnsError, Result};
pub use record::AddressFamily;
pub use scheduler::Scheduler;
