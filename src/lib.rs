//! hostgate
//!
//! A small DNS gateway for home and lab networks. `A` queries are answered from a local
//! override table when it has an entry for the name, including `*.` wildcard entries and
//! entries that point one name at another. Everything else is forwarded to a randomly chosen
//! upstream nameserver and the answer relayed back unchanged.
//!
//! The override table lives in a plain text hosts file and can be edited at runtime through
//! the [admin page][api]; changes are installed atomically without a restart.
//!
#![warn(clippy::pedantic)]

pub mod api;
pub mod config;
pub mod dns;
pub mod engine;
pub mod error;
pub mod overrides;
pub mod stats;
pub mod upstream;

pub use api::new as new_http;
pub use config::{Config, SharedConfig};
pub use dns::new as new_dns;
pub use engine::{Engine, Origin};
pub use overrides::{HostsFile, OverrideStore, OverrideTable};
pub use stats::Stats;
pub use upstream::{Transport, UpstreamPool};
