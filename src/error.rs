//! Error types.

use std::net::IpAddr;
use trust_dns_proto::error::ProtoError;

/// Error enumerates the possible hostgate error states.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Returned when the [admin page][crate::api] receives a `/save_hosts` submission without
    /// a non-empty `hosts` field.
    #[error("`hosts` parameter is required")]
    MissingHosts,

    /// Returned when the [`Config::api_bind_addr`][`crate::config::Config::api_bind_addr`] is
    /// not a loopback address, or an address within a private network space. The admin page
    /// rewrites the override table without any authentication and must never be reachable from
    /// the public internet.
    #[error("API bind address ({0}) must be a loopback or private IP")]
    InsecureAPIBind(IpAddr),

    /// Returned when the nameservers file lists no upstream servers.
    #[error("no upstream nameservers configured")]
    NoUpstreams,

    /// Returned when an upstream `host:port` doesn't resolve to any socket address.
    #[error("upstream \"{0}\" did not resolve to an address")]
    UnresolvedUpstream(String),

    /// Returned when an upstream exchange doesn't complete within the configured
    /// [`Config::upstream_timeout`][`crate::config::Config::upstream_timeout`].
    #[error("timed out waiting on upstream {0}")]
    UpstreamTimeout(String),

    /// Returned when sending a query to, or reading a response from, an upstream fails.
    #[error("IO error talking to upstream {server}: {source}")]
    UpstreamIO {
        server: String,
        source: std::io::Error,
    },

    /// Returned when an upstream answers with a message ID that doesn't match the query.
    #[error("upstream {server} answered with ID {actual}, expected {expected}")]
    UpstreamIdMismatch {
        server: String,
        expected: u16,
        actual: u16,
    },

    /// Returned when a generic IO error occurs.
    #[error("an IO error occurred")]
    IO(#[from] std::io::Error),

    /// Returned when processing the JSON [`Config`][crate::config::Config] from disk fails due
    /// to invalid JSON content.
    #[error("invalid JSON")]
    InvalidJSON(#[from] serde_json::Error),

    /// Returned when a DNS message can't be encoded or decoded, or a name is malformed.
    #[error("DNS error: {0}")]
    DNSError(#[from] ProtoError),
}
