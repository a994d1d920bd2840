//! Upstream resolvers.
//!
//! Queries that aren't answered locally, and the lookups behind redirect overrides, are sent
//! to an upstream resolver through the [`Upstream`] trait. [`UpstreamPool`] is the production
//! implementation: it picks one configured nameserver uniformly at random per exchange and
//! gives up after a fixed timeout. There is no retry against another server.

use crate::error::Error;
use std::fmt;
use std::sync::Arc;
use trust_dns_proto::op::Message;

pub mod pool;

pub use pool::UpstreamPool;

/// `DynUpstream` is the shared handle the [`Engine`][crate::engine::Engine] uses to reach
/// upstream resolvers.
#[allow(clippy::module_name_repetitions)]
pub type DynUpstream = Arc<dyn Upstream + Send + Sync>;

/// The transport an exchange is carried over. Upstream exchanges mirror the transport the
/// client used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Udp,
    Tcp,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Udp => f.write_str("UDP"),
            Transport::Tcp => f.write_str("TCP"),
        }
    }
}

#[async_trait::async_trait]
pub trait Upstream {
    /// Send `query` to an upstream resolver and return its response.
    async fn exchange(&self, query: &Message, transport: Transport) -> Result<Message, Error>;
}
