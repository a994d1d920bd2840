use crate::error::Error;
use crate::upstream::{Transport, Upstream};
use std::future::Future;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};
use trust_dns_proto::op::Message;

const DEFAULT_PORT: u16 = 53;
/// Upstream datagrams are as large as the client's advertised EDNS payload, up to the DNS
/// message limit.
const MAX_UDP_MESSAGE_SIZE: usize = u16::MAX as usize;

/// A fixed list of `host:port` nameservers. Every exchange goes to one of them, chosen at
/// random.
#[derive(Debug, Clone)]
pub struct UpstreamPool {
    servers: Vec<String>,
    timeout: Duration,
}

impl UpstreamPool {
    /// # Errors
    ///
    /// Returns [`Error::NoUpstreams`] if `servers` is empty.
    pub fn new(servers: Vec<String>, timeout: Duration) -> Result<Self, Error> {
        if servers.is_empty() {
            return Err(Error::NoUpstreams);
        }
        Ok(Self { servers, timeout })
    }

    /// Load the nameservers file at `path`, see [`UpstreamPool::parse_nameservers`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::IO`] if the file can't be read and [`Error::NoUpstreams`] if it lists
    /// no servers.
    pub async fn try_from_file(path: &str, timeout: Duration) -> Result<Self, Error> {
        let text = tokio::fs::read_to_string(path).await?;
        Self::new(Self::parse_nameservers(&text), timeout)
    }

    /// One server per non-empty line. Servers without a port get port 53.
    #[must_use]
    pub fn parse_nameservers(text: &str) -> Vec<String> {
        text.lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|server| {
                if server.contains(':') {
                    server.to_string()
                } else {
                    format!("{server}:{DEFAULT_PORT}")
                }
            })
            .collect()
    }

    #[must_use]
    pub fn servers(&self) -> &[String] {
        &self.servers
    }

    /// Choose a server uniformly at random.
    #[must_use]
    pub fn pick(&self) -> &str {
        &self.servers[fastrand::usize(..self.servers.len())]
    }

    async fn resolve(&self, server: &str) -> Result<SocketAddr, Error> {
        self.bounded(server, tokio::net::lookup_host(server))
            .await?
            .next()
            .ok_or_else(|| Error::UnresolvedUpstream(server.to_string()))
    }

    async fn exchange_udp(&self, server: &str, query: &[u8]) -> Result<Vec<u8>, Error> {
        let addr = self.resolve(server).await?;
        let bind_addr: SocketAddr = if addr.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = self.bounded(server, UdpSocket::bind(bind_addr)).await?;
        // Connecting drops datagrams from anyone but the upstream.
        self.bounded(server, socket.connect(addr)).await?;
        self.bounded(server, socket.send(query)).await?;

        let mut buf = vec![0u8; MAX_UDP_MESSAGE_SIZE];
        let len = self.bounded(server, socket.recv(&mut buf)).await?;
        buf.truncate(len);
        Ok(buf)
    }

    async fn exchange_tcp(&self, server: &str, query: &[u8]) -> Result<Vec<u8>, Error> {
        let addr = self.resolve(server).await?;
        let len = u16::try_from(query.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "query too large for TCP"))?;

        let mut stream = self.bounded(server, TcpStream::connect(addr)).await?;
        self.bounded(server, async {
            stream.write_all(&len.to_be_bytes()).await?;
            stream.write_all(query).await?;
            stream.flush().await
        })
        .await?;

        self.bounded(server, async {
            let mut len_buf = [0u8; 2];
            stream.read_exact(&mut len_buf).await?;
            let mut buf = vec![0u8; usize::from(u16::from_be_bytes(len_buf))];
            stream.read_exact(&mut buf).await?;
            Ok::<_, io::Error>(buf)
        })
        .await
    }

    async fn bounded<T>(
        &self,
        server: &str,
        fut: impl Future<Output = io::Result<T>>,
    ) -> Result<T, Error> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(source)) => Err(Error::UpstreamIO {
                server: server.to_string(),
                source,
            }),
            Err(_) => Err(Error::UpstreamTimeout(server.to_string())),
        }
    }
}

#[async_trait::async_trait]
impl Upstream for UpstreamPool {
    async fn exchange(&self, query: &Message, transport: Transport) -> Result<Message, Error> {
        let server = self.pick();
        let bytes = query.to_vec()?;
        tracing::debug!("sending query {} to {server} over {transport}", query.id());

        let raw = match transport {
            Transport::Udp => self.exchange_udp(server, &bytes).await?,
            Transport::Tcp => self.exchange_tcp(server, &bytes).await?,
        };
        let response = Message::from_vec(&raw)?;
        if response.id() != query.id() {
            return Err(Error::UpstreamIdMismatch {
                server: server.to_string(),
                expected: query.id(),
                actual: response.id(),
            });
        }
        Ok(response)
    }
}
