//! The wire exchange seam between the resolver and the network.
use async_trait::async_trait;
use std::io::{self, ErrorKind};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::{lookup_host, UdpSocket};
use tokio::time::timeout;
use trust_dns_proto::error::ProtoError;
use trust_dns_proto::op::Message;
use trust_dns_proto::serialize::binary::BinEncodable;

/// Largest response we are willing to receive, matching the EDNS0 payload size we advertise.
pub const MAX_UDP_PAYLOAD: u16 = 4096;

/// `SharedExchanger` is an [`Exchanger`] shared between the resolver and the per-attempt tasks
/// it spawns.
pub type SharedExchanger = Arc<dyn Exchanger>;

/// Sends one DNS message to one server and returns its response with the round-trip time.
///
/// Implementations must be safe for concurrent use: a resolver runs the A and AAAA halves of a
/// host lookup at the same time, and any number of callers may share one resolver.
#[async_trait]
pub trait Exchanger: Send + Sync {
    async fn exchange(
        &self,
        message: &Message,
        server: &str,
    ) -> Result<(Message, Duration), ExchangeError>;
}

/// A socket-level failure talking to a server.
#[derive(thiserror::Error, Debug)]
#[error("{op} {server}: {source}")]
pub struct NetError {
    pub op: &'static str,
    pub server: String,
    #[source]
    pub source: io::Error,
}

impl NetError {
    pub fn new(op: &'static str, server: impl Into<String>, source: io::Error) -> Self {
        Self {
            op,
            server: server.into(),
            source,
        }
    }

    /// True when the operation ran out of time.
    #[must_use]
    pub fn timeout(&self) -> bool {
        matches!(self.source.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock)
    }

    /// True when the same operation may succeed if tried again, possibly elsewhere.
    #[must_use]
    pub fn temporary(&self) -> bool {
        self.timeout()
            || matches!(
                self.source.kind(),
                ErrorKind::Interrupted | ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted
            )
    }
}

/// Everything that can go wrong during a single exchange.
#[derive(thiserror::Error, Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum ExchangeError {
    #[error(transparent)]
    Net(#[from] NetError),

    /// The query couldn't be encoded or the response couldn't be decoded.
    #[error("malformed DNS message")]
    Proto(#[from] ProtoError),

    #[error("response id {response} does not match query id {query}")]
    IdMismatch { query: u16, response: u16 },

    /// The task running the exchange ended without producing a result.
    #[error("exchange task failed: {0}")]
    Task(String),
}

impl ExchangeError {
    /// Only transient network errors are worth retrying against another server.
    #[must_use]
    pub fn temporary(&self) -> bool {
        match self {
            ExchangeError::Net(err) => err.temporary(),
            _ => false,
        }
    }
}

/// Plain DNS over UDP, one socket per exchange.
#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct UdpExchanger {
    read_timeout: Duration,
}

impl UdpExchanger {
    #[must_use]
    pub fn new(read_timeout: Duration) -> Self {
        Self { read_timeout }
    }

    async fn resolve(server: &str) -> Result<SocketAddr, NetError> {
        lookup_host(server)
            .await
            .map_err(|err| NetError::new("dial", server, err))?
            .next()
            .ok_or_else(|| {
                NetError::new(
                    "dial",
                    server,
                    io::Error::new(ErrorKind::NotFound, "no address for server"),
                )
            })
    }
}

#[async_trait]
impl Exchanger for UdpExchanger {
    async fn exchange(
        &self,
        message: &Message,
        server: &str,
    ) -> Result<(Message, Duration), ExchangeError> {
        let request = message.to_vec()?;
        let addr = Self::resolve(server).await?;
        let bind_addr: SocketAddr = if addr.is_ipv4() {
            (std::net::Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (std::net::Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|err| NetError::new("dial", server, err))?;
        socket
            .connect(addr)
            .await
            .map_err(|err| NetError::new("dial", server, err))?;

        let started = Instant::now();
        socket
            .send(&request)
            .await
            .map_err(|err| NetError::new("write", server, err))?;

        let mut buf = vec![0u8; usize::from(MAX_UDP_PAYLOAD)];
        let received = timeout(self.read_timeout, socket.recv(&mut buf))
            .await
            .map_err(|_| {
                NetError::new(
                    "read",
                    server,
                    io::Error::new(ErrorKind::TimedOut, "i/o timeout"),
                )
            })?
            .map_err(|err| NetError::new("read", server, err))?;
        let rtt = started.elapsed();

        buf.truncate(received);
        let response = Message::from_vec(&buf)?;
        if response.id() != message.id() {
            return Err(ExchangeError::IdMismatch {
                query: message.id(),
                response: response.id(),
            });
        }
        Ok((response, rtt))
    }
}
