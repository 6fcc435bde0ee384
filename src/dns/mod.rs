//! Resilient DNS lookups against a pool of upstream resolvers.
//!
//! # Lookups
//!
//! A [`Resolver`] answers four questions about a hostname:
//!
//! * [`Resolver::lookup_txt`] returns each `TXT` record as one string (multi-segment records
//!   are concatenated), plus the authority section for diagnostics. An empty answer is not an
//!   error.
//! * [`Resolver::lookup_host`] races `A` and `AAAA` queries. If only one of them fails, the
//!   other's addresses are returned. If both fail, the `A` error is returned. Private, loopback
//!   and link-local addresses are dropped unless the resolver allows restricted addresses.
//! * [`Resolver::lookup_caa`] only fails on `SERVFAIL` and otherwise returns whatever `CAA`
//!   records were answered.
//! * [`Resolver::lookup_mx`] returns the exchange hostname of each `MX` record.
//!
//! # Retries
//!
//! [`Client`] sends every query to a randomly chosen server from its pool. When a server fails
//! with a transient network error (e.g. a read timeout) the query is retried against the next
//! server in the list, up to the configured number of tries. Cancellation of the caller's
//! [`Context`][crate::Context] always wins and is never retried.
//!
//! E.g. with config:
//! ```json
//! {
//!   "servers": ["10.0.0.2:53", "10.0.0.3:53", "10.0.0.4:53"],
//!   "read_timeout_ms": 2000,
//!   "max_tries": 3
//! }
//! ```
//!
//! A lookup that first picks `10.0.0.3:53` and gets no answer within two seconds is retried
//! against `10.0.0.4:53`, then `10.0.0.2:53`, before failing with
//! `DNS problem: query timed out looking up TXT for example.com`.

use crate::context::Context;
use std::net::IpAddr;
use std::sync::Arc;
use trust_dns_proto::rr::rdata::CAA;

pub mod address;
pub mod client;
pub mod error;
mod exchange;
pub mod exchanger;
pub mod mock;

pub use client::Client;
pub use error::{DnsError, QueryError};
pub use exchanger::{ExchangeError, Exchanger, NetError, UdpExchanger};
pub use mock::MockResolver;

/// `DynResolver` is a [`Resolver`] shared between any number of consumers.
#[allow(clippy::module_name_repetitions)]
pub type DynResolver = Arc<dyn Resolver>;

/// The lookups a certificate authority needs to validate domain control.
#[async_trait::async_trait]
pub trait Resolver: Send + Sync {
    /// All `TXT` records for `hostname`, and the authority section of the response.
    async fn lookup_txt(
        &self,
        ctx: &Context,
        hostname: &str,
    ) -> Result<(Vec<String>, Vec<String>), DnsError>;

    /// All public `A` then `AAAA` addresses for `hostname`.
    async fn lookup_host(&self, ctx: &Context, hostname: &str) -> Result<Vec<IpAddr>, DnsError>;

    /// All `CAA` records for `hostname`.
    async fn lookup_caa(&self, ctx: &Context, hostname: &str) -> Result<Vec<CAA>, DnsError>;

    /// The mail exchange targets for `hostname`.
    async fn lookup_mx(&self, ctx: &Context, hostname: &str) -> Result<Vec<String>, DnsError>;
}
