//! dnsclient
//!
//! The DNS client a certificate authority uses to validate domain control: [DNS-01] challenge
//! `TXT` records, [CAA] issuance policy, and the `A`/`AAAA`/`MX` records behind other
//! challenge types.
//!
//! Queries go to a pool of trusted upstream recursive resolvers over plain UDP with [EDNS0].
//! Nothing is cached and nothing is validated locally; the upstream resolvers are expected to
//! do both. What this crate adds is resilience: per-attempt timeouts, retries that rotate
//! through the pool, caller cancellation, and errors that say what went wrong.
//!
//! [DNS-01]: https://www.rfc-editor.org/rfc/rfc8555#section-8.4
//! [CAA]: https://www.rfc-editor.org/rfc/rfc8659
//! [EDNS0]: https://www.rfc-editor.org/rfc/rfc6891
//!
#![warn(clippy::pedantic)]

pub mod config;
pub mod context;
pub mod dns;
pub mod error;
pub mod metrics;

pub use config::{Config, SharedConfig};
pub use context::{CancelReason, Context};
pub use dns::{Client, DnsError, DynResolver, MockResolver, Resolver};
