//! Error types.

use crate::dns::DnsError;

/// Error enumerates the failures outside of a lookup itself: loading configuration and driving
/// the command line tool. Lookup failures are [`DnsError`]s.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Returned when a generic IO error occurs.
    #[error("an IO error occurred")]
    IO(#[from] std::io::Error),

    /// Returned when [trying to load a `Config`][crate::config::Config::try_from_file] fails
    /// due to invalid JSON content.
    #[error("invalid JSON")]
    InvalidJSON(#[from] serde_json::Error),

    /// Returned when a configured server isn't of the form `host:port`.
    #[error("DNS server address \"{0}\" is not of the form host:port")]
    InvalidServerAddr(String),

    /// Returned when asked to look up a record type no [`Resolver`][crate::dns::Resolver]
    /// operation serves.
    #[error("unsupported record type \"{0}\"")]
    UnsupportedRecordType(String),

    #[error(transparent)]
    Lookup(#[from] DnsError),
}
