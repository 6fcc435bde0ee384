//! Lookup errors.

use crate::context::CancelReason;
use crate::dns::exchanger::{ExchangeError, NetError};
use std::fmt;
use trust_dns_proto::error::ProtoError;
use trust_dns_proto::op::ResponseCode;
use trust_dns_proto::rr::RecordType;

const DETAIL_DNS_TIMEOUT: &str = "query timed out";
const DETAIL_DNS_NET_FAILURE: &str = "networking error";
const DETAIL_SERVER_FAILURE: &str = "server failure at resolver";

/// Why a single logical query produced no response message.
#[derive(thiserror::Error, Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum QueryError {
    /// Returned when the resolver was built with an empty server list.
    #[error("not configured with at least one DNS server")]
    NoServers,

    /// Returned when the hostname can't be turned into a DNS name.
    #[error("invalid hostname")]
    InvalidName(#[source] ProtoError),

    /// Returned when the caller's [`Context`][crate::Context] was cancelled or expired before a
    /// response arrived.
    #[error("query {0}")]
    Canceled(CancelReason),

    #[error(transparent)]
    Exchange(#[from] ExchangeError),
}

impl QueryError {
    fn net(&self) -> Option<&NetError> {
        match self {
            QueryError::Exchange(ExchangeError::Net(err)) => Some(err),
            _ => None,
        }
    }
}

/// What a [`DnsError`] was caused by. A resolver either failed to produce a response, or it
/// answered with a response code the lookup doesn't accept, never both.
#[derive(Debug)]
pub enum Cause {
    Query(QueryError),
    ResponseCode(ResponseCode),
}

/// A failed lookup, with the record type and hostname it was for.
///
/// Rendered as `DNS problem: <detail> looking up <type> for <hostname>`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct DnsError {
    record_type: RecordType,
    hostname: String,
    cause: Cause,
}

impl DnsError {
    pub(crate) fn query(
        record_type: RecordType,
        hostname: impl Into<String>,
        err: impl Into<QueryError>,
    ) -> Self {
        Self {
            record_type,
            hostname: hostname.into(),
            cause: Cause::Query(err.into()),
        }
    }

    pub(crate) fn response_code(
        record_type: RecordType,
        hostname: impl Into<String>,
        rcode: ResponseCode,
    ) -> Self {
        Self {
            record_type,
            hostname: hostname.into(),
            cause: Cause::ResponseCode(rcode),
        }
    }

    #[must_use]
    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    #[must_use]
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    #[must_use]
    pub fn cause(&self) -> &Cause {
        &self.cause
    }

    /// The response code the resolver answered with, if that is what failed the lookup.
    #[must_use]
    pub fn rcode(&self) -> Option<ResponseCode> {
        match self.cause {
            Cause::ResponseCode(rcode) => Some(rcode),
            Cause::Query(_) => None,
        }
    }

    /// True if the lookup failed because it ran out of time, either in the network or because
    /// the caller's context was done.
    #[must_use]
    pub fn timeout(&self) -> bool {
        match &self.cause {
            Cause::Query(QueryError::Canceled(_)) => true,
            Cause::Query(err) => err.net().is_some_and(NetError::timeout),
            Cause::ResponseCode(_) => false,
        }
    }

    fn detail(&self) -> String {
        match &self.cause {
            Cause::Query(QueryError::Canceled(_)) => DETAIL_DNS_TIMEOUT.to_string(),
            Cause::Query(err) => match err.net() {
                Some(net) if net.timeout() => DETAIL_DNS_TIMEOUT.to_string(),
                Some(_) => DETAIL_DNS_NET_FAILURE.to_string(),
                None => DETAIL_SERVER_FAILURE.to_string(),
            },
            Cause::ResponseCode(ResponseCode::NoError) => DETAIL_SERVER_FAILURE.to_string(),
            Cause::ResponseCode(rcode) => rcode_name(*rcode),
        }
    }
}

impl fmt::Display for DnsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DNS problem: {} looking up {} for {}",
            self.detail(),
            self.record_type,
            self.hostname
        )
    }
}

impl std::error::Error for DnsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.cause {
            Cause::Query(err) => Some(err),
            Cause::ResponseCode(_) => None,
        }
    }
}

/// The conventional mnemonic for a response code, e.g. `NXDOMAIN`.
#[must_use]
pub fn rcode_name(rcode: ResponseCode) -> String {
    let name = match rcode {
        ResponseCode::NoError => "NOERROR",
        ResponseCode::FormErr => "FORMERR",
        ResponseCode::ServFail => "SERVFAIL",
        ResponseCode::NXDomain => "NXDOMAIN",
        ResponseCode::NotImp => "NOTIMP",
        ResponseCode::Refused => "REFUSED",
        ResponseCode::YXDomain => "YXDOMAIN",
        ResponseCode::YXRRSet => "YXRRSET",
        ResponseCode::NXRRSet => "NXRRSET",
        ResponseCode::NotAuth => "NOTAUTH",
        ResponseCode::NotZone => "NOTZONE",
        ResponseCode::BADVERS => "BADVERS",
        other => return u16::from(other).to_string(),
    };
    name.to_string()
}
