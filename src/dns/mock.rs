//! A canned [`Resolver`] for tests of code that depends on DNS, without any network access.
use crate::context::Context;
use crate::dns::error::{DnsError, QueryError};
use crate::dns::exchanger::{ExchangeError, NetError};
use crate::dns::Resolver;
use std::io::{self, ErrorKind};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use trust_dns_proto::op::ResponseCode;
use trust_dns_proto::rr::rdata::CAA;
use trust_dns_proto::rr::RecordType;

const AUTHORITY: &str = "respect my authority!";

/// Answers lookups from fixed data keyed by hostname.
///
/// `key_authorization` is returned for the DNS-01 challenge names that are meant to validate,
/// e.g. `_acme-challenge.good-dns01.com`.
#[derive(Default, Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct MockResolver {
    pub key_authorization: String,
}

/// A network error that [`DnsError::timeout`] reports as a timeout.
#[must_use]
pub fn mock_timeout_error() -> NetError {
    NetError::new(
        "read",
        "mock",
        io::Error::new(ErrorKind::TimedOut, "so sloooow"),
    )
}

fn net_failure(record_type: RecordType, hostname: &str, msg: &str) -> DnsError {
    let err = NetError::new("read", "mock", io::Error::new(ErrorKind::Other, msg.to_string()));
    DnsError::query(record_type, hostname, QueryError::from(ExchangeError::from(err)))
}

fn timeout(record_type: RecordType, hostname: &str) -> DnsError {
    DnsError::query(
        record_type,
        hostname,
        QueryError::from(ExchangeError::from(mock_timeout_error())),
    )
}

fn loopback_v4() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn loopback_v6() -> IpAddr {
    IpAddr::V6(Ipv6Addr::LOCALHOST)
}

#[async_trait::async_trait]
impl Resolver for MockResolver {
    async fn lookup_txt(
        &self,
        _ctx: &Context,
        hostname: &str,
    ) -> Result<(Vec<String>, Vec<String>), DnsError> {
        let authority = || vec![AUTHORITY.to_string()];
        let txts = match hostname {
            "_acme-challenge.servfail.com" => {
                return Err(DnsError::response_code(
                    RecordType::TXT,
                    hostname,
                    ResponseCode::ServFail,
                ))
            }
            "_acme-challenge.good-dns01.com" => vec![self.key_authorization.clone()],
            "_acme-challenge.wrong-dns01.com" => vec!["a".to_string()],
            "_acme-challenge.wrong-many-dns01.com" => {
                ["a", "b", "c", "d", "e"].map(String::from).to_vec()
            }
            "_acme-challenge.long-dns01.com" => vec!["a".repeat(255)],
            "_acme-challenge.no-authority-dns01.com" => {
                return Ok((vec![self.key_authorization.clone()], vec![]))
            }
            "_acme-challenge.empty-txts.com" => return Ok((vec![], vec![])),
            _ => vec!["hostname".to_string()],
        };
        Ok((txts, authority()))
    }

    // email.only has an MX record but no addresses, see lookup_mx.
    async fn lookup_host(&self, _ctx: &Context, hostname: &str) -> Result<Vec<IpAddr>, DnsError> {
        match hostname {
            "always.invalid" | "invalid.invalid" | "email.only" => Ok(vec![]),
            "always.timeout" => Err(timeout(RecordType::A, hostname)),
            "always.error" => Err(net_failure(RecordType::A, hostname, "some net error")),
            "ipv4.and.ipv6.localhost" => Ok(vec![loopback_v6(), loopback_v4()]),
            "ipv6.localhost" => Ok(vec![loopback_v6()]),
            _ => Ok(vec![loopback_v4()]),
        }
    }

    async fn lookup_caa(&self, _ctx: &Context, _hostname: &str) -> Result<Vec<CAA>, DnsError> {
        Ok(vec![])
    }

    async fn lookup_mx(&self, _ctx: &Context, hostname: &str) -> Result<Vec<String>, DnsError> {
        match hostname.trim_end_matches('.') {
            "digicert.com" | "certcentral.com" | "email.only" | "email.com" => {
                Ok(vec!["mail.email.com".to_string()])
            }
            "always.error" => Err(net_failure(
                RecordType::MX,
                hostname,
                "always.error always errors",
            )),
            "always.timeout" => Err(timeout(RecordType::MX, hostname)),
            _ => Ok(vec![]),
        }
    }
}
