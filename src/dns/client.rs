use crate::config::Config;
use crate::context::Context;
use crate::dns::address::{is_private_v4, is_private_v6};
use crate::dns::error::{rcode_name, DnsError};
use crate::dns::exchanger::{SharedExchanger, UdpExchanger};
use crate::dns::Resolver;
use crate::metrics::{LogMetrics, SharedMetrics};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{trace, warn};
use trust_dns_proto::op::{Message, ResponseCode};
use trust_dns_proto::rr::rdata::CAA;
use trust_dns_proto::rr::{RData, Record, RecordType};

/// A [`Resolver`] that talks to a pool of upstream recursive resolvers.
///
/// The server list and settings never change after construction, so a single `Client` can
/// serve any number of concurrent lookups.
#[derive(Clone)]
pub struct Client {
    pub(crate) exchanger: SharedExchanger,
    pub(crate) metrics: SharedMetrics,
    pub(crate) servers: Arc<[String]>,
    pub(crate) max_tries: usize,
    allow_restricted_addresses: bool,
}

impl Client {
    /// Creates a resolver sending plain UDP queries to `servers` (each `host:port`).
    ///
    /// Each attempt waits at most `read_timeout` for a response. Up to `max_tries` attempts are
    /// made per lookup when servers fail transiently; at least one attempt is always made.
    #[must_use]
    pub fn new(servers: Vec<String>, read_timeout: Duration, max_tries: usize) -> Self {
        Self {
            exchanger: Arc::new(UdpExchanger::new(read_timeout)),
            metrics: Arc::new(LogMetrics),
            servers: servers.into(),
            max_tries,
            allow_restricted_addresses: false,
        }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let client = Self::new(config.servers.clone(), config.read_timeout, config.max_tries);
        if config.allow_restricted_addresses {
            client.with_restricted_addresses()
        } else {
            client
        }
    }

    /// Allows loopback and other private addresses in host lookups. Only for tests.
    #[must_use]
    pub fn with_restricted_addresses(mut self) -> Self {
        warn!("restricted addresses allowed, use for testing only");
        self.allow_restricted_addresses = true;
        self
    }

    /// Replaces the wire layer, e.g. with a scripted exchanger in tests.
    #[must_use]
    pub fn with_exchanger(mut self, exchanger: SharedExchanger) -> Self {
        self.exchanger = exchanger;
        self
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: SharedMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    #[must_use]
    pub fn servers(&self) -> &[String] {
        &self.servers
    }

    /// Runs one exchange and rejects any response whose code isn't NOERROR.
    async fn lookup(
        &self,
        ctx: &Context,
        hostname: &str,
        record_type: RecordType,
    ) -> Result<Message, DnsError> {
        let response = self
            .exchange_one(ctx, hostname, record_type)
            .await
            .map_err(|err| {
                trace!(hostname, qtype = %record_type, err = %err, "exchange failed");
                DnsError::query(record_type, hostname, err)
            })?;
        if response.response_code() != ResponseCode::NoError {
            trace!(hostname, qtype = %record_type, rcode = %rcode_name(response.response_code()), "rejected response");
            return Err(DnsError::response_code(
                record_type,
                hostname,
                response.response_code(),
            ));
        }
        Ok(response)
    }

    async fn lookup_ip(
        &self,
        ctx: &Context,
        hostname: &str,
        record_type: RecordType,
    ) -> Result<Vec<Record>, DnsError> {
        let result = self
            .lookup(ctx, hostname, record_type)
            .await
            .map(|mut response| response.take_answers());
        match &result {
            Ok(records) => trace!(hostname, qtype = %record_type, records = records.len(), "lookup_ip"),
            Err(err) => trace!(hostname, qtype = %record_type, err = %err, "lookup_ip"),
        }
        result
    }

    fn permitted(&self, ip: IpAddr) -> bool {
        if self.allow_restricted_addresses {
            return true;
        }
        match ip {
            IpAddr::V4(v4) => !is_private_v4(v4),
            IpAddr::V6(v6) => !is_private_v6(v6),
        }
    }
}

#[async_trait::async_trait]
impl Resolver for Client {
    async fn lookup_txt(
        &self,
        ctx: &Context,
        hostname: &str,
    ) -> Result<(Vec<String>, Vec<String>), DnsError> {
        let response = self.lookup(ctx, hostname, RecordType::TXT).await?;

        let txts = response
            .answers()
            .iter()
            .filter(|r| r.record_type() == RecordType::TXT)
            .filter_map(|r| match r.data() {
                Some(RData::TXT(txt)) => Some(
                    txt.txt_data()
                        .iter()
                        .map(|segment| String::from_utf8_lossy(segment))
                        .collect::<String>(),
                ),
                _ => None,
            })
            .collect();
        let authorities = response
            .name_servers()
            .iter()
            .map(ToString::to_string)
            .collect();
        Ok((txts, authorities))
    }

    async fn lookup_host(&self, ctx: &Context, hostname: &str) -> Result<Vec<IpAddr>, DnsError> {
        let (a, aaaa) = tokio::join!(
            self.lookup_ip(ctx, hostname, RecordType::A),
            self.lookup_ip(ctx, hostname, RecordType::AAAA),
        );

        let (records_a, records_aaaa) = match (a, aaaa) {
            (Err(err), Err(_)) => return Err(err),
            (a, aaaa) => (a.unwrap_or_default(), aaaa.unwrap_or_default()),
        };

        let v4 = records_a.iter().filter_map(|r| match r.data() {
            Some(RData::A(ip)) => Some(IpAddr::V4(*ip)),
            _ => None,
        });
        let v6 = records_aaaa.iter().filter_map(|r| match r.data() {
            Some(RData::AAAA(ip)) => Some(IpAddr::V6(*ip)),
            _ => None,
        });
        Ok(v4.chain(v6).filter(|ip| self.permitted(*ip)).collect())
    }

    /// CAA lookups only fail on SERVFAIL. Records are returned for any other response code,
    /// since some resolvers chase a CNAME to a CAA set and still report e.g. NXDOMAIN.
    async fn lookup_caa(&self, ctx: &Context, hostname: &str) -> Result<Vec<CAA>, DnsError> {
        let record_type = RecordType::CAA;
        let response = self
            .exchange_one(ctx, hostname, record_type)
            .await
            .map_err(|err| {
                trace!(hostname, qtype = %record_type, err = %err, "exchange failed");
                DnsError::query(record_type, hostname, err)
            })?;
        if response.response_code() == ResponseCode::ServFail {
            trace!(hostname, qtype = %record_type, rcode = %rcode_name(response.response_code()), "rejected response");
            return Err(DnsError::response_code(
                record_type,
                hostname,
                ResponseCode::ServFail,
            ));
        }

        Ok(response
            .answers()
            .iter()
            .filter_map(|r| match r.data() {
                Some(RData::CAA(caa)) => Some(caa.clone()),
                _ => None,
            })
            .collect())
    }

    async fn lookup_mx(&self, ctx: &Context, hostname: &str) -> Result<Vec<String>, DnsError> {
        let response = self.lookup(ctx, hostname, RecordType::MX).await?;
        Ok(response
            .answers()
            .iter()
            .filter_map(|r| match r.data() {
                Some(RData::MX(mx)) => Some(mx.exchange().to_string()),
                _ => None,
            })
            .collect())
    }
}
