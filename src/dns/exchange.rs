use crate::context::Context;
use crate::dns::client::Client;
use crate::dns::error::{rcode_name, QueryError};
use crate::dns::exchanger::{ExchangeError, SharedExchanger, MAX_UDP_PAYLOAD};
use crate::metrics::{SharedMetrics, Tag, KEY_QUERY, KEY_TIMEOUT_COUNTER, KEY_TOTAL_LOOKUP};
use rand::Rng;
use std::str::FromStr;
use std::time::Instant;
use tracing::{error, trace};
use trust_dns_proto::op::{Edns, Message, MessageType, OpCode, Query};
use trust_dns_proto::rr::{Name, RecordType};

/// Which server the next attempt goes to, and how many attempts have been made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RetryState {
    tries: usize,
    server_index: usize,
    pool_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// Try again against the next server.
    Retry,
    /// The failure was transient but every allowed attempt has been made.
    OutOfRetries,
    /// The failure isn't worth retrying.
    Halt,
}

impl RetryState {
    pub(crate) fn new(server_index: usize, pool_size: usize) -> Self {
        Self {
            tries: 1,
            server_index,
            pool_size,
        }
    }

    pub(crate) fn tries(&self) -> usize {
        self.tries
    }

    pub(crate) fn server_index(&self) -> usize {
        self.server_index
    }

    /// Advance past a failed attempt. Only transient failures rotate to the next server, and
    /// never more than `max_tries` attempts are made in total.
    pub(crate) fn on_failure(&mut self, err: &ExchangeError, max_tries: usize) -> Step {
        if !err.temporary() {
            return Step::Halt;
        }
        if self.tries >= max_tries {
            return Step::OutOfRetries;
        }
        self.tries += 1;
        self.server_index = (self.server_index + 1) % self.pool_size;
        Step::Retry
    }
}

fn fqdn(hostname: &str) -> String {
    if hostname.ends_with('.') {
        hostname.to_string()
    } else {
        format!("{hostname}.")
    }
}

/// Builds the query for `hostname`. The AD bit only asks the resolver to report whether it
/// validated the answer; nothing is validated locally. A 4096 byte EDNS0 payload leaves room
/// for large CAA and TXT sets.
pub(crate) fn build_query(hostname: &str, record_type: RecordType) -> Result<Message, QueryError> {
    let name = Name::from_str(&fqdn(hostname)).map_err(QueryError::InvalidName)?;

    let mut edns = Edns::new();
    edns.set_max_payload(MAX_UDP_PAYLOAD);
    edns.set_dnssec_ok(false);

    let mut message = Message::new();
    message
        .set_id(rand::random())
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(true)
        .set_authentic_data(true)
        .add_query(Query::query(name, record_type));
    message.set_edns(edns);
    Ok(message)
}

fn outcome(result: &Result<Message, impl std::error::Error>) -> String {
    match result {
        Ok(message) => rcode_name(message.response_code()),
        Err(_) => "failed".to_string(),
    }
}

async fn attempt(
    exchanger: SharedExchanger,
    metrics: SharedMetrics,
    query: Message,
    server: String,
    hostname: String,
    record_type: RecordType,
) -> Result<Message, ExchangeError> {
    trace!(hostname = %hostname, qtype = %record_type, server = %server, "exchange");

    let started = Instant::now();
    let result = exchanger
        .exchange(&query, &server)
        .await
        .map(|(response, _rtt)| response);
    metrics.measure_since(
        KEY_QUERY,
        started,
        &[
            Tag::new("qtype", record_type.to_string()),
            Tag::new("result", outcome(&result)),
            Tag::new("resolver", server),
        ],
    );
    result
}

impl Client {
    /// Performs one logical query against a randomly chosen server, retrying transient network
    /// failures against the following servers. Any response the resolver sends back is returned
    /// as-is, whatever its response code.
    pub(crate) async fn exchange_one(
        &self,
        ctx: &Context,
        hostname: &str,
        record_type: RecordType,
    ) -> Result<Message, QueryError> {
        if self.servers.is_empty() {
            return Err(QueryError::NoServers);
        }
        let query = build_query(hostname, record_type)?;

        let start = rand::thread_rng().gen_range(0..self.servers.len());
        let mut state = RetryState::new(start, self.servers.len());
        let started = Instant::now();

        let result = self
            .attempts(ctx, &query, hostname, record_type, &mut state)
            .await;

        self.metrics.measure_since(
            KEY_TOTAL_LOOKUP,
            started,
            &[
                Tag::new("qtype", record_type.to_string()),
                Tag::new("result", outcome(&result)),
                Tag::new("retries", state.tries().to_string()),
                Tag::new("resolver", self.servers[state.server_index()].clone()),
            ],
        );
        result
    }

    async fn attempts(
        &self,
        ctx: &Context,
        query: &Message,
        hostname: &str,
        record_type: RecordType,
        state: &mut RetryState,
    ) -> Result<Message, QueryError> {
        loop {
            let server = &self.servers[state.server_index()];
            let mut task = tokio::spawn(attempt(
                self.exchanger.clone(),
                self.metrics.clone(),
                query.clone(),
                server.clone(),
                hostname.to_string(),
                record_type,
            ));

            let joined = tokio::select! {
                biased;
                reason = ctx.done() => {
                    task.abort();
                    self.metrics.incr_counter(
                        KEY_TIMEOUT_COUNTER,
                        1,
                        &[
                            Tag::new("qtype", record_type.to_string()),
                            Tag::new("reason", reason.as_str()),
                            Tag::new("resolver", server.clone()),
                        ],
                    );
                    error!(hostname, qtype = %record_type, %reason, "query abandoned");
                    return Err(QueryError::Canceled(reason));
                }
                joined = &mut task => joined,
            };

            let err = match joined {
                Ok(Ok(response)) => return Ok(response),
                Ok(Err(err)) => err,
                Err(join_err) => ExchangeError::Task(join_err.to_string()),
            };

            match state.on_failure(&err, self.max_tries) {
                Step::Retry => {
                    trace!(hostname, qtype = %record_type, server = %server, err = %err, "retrying");
                }
                Step::OutOfRetries => {
                    error!(hostname, qtype = %record_type, reason = "out_of_retries", err = %err);
                    return Err(err.into());
                }
                Step::Halt => return Err(err.into()),
            }
        }
    }
}
