//! Per-query resolution decisions.
//!
//! Only queries carrying exactly one `A`/`IN` question are candidates for a local answer.
//! For those the name is looked up in the active [`OverrideTable`][crate::overrides::OverrideTable]:
//!
//! * no entry: the query is proxied upstream untouched and the upstream response relayed as-is.
//! * an address entry: answered locally with a single non-authoritative `A` record (TTL 30s).
//! * a name entry: a fresh `A` query for that name is sent upstream. If it comes back with
//!   exactly one `A` record, that address is served under the originally queried name.
//!   Otherwise the client gets `REFUSED`.
//!
//! Everything else is proxied. Upstream failures are never retried and turn into `REFUSED`.
//! Each outcome is counted in the engine's [`Stats`][crate::stats::Stats].

use crate::error::Error;
use crate::overrides::{SharedOverrides, Target};
use crate::stats::{self, SharedStats};
use crate::upstream::{DynUpstream, Transport};
use std::net::{Ipv4Addr, SocketAddr};
use tracing::{debug, warn};
use trust_dns_proto::op::{Edns, Message, MessageType, OpCode, Query, ResponseCode};
use trust_dns_proto::rr::{DNSClass, Name, RData, Record, RecordType};

/// TTL of locally synthesized answers, in seconds.
pub const LOCAL_TTL: u32 = 30;

/// Where a query came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origin {
    pub addr: SocketAddr,
    pub transport: Transport,
}

pub struct Engine {
    overrides: SharedOverrides,
    upstream: DynUpstream,
    stats: SharedStats,
    fault_trigger: Option<String>,
}

impl Engine {
    #[must_use]
    pub fn new(overrides: SharedOverrides, upstream: DynUpstream, stats: SharedStats) -> Self {
        Engine {
            overrides,
            upstream,
            stats,
            fault_trigger: None,
        }
    }

    /// Make `A` queries for `name` panic inside the engine. Used to exercise the
    /// [dispatcher's][crate::dns::dispatcher] fault barrier; never set it in production.
    #[must_use]
    pub fn with_fault_trigger(mut self, name: Option<String>) -> Self {
        self.fault_trigger = name.map(|n| n.trim_end_matches('.').to_ascii_lowercase());
        self
    }

    /// Produce the response for one query. Always returns exactly one message to send back.
    pub async fn resolve(&self, query: &Message, origin: Origin) -> Message {
        self.stats.increment(stats::REQUESTS);
        if let Some(response) = self.try_answer(query, origin).await {
            return response;
        }
        self.proxy(query, origin).await
    }

    /// Build the `SERVFAIL` sent when handling `query` faulted.
    #[must_use]
    pub fn refuse_on_fault(&self, query: &Message) -> Message {
        self.stats.increment(stats::PANIC_REFUSALS);
        refusal(query, ResponseCode::ServFail)
    }

    async fn try_answer(&self, query: &Message, origin: Origin) -> Option<Message> {
        let question = single_simple_question(query)?;
        let name = question.name().to_ascii();
        let name = name.trim_end_matches('.').to_ascii_lowercase();

        if self.fault_trigger.as_deref() == Some(name.as_str()) {
            panic!("fault trigger hit for {name}");
        }

        let target = match self.overrides.current().lookup(&name) {
            Some(target) => target.clone(),
            None => {
                debug!("{}: {name} not found in override table", origin.addr);
                return None;
            }
        };

        match target {
            Target::Redirect(target) => {
                debug!("{}: {name} found in override table -> redirect to {target}", origin.addr);
                Some(self.redirect(query, question.name(), &target, origin).await)
            }
            Target::Address(ip) => {
                debug!("{}: {name} found in override table -> {ip}", origin.addr);
                self.stats.increment(stats::LOCAL_RESPONSES);
                Some(answer(query, question.name(), ip))
            }
        }
    }

    async fn redirect(
        &self,
        query: &Message,
        original_name: &Name,
        target: &str,
        origin: Origin,
    ) -> Message {
        self.stats.increment(stats::REDIRECTED_REQUESTS);

        let redirect_query = match redirect_query(target) {
            Ok(redirect_query) => redirect_query,
            Err(err) => {
                warn!("{}: can't redirect to \"{target}\": {err}", origin.addr);
                return self.refuse(query);
            }
        };

        match self.exchange(&redirect_query, origin.transport).await {
            Ok(response) => match single_simple_answer(&response) {
                Some(ip) => {
                    self.stats.increment(stats::REDIRECTED_SUCCESSIVELY);
                    answer(query, original_name, ip)
                }
                None => {
                    debug!("{}: redirect to {target} yielded no answer", origin.addr);
                    self.stats.increment(stats::REDIRECTED_NOWHERE);
                    self.refuse(query)
                }
            },
            Err(err) => {
                self.stats.increment(stats::UPSTREAM_ERRORS);
                warn!("{}: error: {err}", origin.addr);
                self.refuse(query)
            }
        }
    }

    async fn proxy(&self, query: &Message, origin: Origin) -> Message {
        self.stats.increment(stats::PROXIED_REQUESTS);
        match self.exchange(query, origin.transport).await {
            Ok(response) => {
                if response.answers().is_empty() {
                    self.stats.increment(stats::PROXIED_REFUSALS);
                }
                response
            }
            Err(err) => {
                self.stats.increment(stats::UPSTREAM_ERRORS);
                warn!("{}: error: {err}", origin.addr);
                self.refuse(query)
            }
        }
    }

    async fn exchange(&self, query: &Message, transport: Transport) -> Result<Message, Error> {
        self.stats.increment(stats::UPSTREAM_QUERIES);
        self.upstream.exchange(query, transport).await
    }

    fn refuse(&self, query: &Message) -> Message {
        self.stats.increment(stats::REFUSALS);
        refusal(query, ResponseCode::Refused)
    }
}

fn single_simple_question(message: &Message) -> Option<&Query> {
    let [question] = message.queries() else {
        return None;
    };
    if question.query_type() != RecordType::A || question.query_class() != DNSClass::IN {
        return None;
    }
    Some(question)
}

fn single_simple_answer(message: &Message) -> Option<Ipv4Addr> {
    let [record] = message.answers() else {
        return None;
    };
    if record.record_type() != RecordType::A || record.dns_class() != DNSClass::IN {
        return None;
    }
    match record.data() {
        Some(RData::A(ip)) => Some(*ip),
        _ => None,
    }
}

fn redirect_query(target: &str) -> Result<Message, Error> {
    let name = Name::from_ascii(format!("{target}."))?;
    let mut message = Message::new();
    message
        .set_id(fastrand::u16(..))
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(true);
    message.add_query(Query::query(name, RecordType::A));
    Ok(message)
}

/// An empty response to `request`, carrying over its ID, flags and first question.
fn reply_to(request: &Message) -> Message {
    let mut reply = Message::new();
    reply
        .set_id(request.id())
        .set_message_type(MessageType::Response)
        .set_op_code(request.op_code())
        .set_recursion_desired(request.recursion_desired())
        .set_checking_disabled(request.checking_disabled());
    if let Some(question) = request.queries().first() {
        reply.add_query(question.clone());
    }
    reply
}

fn answer(request: &Message, name: &Name, ip: Ipv4Addr) -> Message {
    let mut reply = reply_to(request);
    reply.set_authoritative(false);
    reply.add_answer(Record::from_rdata(name.clone(), LOCAL_TTL, RData::A(ip)));
    reply
}

fn refusal(request: &Message, code: ResponseCode) -> Message {
    let mut reply = reply_to(request);
    reply.set_response_code(code);
    if let Some(request_edns) = request.extensions() {
        let mut edns = Edns::new();
        edns.set_max_payload(request_edns.max_payload());
        edns.set_dnssec_ok(request_edns.dnssec_ok());
        reply.set_edns(edns);
    }
    reply
}
