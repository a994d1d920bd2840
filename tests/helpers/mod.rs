#![allow(dead_code)]

use hostgate::engine::Origin;
use hostgate::error::Error;
use hostgate::upstream::{Transport, Upstream};
use hostgate::{Engine, OverrideStore, OverrideTable, Stats};
use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use trust_dns_proto::op::{Message, MessageType, OpCode, Query};
use trust_dns_proto::rr::{Name, RData, Record, RecordType};

pub const CLIENT: &str = "192.168.1.100:40000";

pub fn udp_origin() -> Origin {
    Origin {
        addr: CLIENT.parse::<SocketAddr>().unwrap(),
        transport: Transport::Udp,
    }
}

pub fn tcp_origin() -> Origin {
    Origin {
        transport: Transport::Tcp,
        ..udp_origin()
    }
}

pub fn query(name: &str, record_type: RecordType) -> Message {
    let mut message = Message::new();
    message
        .set_id(fastrand::u16(..))
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(true);
    message.add_query(Query::query(Name::from_ascii(name).unwrap(), record_type));
    message
}

pub fn a_query(name: &str) -> Message {
    query(name, RecordType::A)
}

/// A response to `query` carrying one `A` record per address, under the queried name.
pub fn response_to(query: &Message, ips: &[Ipv4Addr]) -> Message {
    let mut response = Message::new();
    response
        .set_id(query.id())
        .set_message_type(MessageType::Response)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(query.recursion_desired())
        .set_recursion_available(true);
    response.add_queries(query.queries().iter().cloned());
    let name = query.queries()[0].name().clone();
    for ip in ips {
        response.add_answer(Record::from_rdata(name.clone(), 300, RData::A(*ip)));
    }
    response
}

pub fn answer_ips(message: &Message) -> Vec<Ipv4Addr> {
    message
        .answers()
        .iter()
        .filter_map(|r| match r.data() {
            Some(RData::A(ip)) => Some(*ip),
            _ => None,
        })
        .collect()
}

enum Reply {
    Answers(Vec<Ipv4Addr>),
    Fail,
    Panic,
}

/// An [`Upstream`] with canned replies per query name. Names without a canned reply get an
/// empty `NOERROR` response.
#[derive(Default)]
pub struct MockUpstream {
    replies: HashMap<String, Reply>,
    seen: Mutex<Vec<(Message, Transport)>>,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, name: &str, ips: &[&str]) -> Self {
        let ips = ips.iter().map(|ip| ip.parse().unwrap()).collect();
        self.replies.insert(name.to_string(), Reply::Answers(ips));
        self
    }

    pub fn fail(mut self, name: &str) -> Self {
        self.replies.insert(name.to_string(), Reply::Fail);
        self
    }

    pub fn panic_on(mut self, name: &str) -> Self {
        self.replies.insert(name.to_string(), Reply::Panic);
        self
    }

    /// Every query received so far, in order.
    pub fn seen(&self) -> Vec<(Message, Transport)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Upstream for MockUpstream {
    async fn exchange(&self, query: &Message, transport: Transport) -> Result<Message, Error> {
        self.seen.lock().unwrap().push((query.clone(), transport));
        let name = query.queries()[0].name().to_ascii();
        match self.replies.get(name.trim_end_matches('.')) {
            Some(Reply::Answers(ips)) => Ok(response_to(query, ips)),
            Some(Reply::Fail) => Err(Error::UpstreamTimeout("mock:53".to_string())),
            Some(Reply::Panic) => panic!("mock upstream exploded on {name}"),
            None => Ok(response_to(query, &[])),
        }
    }
}

pub struct Harness {
    pub engine: Arc<Engine>,
    pub overrides: Arc<OverrideStore>,
    pub upstream: Arc<MockUpstream>,
    pub stats: Arc<Stats>,
}

impl Harness {
    pub fn new(hosts: &str, upstream: MockUpstream) -> Self {
        Self::with_fault_trigger(hosts, upstream, None)
    }

    pub fn with_fault_trigger(hosts: &str, upstream: MockUpstream, trigger: Option<&str>) -> Self {
        let overrides = Arc::new(OverrideStore::new(OverrideTable::parse(hosts)));
        let upstream = Arc::new(upstream);
        let stats = Arc::new(Stats::new());
        let engine = Engine::new(overrides.clone(), upstream.clone(), stats.clone())
            .with_fault_trigger(trigger.map(str::to_string));
        Harness {
            engine: Arc::new(engine),
            overrides,
            upstream,
            stats,
        }
    }
}
