//! In-memory port implementations and wire-message builders for use-case tests.

use async_trait::async_trait;
use ember_dns_application::ports::{RecordCache, UpstreamClient};
use ember_dns_domain::DomainError;
use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{DNSClass, Name, RData, Record, RecordType};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Default)]
pub struct MockRecordCache {
    entries: Mutex<HashMap<(RecordType, String), Vec<Record>>>,
}

impl MockRecordCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self, record_type: RecordType, name: &str) -> Option<Vec<Record>> {
        self.entries
            .lock()
            .unwrap()
            .get(&(record_type, name.to_ascii_lowercase()))
            .cloned()
    }
}

impl RecordCache for MockRecordCache {
    fn get(&self, record_type: RecordType, name: &str) -> Option<Vec<Record>> {
        self.records(record_type, name)
    }

    fn insert(&self, record_type: RecordType, name: &str, records: Vec<Record>, _ttl: u32) {
        self.entries
            .lock()
            .unwrap()
            .insert((record_type, name.to_ascii_lowercase()), records);
    }

    fn merge(&self, record_type: RecordType, name: &str, record: Record, _ttl: u32) {
        self.entries
            .lock()
            .unwrap()
            .entry((record_type, name.to_ascii_lowercase()))
            .or_default()
            .push(record);
    }

    fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

pub enum UpstreamBehavior {
    Reply(Vec<u8>),
    Timeout,
}

pub struct MockUpstream {
    behavior: UpstreamBehavior,
    calls: AtomicUsize,
}

impl MockUpstream {
    pub fn replying(reply: Vec<u8>) -> Self {
        Self {
            behavior: UpstreamBehavior::Reply(reply),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn timing_out() -> Self {
        Self {
            behavior: UpstreamBehavior::Timeout,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UpstreamClient for MockUpstream {
    async fn query(&self, _raw_query: &[u8]) -> Result<Vec<u8>, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            UpstreamBehavior::Reply(bytes) => Ok(bytes.clone()),
            UpstreamBehavior::Timeout => Err(DomainError::UpstreamTimeout),
        }
    }
}

pub fn encode(message: &Message) -> Vec<u8> {
    let mut buf = Vec::with_capacity(512);
    let mut encoder = BinEncoder::new(&mut buf);
    message.emit(&mut encoder).unwrap();
    buf
}

pub fn build_query(id: u16, domain: &str, record_type: RecordType) -> Vec<u8> {
    let mut query = Query::new();
    query.set_name(Name::from_str(domain).unwrap());
    query.set_query_type(record_type);
    query.set_query_class(DNSClass::IN);

    let mut message = Message::new(id, MessageType::Query, OpCode::Query);
    message.set_recursion_desired(true);
    message.add_query(query);
    encode(&message)
}

pub fn a_record(domain: &str, ttl: u32, octets: [u8; 4]) -> Record {
    Record::from_rdata(
        Name::from_str(domain).unwrap(),
        ttl,
        RData::A(A(Ipv4Addr::from(octets))),
    )
}

pub fn build_reply(
    query_bytes: &[u8],
    rcode: ResponseCode,
    answers: Vec<Record>,
    additionals: Vec<Record>,
) -> Vec<u8> {
    let query = Message::from_vec(query_bytes).unwrap();

    let mut reply = Message::new(query.id(), MessageType::Response, OpCode::Query);
    reply.set_response_code(rcode);
    reply.set_recursion_desired(true);
    reply.set_recursion_available(true);
    reply.add_query(query.queries()[0].clone());
    for record in answers {
        reply.add_answer(record);
    }
    for record in additionals {
        reply.add_additional(record);
    }
    encode(&reply)
}
