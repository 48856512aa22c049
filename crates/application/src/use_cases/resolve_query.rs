use crate::ports::{RecordCache, UpstreamClient};
use ember_dns_domain::DomainError;
use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::Record;
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of a single query, decided here so the transport driver can
/// send-or-not without inspecting errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// Response bytes to send back to the requester.
    Responded(Vec<u8>),
    /// Nothing is sent; the requester relies on its own client-side retry.
    Dropped,
}

/// Resolves one raw query: cache hit, or upstream round trip plus cache
/// population. Stateless across queries.
pub struct ResolveQueryUseCase {
    cache: Arc<dyn RecordCache>,
    upstream: Arc<dyn UpstreamClient>,
}

impl ResolveQueryUseCase {
    pub fn new(cache: Arc<dyn RecordCache>, upstream: Arc<dyn UpstreamClient>) -> Self {
        Self { cache, upstream }
    }

    /// Any internal error is absorbed into `Dropped` after logging; the
    /// requester is never sent an error response.
    pub async fn execute(&self, raw_query: &[u8]) -> ResolveOutcome {
        match self.resolve(raw_query).await {
            Ok(Some(bytes)) => ResolveOutcome::Responded(bytes),
            Ok(None) => ResolveOutcome::Dropped,
            Err(e) => {
                warn!(error = %e, "Query dropped");
                ResolveOutcome::Dropped
            }
        }
    }

    async fn resolve(&self, raw_query: &[u8]) -> Result<Option<Vec<u8>>, DomainError> {
        let query = Message::from_vec(raw_query)
            .map_err(|e| DomainError::ParseError(format!("malformed query: {e}")))?;

        let question = query
            .queries()
            .first()
            .cloned()
            .ok_or_else(|| DomainError::ParseError("empty question section".to_string()))?;
        let qname = question.name().to_utf8();
        let qtype = question.query_type();

        // Empty record sets are treated as misses, not served.
        let cached = self
            .cache
            .get(qtype, &qname)
            .filter(|records| !records.is_empty());
        if let Some(records) = cached {
            debug!(domain = %qname, record_type = %qtype, answers = records.len(), "Cache hit");
            return build_cached_response(&query, question, records).map(Some);
        }

        debug!(domain = %qname, record_type = %qtype, "Cache miss, forwarding upstream");
        let reply = match self.upstream.query(raw_query).await {
            Ok(bytes) => bytes,
            Err(DomainError::UpstreamTimeout) => {
                warn!(domain = %qname, "No upstream reply, dropping query");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let parsed = Message::from_vec(&reply)
            .map_err(|e| DomainError::ParseError(format!("malformed upstream reply: {e}")))?;
        if parsed.response_code() == ResponseCode::NoError {
            self.cache_reply(&parsed);
        } else {
            debug!(
                domain = %qname,
                rcode = ?parsed.response_code(),
                "Non-cacheable reply, passing through"
            );
        }

        // The raw upstream bytes go back verbatim, NXDOMAIN included.
        Ok(Some(reply))
    }

    /// Records from all three answer-bearing sections accumulate under
    /// their own (type, name) keys; the record's own TTL rekeys the whole
    /// merged entry's expiry.
    fn cache_reply(&self, reply: &Message) {
        let sections: [&[Record]; 3] =
            [reply.answers(), reply.name_servers(), reply.additionals()];
        for section in sections {
            for record in section {
                self.cache.merge(
                    record.record_type(),
                    &record.name().to_utf8(),
                    record.clone(),
                    record.ttl(),
                );
            }
        }
    }
}

/// Answer built from cache: the query's id, RD flag, and question carry
/// over; cached records fill the answer section with their stored TTLs.
fn build_cached_response(
    query: &Message,
    question: Query,
    records: Vec<Record>,
) -> Result<Vec<u8>, DomainError> {
    let mut response = Message::new(query.id(), MessageType::Response, OpCode::Query);
    response.set_recursion_desired(query.recursion_desired());
    response.set_recursion_available(true);
    response.add_query(question);
    for record in records {
        response.add_answer(record);
    }

    let mut buf = Vec::with_capacity(512);
    let mut encoder = BinEncoder::new(&mut buf);
    response
        .emit(&mut encoder)
        .map_err(|e| DomainError::ParseError(format!("failed to serialize response: {e}")))?;
    Ok(buf)
}
