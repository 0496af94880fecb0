//! Helpers that need a decoded DNS message.

use std::time::Duration;

use hickory_proto::op::{Message, MessageType, ResponseCode};
use hickory_proto::rr::{RData, Record};

use super::MIN_UDP_PAYLOAD;
use crate::result::AppResult;

/// Bounds applied when deriving a cache lifetime from record TTLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    /// Lower bound.
    pub min_ttl: Duration,
    /// Upper bound.
    pub max_ttl: Duration,
    /// Used for negative answers without an SOA record.
    pub negative_ttl: Duration,
}

/// Largest response the sender of `request` accepts over UDP.
pub fn client_payload_limit(request: &Message) -> usize {
    request
        .extensions()
        .as_ref()
        .map(|edns| usize::from(edns.max_payload()).max(MIN_UDP_PAYLOAD))
        .unwrap_or(MIN_UDP_PAYLOAD)
}

/// Fits `response` into `limit` bytes.
///
/// Responses that already fit are returned as-is. Larger ones are replaced
/// by a copy of the header and question with the TC bit set, which tells
/// the client to retry over a transport without the size limit.
pub fn truncate_for_client(response: Vec<u8>, limit: usize) -> AppResult<Vec<u8>> {
    if response.len() <= limit {
        return Ok(response);
    }

    let original = Message::from_vec(&response)?;
    let mut truncated = Message::new();
    truncated
        .set_id(original.id())
        .set_message_type(MessageType::Response)
        .set_op_code(original.op_code())
        .set_authoritative(original.authoritative())
        .set_recursion_desired(original.recursion_desired())
        .set_recursion_available(original.recursion_available())
        .set_authentic_data(original.authentic_data())
        .set_checking_disabled(original.checking_disabled())
        .set_response_code(original.response_code())
        .set_truncated(true);
    truncated.add_queries(original.queries().iter().cloned());
    if let Some(edns) = original.extensions() {
        truncated.set_edns(edns.clone());
    }

    Ok(truncated.to_vec()?)
}

/// How long `response` may be served from cache, if at all.
///
/// Positive answers live as long as their shortest record TTL. Negative
/// answers (NXDOMAIN or NOERROR without answers) use the SOA record from the
/// authority section as described in RFC 2308, falling back to
/// `policy.negative_ttl`. Truncated answers and error codes other than
/// NXDOMAIN are never cached.
pub fn cache_ttl(response: &Message, policy: &TtlPolicy) -> Option<Duration> {
    if response.truncated() || response.queries().is_empty() {
        return None;
    }

    let negative = match response.response_code() {
        ResponseCode::NoError => response.answers().is_empty(),
        ResponseCode::NXDomain => true,
        _ => return None,
    };

    let ttl = if negative {
        response
            .name_servers()
            .iter()
            .find_map(|record| match record.data() {
                Some(RData::SOA(soa)) => Some(record.ttl().min(soa.minimum())),
                _ => None,
            })
            .map(|secs| Duration::from_secs(secs.into()))
            .unwrap_or(policy.negative_ttl)
    } else {
        let secs = response
            .answers()
            .iter()
            .chain(response.name_servers())
            .chain(response.additionals())
            .map(Record::ttl)
            .min()?;
        Duration::from_secs(secs.into())
    };

    let ttl = ttl.max(policy.min_ttl).min(policy.max_ttl);
    (!ttl.is_zero()).then_some(ttl)
}

/// Re-encodes a cached response for a new query.
///
/// Every record TTL is reduced by `elapsed` (saturating at zero). The
/// transaction ID and question section are taken from `request`, so the
/// client sees its own name spelling.
pub fn age_response(data: &[u8], elapsed: Duration, request: &Message) -> AppResult<Vec<u8>> {
    let mut message = Message::from_vec(data)?;
    let secs = u32::try_from(elapsed.as_secs()).unwrap_or(u32::MAX);

    let age = |records: Vec<Record>| -> Vec<Record> {
        records
            .into_iter()
            .map(|mut record| {
                let ttl = record.ttl().saturating_sub(secs);
                record.set_ttl(ttl);
                record
            })
            .collect()
    };

    let answers = age(message.take_answers());
    let name_servers = age(message.take_name_servers());
    let additionals = age(message.take_additionals());
    message.insert_answers(answers);
    message.insert_name_servers(name_servers);
    message.insert_additionals(additionals);
    message.take_queries();
    message.add_queries(request.queries().iter().cloned());
    message.set_id(request.id());

    Ok(message.to_vec()?)
}
