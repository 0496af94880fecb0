//! Cache key builders.

use hickory_proto::op::{Message, OpCode, Query};

/// Prefix applied to all aufloes cache keys.
const PREFIX: &str = "aufloes";

/// Cache key for a single question.
///
/// Names compare case-insensitively in DNS, so the name is lowercased.
/// Whether the query used EDNS decides if the response may carry an OPT
/// record, and the DO and CD bits change what an upstream returns, so all
/// three are part of the key.
pub fn question(
    query: &Query,
    edns: bool,
    dnssec_ok: bool,
    checking_disabled: bool,
) -> String {
    format!(
        "{PREFIX}:q:{}:{}:{}:edns={}:do={}:cd={}",
        query.name().to_lowercase().to_ascii(),
        query.query_type(),
        query.query_class(),
        u8::from(edns),
        u8::from(dnssec_ok),
        u8::from(checking_disabled),
    )
}

/// Cache key for a decoded request.
///
/// Returns `None` for anything other than a standard query with exactly one
/// question, which is never cached.
pub fn for_request(request: &Message) -> Option<String> {
    if request.op_code() != OpCode::Query {
        return None;
    }
    let [query] = request.queries() else {
        return None;
    };
    let edns = request.extensions().as_ref();
    Some(question(
        query,
        edns.is_some(),
        edns.is_some_and(|edns| edns.dnssec_ok()),
        request.checking_disabled(),
    ))
}

#[cfg(test)]
mod tests {
    use hickory_proto::op::Edns;
    use hickory_proto::rr::{Name, RecordType};

    use super::*;

    fn request(name: &str, rtype: RecordType) -> Message {
        let mut message = Message::new();
        message.add_query(Query::query(Name::from_ascii(name).unwrap(), rtype));
        message
    }

    #[test]
    fn test_question_key() {
        let message = request("WWW.Example.COM.", RecordType::AAAA);
        assert_eq!(
            for_request(&message).unwrap(),
            "aufloes:q:www.example.com.:AAAA:IN:edns=0:do=0:cd=0"
        );
    }

    #[test]
    fn test_dnssec_ok_changes_key() {
        let plain = request("example.com.", RecordType::A);
        let mut signed = plain.clone();
        let mut edns = Edns::new();
        edns.set_dnssec_ok(true);
        signed.set_edns(edns);

        assert_ne!(for_request(&plain), for_request(&signed));
    }

    #[test]
    fn test_edns_presence_changes_key() {
        let plain = request("example.com.", RecordType::A);
        let mut extended = plain.clone();
        extended.set_edns(Edns::new());

        assert_eq!(
            for_request(&extended).unwrap(),
            "aufloes:q:example.com.:A:IN:edns=1:do=0:cd=0"
        );
        assert_ne!(for_request(&plain), for_request(&extended));
    }

    #[test]
    fn test_multiple_questions_not_keyed() {
        let mut message = request("example.com.", RecordType::A);
        message.add_query(Query::query(
            Name::from_ascii("example.org.").unwrap(),
            RecordType::A,
        ));
        assert_eq!(for_request(&message), None);
    }

    #[test]
    fn test_non_query_opcode_not_keyed() {
        let mut message = request("example.com.", RecordType::SOA);
        message.set_op_code(OpCode::Notify);
        assert_eq!(for_request(&message), None);
    }
}
