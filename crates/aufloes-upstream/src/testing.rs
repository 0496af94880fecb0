//! Shared helpers for upstream tests.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use bytes::BytesMut;
use hickory_proto::op::{Message, MessageType, Query, ResponseCode};
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{Name, RData, Record, RecordType};
use tokio::net::UdpSocket;

use aufloes_core::traits::upstream::UpstreamClient;

pub fn build_request(name: &str, query_type: RecordType) -> BytesMut {
    let mut request = Message::new();
    request.set_id(0x2a2a);
    request.add_query(Query::query(Name::from_ascii(name).unwrap(), query_type));
    request.set_recursion_desired(true);
    BytesMut::from(&request.to_vec().unwrap()[..])
}

pub async fn basic_a(client: Arc<dyn UpstreamClient>) {
    let request = build_request("www.example.com.", RecordType::A);
    let response = client.resolve_raw(request).await.unwrap();
    let response = Message::from_vec(&response).unwrap();

    assert_eq!(response.id(), 0x2a2a);
    assert!(response.answer_count() >= 1);
    assert!(
        response
            .answers()
            .iter()
            .any(|record| record.record_type() == RecordType::A)
    );
}

pub async fn basic_aaaa(client: Arc<dyn UpstreamClient>) {
    let request = build_request("www.example.com.", RecordType::AAAA);
    let response = client.resolve_raw(request).await.unwrap();
    let response = Message::from_vec(&response).unwrap();

    assert_eq!(response.id(), 0x2a2a);
    assert!(
        response
            .answers()
            .iter()
            .any(|record| record.record_type() == RecordType::AAAA)
    );
}

/// Answers every query with a single A record, optionally preceded by a
/// response carrying an unrelated transaction ID.
pub async fn spawn_fake_server(send_stray_response: bool) -> SocketAddr {
    let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let addr = socket.local_addr().unwrap();

    tokio::spawn(async move {
        let mut buffer = vec![0u8; 4096];
        loop {
            let Ok((n, peer)) = socket.recv_from(&mut buffer).await else {
                break;
            };
            let Ok(request) = Message::from_vec(&buffer[..n]) else {
                continue;
            };

            let mut response = Message::new();
            response
                .set_id(request.id())
                .set_message_type(MessageType::Response)
                .set_recursion_desired(request.recursion_desired())
                .set_recursion_available(true)
                .set_response_code(ResponseCode::NoError);
            response.add_queries(request.queries().iter().cloned());
            if let Some(query) = request.queries().first() {
                let rdata = RData::A(A::from(Ipv4Addr::new(192, 0, 2, 1)));
                response.add_answer(Record::from_rdata(query.name().clone(), 60, rdata));
            }

            if send_stray_response {
                let mut stray = response.clone();
                stray.set_id(request.id().wrapping_add(1));
                let _ = socket.send_to(&stray.to_vec().unwrap(), peer).await;
            }
            let _ = socket.send_to(&response.to_vec().unwrap(), peer).await;
        }
    });

    addr
}
