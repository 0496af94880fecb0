//! End-to-end tests for the UDP listener over loopback sockets.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use hickory_proto::op::{Message, MessageType, Query, ResponseCode};
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{Name, RData, Record, RecordType};
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::time::timeout;

use aufloes_cache::CacheManager;
use aufloes_core::config::AppConfig;
use aufloes_core::error::AppError;
use aufloes_core::result::AppResult;
use aufloes_core::traits::upstream::UpstreamClient;
use aufloes_server::{DnsServer, Resolver, ResolverOptions};

/// Answers A queries with 192.0.2.1 and fails for `fail.example.com.`.
#[derive(Debug, Default)]
struct StaticUpstream {
    calls: AtomicUsize,
}

#[async_trait]
impl UpstreamClient for StaticUpstream {
    fn kind(&self) -> &str {
        "static"
    }

    async fn resolve_raw(&self, query: BytesMut) -> AppResult<BytesMut> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let request = Message::from_vec(&query)?;
        let question = request.queries()[0].clone();
        if question.name().to_ascii() == "fail.example.com." {
            return Err(AppError::upstream("upstream unavailable"));
        }

        let mut response = Message::new();
        response
            .set_id(request.id())
            .set_message_type(MessageType::Response)
            .set_recursion_available(true)
            .set_response_code(ResponseCode::NoError);
        let rdata = RData::A(A::from(Ipv4Addr::new(192, 0, 2, 1)));
        response.add_answer(Record::from_rdata(question.name().clone(), 120, rdata));
        response.add_query(question);
        Ok(BytesMut::from(&response.to_vec()?[..]))
    }
}

struct TestServer {
    addr: SocketAddr,
    upstream: Arc<StaticUpstream>,
    shutdown_tx: watch::Sender<bool>,
    handle: tokio::task::JoinHandle<AppResult<()>>,
}

async fn start_server() -> TestServer {
    let mut config = AppConfig::default();
    config.server.bind_addresses = vec![Ipv4Addr::LOCALHOST.into()];
    config.server.port = 0;
    config.server.shutdown_grace_seconds = 1;

    let upstream = Arc::new(StaticUpstream::default());
    let cache = Arc::new(CacheManager::new(&config.cache).unwrap());
    let resolver = Arc::new(Resolver::new(
        upstream.clone(),
        cache,
        ResolverOptions::from_config(&config),
    ));

    let server = DnsServer::bind(&config.server.socket_addrs(), resolver, &config.server)
        .await
        .unwrap();
    let addr = server.local_addrs()[0];

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(server.run(shutdown_rx));

    TestServer {
        addr,
        upstream,
        shutdown_tx,
        handle,
    }
}

async fn ask(server: SocketAddr, id: u16, name: &str) -> Message {
    let client = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let mut query = Message::new();
    query.set_id(id).set_recursion_desired(true);
    query.add_query(Query::query(Name::from_ascii(name).unwrap(), RecordType::A));
    client
        .send_to(&query.to_vec().unwrap(), server)
        .await
        .unwrap();

    let mut buffer = vec![0u8; 4096];
    let (n, _) = timeout(Duration::from_secs(5), client.recv_from(&mut buffer))
        .await
        .expect("no response from server")
        .unwrap();
    Message::from_vec(&buffer[..n]).unwrap()
}

#[tokio::test]
async fn test_answers_query_over_udp() {
    let server = start_server().await;

    let response = ask(server.addr, 0x5151, "www.example.com.").await;
    assert_eq!(response.id(), 0x5151);
    assert_eq!(response.response_code(), ResponseCode::NoError);
    assert_eq!(response.answer_count(), 1);

    server.shutdown_tx.send(true).unwrap();
    server.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_repeated_query_hits_cache() {
    let server = start_server().await;

    ask(server.addr, 1, "cached.example.com.").await;
    let response = ask(server.addr, 2, "cached.example.com.").await;

    assert_eq!(response.id(), 2);
    assert_eq!(server.upstream.calls.load(Ordering::SeqCst), 1);

    server.shutdown_tx.send(true).unwrap();
    server.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_upstream_failure_returns_servfail() {
    let server = start_server().await;

    let response = ask(server.addr, 9, "fail.example.com.").await;
    assert_eq!(response.id(), 9);
    assert_eq!(response.response_code(), ResponseCode::ServFail);

    server.shutdown_tx.send(true).unwrap();
    server.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_stops_when_shutdown_sender_dropped() {
    let server = start_server().await;
    drop(server.shutdown_tx);

    timeout(Duration::from_secs(5), server.handle)
        .await
        .expect("server did not stop")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_bind_fails_when_nothing_binds() {
    let config = AppConfig::default();
    let upstream: Arc<dyn UpstreamClient> = Arc::new(StaticUpstream::default());
    let cache = Arc::new(CacheManager::new(&config.cache).unwrap());
    let resolver = Arc::new(Resolver::new(
        upstream,
        cache,
        ResolverOptions::from_config(&config),
    ));

    // TEST-NET-1 is never assigned to a local interface.
    let addrs = ["192.0.2.1:0".parse().unwrap()];
    assert!(DnsServer::bind(&addrs, resolver, &config.server).await.is_err());
}
