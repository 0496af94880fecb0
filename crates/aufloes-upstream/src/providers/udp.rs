//! Plain DNS-over-UDP upstream.

use std::collections::HashMap;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use tokio::net::UdpSocket;
use tokio::sync::{Mutex, oneshot};
use tokio::time::timeout;
use tracing::{debug, warn};

use aufloes_core::config::upstream::UdpUpstreamConfig;
use aufloes_core::error::AppError;
use aufloes_core::proto;
use aufloes_core::result::AppResult;
use aufloes_core::traits::upstream::UpstreamClient;

/// Largest datagram the receive task accepts.
const MAX_DATAGRAM: usize = 65535;

/// Number of distinct transaction IDs.
const TXID_SPACE: usize = 1 << 16;

/// A plain UDP upstream.
///
/// All queries share one connected socket. Each in-flight query gets a
/// random unused transaction ID, and a background task hands responses to
/// the waiting query by ID.
#[derive(Debug)]
pub struct UdpUpstream {
    inner: Arc<UdpUpstreamInner>,
    server_addr: SocketAddr,
    timeout: Duration,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

#[derive(Debug)]
struct UdpUpstreamInner {
    socket: UdpSocket,
    pending: Mutex<HashMap<u16, oneshot::Sender<BytesMut>>>,
}

impl UdpUpstream {
    /// Connect to `server_addr`, giving each query `timeout` to complete.
    pub async fn new(server_addr: SocketAddr, timeout: Duration) -> AppResult<Self> {
        let local_addr = match server_addr {
            SocketAddr::V4(_) => SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), 0),
            SocketAddr::V6(_) => SocketAddr::new(Ipv6Addr::UNSPECIFIED.into(), 0),
        };
        let socket = UdpSocket::bind(local_addr).await?;
        socket.connect(server_addr).await?;

        let inner = Arc::new(UdpUpstreamInner {
            socket,
            pending: Mutex::default(),
        });
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(Self::receive_task(inner.clone(), shutdown_rx));

        Ok(Self {
            inner,
            server_addr,
            timeout,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    /// Create an upstream from configuration.
    pub async fn from_config(config: &UdpUpstreamConfig) -> AppResult<Self> {
        let server_addr = config.address.parse::<SocketAddr>().map_err(|e| {
            AppError::configuration(format!(
                "Invalid UDP upstream address '{}': {e}",
                config.address
            ))
        })?;
        Self::new(server_addr, Duration::from_secs(config.timeout_seconds)).await
    }

    /// Address of the upstream server.
    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    /// Picks an unused transaction ID and registers it as pending.
    async fn new_pending_request(&self) -> AppResult<(u16, oneshot::Receiver<BytesMut>)> {
        let (sender, receiver) = oneshot::channel();
        let mut pending = self.inner.pending.lock().await;
        if pending.len() >= TXID_SPACE {
            return Err(AppError::upstream(
                "every transaction ID is in use by an in-flight query",
            ));
        }

        let txid = loop {
            let txid = rand::random::<u16>();
            if !pending.contains_key(&txid) {
                break txid;
            }
        };
        pending.insert(txid, sender);
        Ok((txid, receiver))
    }

    async fn forget(&self, txid: u16) {
        self.inner.pending.lock().await.remove(&txid);
    }

    /// Receives responses and resolves pending queries.
    /// Stops when `shutdown_rx` fires or its sender is dropped.
    async fn receive_task(inner: Arc<UdpUpstreamInner>, mut shutdown_rx: oneshot::Receiver<()>) {
        let mut buffer = vec![0u8; MAX_DATAGRAM];
        loop {
            let result = tokio::select! {
                _ = &mut shutdown_rx => {
                    debug!("UDP upstream receive task shutting down");
                    break;
                },
                result = inner.socket.recv(&mut buffer) => result,
            };

            let n = match result {
                Ok(n) => n,
                Err(err) => {
                    warn!(error = %err, "UDP upstream receive failed");
                    continue;
                }
            };
            let data = &buffer[..n];
            if !proto::is_response(data) {
                continue;
            }
            let Ok(txid) = proto::txid(data) else {
                continue;
            };

            let Some(sender) = inner.pending.lock().await.remove(&txid) else {
                debug!(txid, "Dropping UDP response without a pending query");
                continue;
            };
            let _ = sender.send(BytesMut::from(data));
        }
    }
}

impl Drop for UdpUpstream {
    fn drop(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
    }
}

#[async_trait]
impl UpstreamClient for UdpUpstream {
    fn kind(&self) -> &str {
        "udp"
    }

    async fn resolve_raw(&self, mut query: BytesMut) -> AppResult<BytesMut> {
        let original_txid = proto::txid(&query)?;

        // Register before sending so a fast response cannot arrive unclaimed.
        let (txid, receiver) = self.new_pending_request().await?;
        proto::set_txid(&mut query, txid)?;

        if let Err(err) = self.inner.socket.send(&query).await {
            self.forget(txid).await;
            return Err(err.into());
        }

        match timeout(self.timeout, receiver).await {
            Ok(Ok(mut response)) => {
                proto::set_txid(&mut response, original_txid)?;
                Ok(response)
            }
            Ok(Err(_)) => {
                self.forget(txid).await;
                Err(AppError::upstream(
                    "UDP upstream stopped before a response arrived",
                ))
            }
            Err(_) => {
                warn!(
                    server = %self.server_addr,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "UDP upstream timed out"
                );
                self.forget(txid).await;
                Err(AppError::timeout(format!(
                    "no response from {} within {} ms",
                    self.server_addr,
                    self.timeout.as_millis()
                )))
            }
        }
    }
}
