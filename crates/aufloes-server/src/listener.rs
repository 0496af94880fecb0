//! UDP listener.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::BytesMut;
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use aufloes_core::config::server::ServerConfig;
use aufloes_core::error::{AppError, ErrorKind};
use aufloes_core::result::AppResult;

use crate::request::Request;
use crate::resolver::Resolver;

/// Serves DNS over UDP on one or more local sockets.
#[derive(Debug)]
pub struct DnsServer {
    sockets: Vec<Arc<UdpSocket>>,
    resolver: Arc<Resolver>,
    max_udp_payload: usize,
    shutdown_grace: Duration,
}

impl DnsServer {
    /// Bind one socket per address in `addrs`.
    ///
    /// Addresses that cannot be bound (e.g. IPv6 on a host without it) are
    /// skipped with a warning. Fails only if nothing could be bound.
    pub async fn bind(
        addrs: &[SocketAddr],
        resolver: Arc<Resolver>,
        config: &ServerConfig,
    ) -> AppResult<Self> {
        let mut sockets = Vec::with_capacity(addrs.len());
        let mut last_error = None;

        for addr in addrs {
            match UdpSocket::bind(addr).await {
                Ok(socket) => {
                    info!(addr = %socket.local_addr()?, "Listening for DNS queries");
                    sockets.push(Arc::new(socket));
                }
                Err(err) => {
                    warn!(%addr, error = %err, "Failed to bind listen address");
                    last_error = Some(err);
                }
            }
        }

        if sockets.is_empty() {
            let message = format!("could not bind any of {addrs:?}");
            return Err(match last_error {
                Some(err) => AppError::with_source(ErrorKind::Io, message, err),
                None => AppError::configuration(message),
            });
        }

        Ok(Self {
            sockets,
            resolver,
            max_udp_payload: config.max_udp_payload,
            shutdown_grace: Duration::from_secs(config.shutdown_grace_seconds),
        })
    }

    /// Addresses actually bound, with OS-assigned ports filled in.
    pub fn local_addrs(&self) -> Vec<SocketAddr> {
        self.sockets
            .iter()
            .filter_map(|socket| socket.local_addr().ok())
            .collect()
    }

    /// Serve until `shutdown` flips to `true` or its sender is dropped.
    ///
    /// After the receive loops stop, in-flight requests get up to the
    /// configured grace period to finish.
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> AppResult<()> {
        let tracker = TaskTracker::new();

        let loops: Vec<JoinHandle<()>> = self
            .sockets
            .iter()
            .map(|socket| {
                tokio::spawn(receive_loop(
                    socket.clone(),
                    self.resolver.clone(),
                    tracker.clone(),
                    self.max_udp_payload,
                    shutdown.clone(),
                ))
            })
            .collect();

        for handle in loops {
            if let Err(err) = handle.await {
                warn!(error = %err, "Receive loop ended abnormally");
            }
        }

        tracker.close();
        if tokio::time::timeout(self.shutdown_grace, tracker.wait())
            .await
            .is_err()
        {
            warn!(
                in_flight = tracker.len(),
                "Shutdown grace period elapsed, abandoning in-flight requests"
            );
        }

        info!("DNS listener stopped");
        Ok(())
    }
}

async fn receive_loop(
    socket: Arc<UdpSocket>,
    resolver: Arc<Resolver>,
    tracker: TaskTracker,
    max_udp_payload: usize,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut buffer = vec![0u8; max_udp_payload];
    loop {
        if *shutdown.borrow_and_update() {
            break;
        }

        let result = tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            },
            result = socket.recv_from(&mut buffer) => result,
        };
        let stamp = Instant::now();

        let (n, peer) = match result {
            Ok(received) => received,
            Err(err) => {
                warn!(error = %err, "Error in recv_from()");
                continue;
            }
        };

        let request = Request::new(peer, stamp, BytesMut::from(&buffer[..n]));
        tracker.spawn(handle_request(socket.clone(), resolver.clone(), request));
    }
    debug!("Receive loop stopped");
}

async fn handle_request(socket: Arc<UdpSocket>, resolver: Arc<Resolver>, request: Request) {
    info!(
        request_id = request.id,
        bytes = request.data.len(),
        peer = %request.peer,
        "Received request from downstream peer"
    );

    let Some(response) = resolver.handle(&request).await else {
        return;
    };

    if let Err(err) = socket.send_to(&response, request.peer).await {
        warn!(request_id = request.id, error = %err, "Error in send_to()");
        return;
    }
    resolver.metrics().record_sent();

    info!(
        request_id = request.id,
        elapsed_ms = request.stamp.elapsed().as_millis() as u64,
        "Request finished"
    );
}
