//! Downstream request envelope.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use bytes::BytesMut;

static REQUEST_ID: AtomicU64 = AtomicU64::new(0);

/// A query received from a downstream client.
#[derive(Debug, Clone)]
pub struct Request {
    /// Process-wide sequence number, used to correlate log lines.
    pub id: u64,
    /// When the datagram was received.
    pub stamp: Instant,
    /// Address the query came from and the answer goes to.
    pub peer: SocketAddr,
    /// The query in DNS wire format.
    pub data: BytesMut,
}

impl Request {
    /// Wrap a received datagram, assigning the next request number.
    pub fn new(peer: SocketAddr, stamp: Instant, data: BytesMut) -> Self {
        Self {
            id: REQUEST_ID.fetch_add(1, Ordering::Relaxed),
            stamp,
            peer,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_increase() {
        let peer = "127.0.0.1:5353".parse().unwrap();
        let first = Request::new(peer, Instant::now(), BytesMut::new());
        let second = Request::new(peer, Instant::now(), BytesMut::new());
        assert!(second.id > first.id);
    }
}
