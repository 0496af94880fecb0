//! Resolver metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Resolver-level counters.
#[derive(Debug, Default)]
pub struct ResolverMetrics {
    /// Total datagrams received from clients
    pub requests_received: AtomicU64,
    /// Total responses sent to clients
    pub responses_sent: AtomicU64,
    /// Total queries answered from cache
    pub cache_hits: AtomicU64,
    /// Total cacheable queries that missed
    pub cache_misses: AtomicU64,
    /// Total failed upstream queries
    pub upstream_errors: AtomicU64,
    /// Total datagrams too short to be DNS
    pub malformed_requests: AtomicU64,
    /// Total SERVFAIL answers generated locally
    pub servfail_sent: AtomicU64,
    /// Total responses truncated to fit the client's buffer
    pub truncated_responses: AtomicU64,
}

impl ResolverMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self) {
        self.requests_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sent(&self) {
        self.responses_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_upstream_error(&self) {
        self.upstream_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_malformed(&self) {
        self.malformed_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_servfail(&self) {
        self.servfail_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_truncated(&self) {
        self.truncated_responses.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_received: self.requests_received.load(Ordering::Relaxed),
            responses_sent: self.responses_sent.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            upstream_errors: self.upstream_errors.load(Ordering::Relaxed),
            malformed_requests: self.malformed_requests.load(Ordering::Relaxed),
            servfail_sent: self.servfail_sent.load(Ordering::Relaxed),
            truncated_responses: self.truncated_responses.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub requests_received: u64,
    pub responses_sent: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub upstream_errors: u64,
    pub malformed_requests: u64,
    pub servfail_sent: u64,
    pub truncated_responses: u64,
}
