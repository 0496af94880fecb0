//! Request pipeline: cache lookup, upstream forwarding, and response fitting.

use std::sync::Arc;

use bytes::Bytes;
use hickory_proto::op::Message;
use tracing::{debug, info, warn};

use aufloes_cache::keys;
use aufloes_core::config::AppConfig;
use aufloes_core::error::AppError;
use aufloes_core::proto::{self, HEADER_LEN, TtlPolicy};
use aufloes_core::traits::cache::{CachedResponse, ResponseCache};
use aufloes_core::traits::upstream::UpstreamClient;

use crate::metrics::ResolverMetrics;
use crate::request::Request;

/// Behaviour switches for [`Resolver`].
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Answer SERVFAIL when the upstream fails.
    pub servfail_on_error: bool,
    /// Upper bound for responses sent to EDNS clients.
    pub max_udp_payload: usize,
    /// Bounds for cache lifetimes.
    pub ttl_policy: TtlPolicy,
}

impl ResolverOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            servfail_on_error: config.server.servfail_on_error,
            max_udp_payload: config.server.max_udp_payload,
            ttl_policy: config.cache.ttl_policy(),
        }
    }
}

/// Answers downstream queries from cache or the upstream.
#[derive(Debug)]
pub struct Resolver {
    upstream: Arc<dyn UpstreamClient>,
    cache: Arc<dyn ResponseCache>,
    metrics: Arc<ResolverMetrics>,
    options: ResolverOptions,
}

impl Resolver {
    pub fn new(
        upstream: Arc<dyn UpstreamClient>,
        cache: Arc<dyn ResponseCache>,
        options: ResolverOptions,
    ) -> Self {
        Self {
            upstream,
            cache,
            metrics: Arc::new(ResolverMetrics::new()),
            options,
        }
    }

    pub fn metrics(&self) -> &Arc<ResolverMetrics> {
        &self.metrics
    }

    /// Produce the datagram to send back for `request`, if any.
    ///
    /// Returns `None` when the request is not DNS at all, or when the
    /// upstream failed and SERVFAIL answers are turned off.
    pub async fn handle(&self, request: &Request) -> Option<Vec<u8>> {
        self.metrics.record_received();

        if request.data.len() < HEADER_LEN {
            warn!(
                request_id = request.id,
                peer = %request.peer,
                bytes = request.data.len(),
                "Dropping request shorter than a DNS header"
            );
            self.metrics.record_malformed();
            return None;
        }
        let decoded = match Message::from_vec(&request.data) {
            Ok(message) => Some(message),
            Err(err) => {
                debug!(
                    request_id = request.id,
                    error = %err,
                    "Request failed to decode, forwarding as-is"
                );
                None
            }
        };
        let key = decoded.as_ref().and_then(keys::for_request);

        if let (Some(key), Some(query)) = (key.as_deref(), decoded.as_ref()) {
            if let Some(cached) = self.lookup(key, query).await {
                debug!(request_id = request.id, key, "Answering from cache");
                self.metrics.record_cache_hit();
                return self.fit(request, decoded.as_ref(), cached);
            }
            self.metrics.record_cache_miss();
        }

        let response = match self.forward(request).await {
            Ok(response) => response,
            Err(err) => {
                warn!(request_id = request.id, error = %err, "Error in upstream request");
                self.metrics.record_upstream_error();
                return self.servfail(request);
            }
        };
        info!(
            request_id = request.id,
            bytes = response.len(),
            "Received response from upstream server"
        );

        if let Some(key) = key.as_deref() {
            self.store(key, &response).await;
        }

        self.fit(request, decoded.as_ref(), response)
    }

    async fn forward(&self, request: &Request) -> Result<Vec<u8>, AppError> {
        let txid = proto::txid(&request.data)?;
        let response = self.upstream.resolve_raw(request.data.clone()).await?;
        if response.len() < HEADER_LEN {
            return Err(AppError::upstream(format!(
                "upstream returned {} bytes, shorter than a DNS header",
                response.len()
            )));
        }

        let mut response = response.to_vec();
        proto::set_txid(&mut response, txid)?;
        Ok(response)
    }

    async fn lookup(&self, key: &str, query: &Message) -> Option<Vec<u8>> {
        let entry = match self.cache.get(key).await {
            Ok(entry) => entry?,
            Err(err) => {
                warn!(key, error = %err, "Cache lookup failed");
                return None;
            }
        };

        match proto::age_response(&entry.data, entry.age(), query) {
            Ok(data) => Some(data),
            Err(err) => {
                warn!(key, error = %err, "Discarding undecodable cache entry");
                let _ = self.cache.remove(key).await;
                None
            }
        }
    }

    async fn store(&self, key: &str, response: &[u8]) {
        let ttl = match Message::from_vec(response) {
            Ok(message) => proto::cache_ttl(&message, &self.options.ttl_policy),
            Err(err) => {
                debug!(key, error = %err, "Not caching undecodable upstream response");
                None
            }
        };
        let Some(ttl) = ttl else {
            return;
        };

        let entry = CachedResponse::new(Bytes::copy_from_slice(response), ttl);
        if let Err(err) = self.cache.insert(key, entry).await {
            warn!(key, error = %err, "Cache insert failed");
        }
    }

    /// Truncates `response` when it exceeds what the client can receive.
    fn fit(
        &self,
        request: &Request,
        decoded: Option<&Message>,
        response: Vec<u8>,
    ) -> Option<Vec<u8>> {
        let Some(query) = decoded else {
            return Some(response);
        };

        let limit = proto::client_payload_limit(query).min(self.options.max_udp_payload);
        if response.len() <= limit {
            return Some(response);
        }

        match proto::truncate_for_client(response, limit) {
            Ok(truncated) => {
                debug!(request_id = request.id, limit, "Truncated response for client");
                self.metrics.record_truncated();
                Some(truncated)
            }
            Err(err) => {
                warn!(request_id = request.id, error = %err, "Failed to truncate response");
                self.servfail(request)
            }
        }
    }

    fn servfail(&self, request: &Request) -> Option<Vec<u8>> {
        if !self.options.servfail_on_error {
            return None;
        }
        let response = proto::servfail_for(&request.data).ok()?;
        self.metrics.record_servfail();
        Some(response)
    }
}
