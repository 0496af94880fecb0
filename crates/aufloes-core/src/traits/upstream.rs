//! Upstream client trait for pluggable DNS transports.

use async_trait::async_trait;
use bytes::BytesMut;

use crate::result::AppResult;

/// Trait for transports that forward a query to an upstream server.
///
/// Implementations take a query in DNS wire format and return the raw
/// response. The returned message carries the same transaction ID as the
/// query, whatever ID was used on the wire.
#[async_trait]
pub trait UpstreamClient: Send + Sync + std::fmt::Debug + 'static {
    /// Short name of the transport, e.g. `"https"`.
    fn kind(&self) -> &str;

    /// Forward `query` and wait for the matching response.
    async fn resolve_raw(&self, query: BytesMut) -> AppResult<BytesMut>;
}
