//! Upstream manager that dispatches to the configured transport.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::BytesMut;
use tracing::info;

use aufloes_core::config::upstream::UpstreamConfig;
use aufloes_core::error::AppError;
use aufloes_core::result::AppResult;
use aufloes_core::traits::upstream::UpstreamClient;

/// Upstream manager that wraps the configured transport.
///
/// The transport is selected at construction time based on configuration.
#[derive(Debug, Clone)]
pub struct UpstreamManager {
    /// The inner transport.
    inner: Arc<dyn UpstreamClient>,
}

impl UpstreamManager {
    /// Create a new upstream manager from configuration.
    pub async fn new(config: &UpstreamConfig) -> AppResult<Self> {
        let inner: Arc<dyn UpstreamClient> = match config.provider.as_str() {
            #[cfg(feature = "https")]
            "https" => {
                let upstream = crate::providers::https::HttpsUpstream::from_config(&config.https)?;
                info!(
                    url = %upstream.url(),
                    bootstrap_ip = ?config.https.bootstrap_ip,
                    "Using DNS-over-HTTPS upstream"
                );
                Arc::new(upstream)
            }
            #[cfg(feature = "udp")]
            "udp" => {
                let upstream = crate::providers::udp::UdpUpstream::from_config(&config.udp).await?;
                info!(server = %upstream.server_addr(), "Using UDP upstream");
                Arc::new(upstream)
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown upstream provider: '{other}'. Supported: https, udp"
                )));
            }
        };

        Ok(Self { inner })
    }

    /// Create an upstream manager from an existing client (for testing).
    pub fn from_client(client: Arc<dyn UpstreamClient>) -> Self {
        Self { inner: client }
    }
}

#[async_trait]
impl UpstreamClient for UpstreamManager {
    fn kind(&self) -> &str {
        self.inner.kind()
    }

    async fn resolve_raw(&self, query: BytesMut) -> AppResult<BytesMut> {
        self.inner.resolve_raw(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aufloes_core::error::ErrorKind;

    #[tokio::test]
    async fn test_builds_https_upstream() {
        let mut config = UpstreamConfig::default();
        config.https.url = Some("https://dns.example.net/dns-query".to_string());
        let manager = UpstreamManager::new(&config).await.unwrap();
        assert_eq!(manager.kind(), "https");
    }

    #[tokio::test]
    async fn test_builds_udp_upstream() {
        let mut config = UpstreamConfig {
            provider: "udp".to_string(),
            ..UpstreamConfig::default()
        };
        config.udp.address = "127.0.0.1:5300".to_string();
        let manager = UpstreamManager::new(&config).await.unwrap();
        assert_eq!(manager.kind(), "udp");
    }

    #[tokio::test]
    async fn test_unknown_provider() {
        let config = UpstreamConfig {
            provider: "quic".to_string(),
            ..UpstreamConfig::default()
        };
        let err = UpstreamManager::new(&config).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }
}
