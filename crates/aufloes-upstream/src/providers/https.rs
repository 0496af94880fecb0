//! DNS-over-HTTPS upstream.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::{StatusCode, Url, header, redirect::Policy};
use tracing::debug;

use aufloes_core::config::upstream::HttpsUpstreamConfig;
use aufloes_core::error::{AppError, ErrorKind};
use aufloes_core::proto::{self, HEADER_LEN};
use aufloes_core::result::AppResult;
use aufloes_core::traits::upstream::UpstreamClient;

/// A DNS-over-HTTPS (DoH) upstream.
///
/// Queries are sent as `POST` requests as defined in [RFC 8484].
///
/// [RFC 8484]: https://datatracker.ietf.org/doc/html/rfc8484
#[derive(Debug, Clone)]
pub struct HttpsUpstream {
    client: reqwest::Client,
    url: Url,
}

impl HttpsUpstream {
    const CONTENT_TYPE_DNS_MESSAGE: &'static str = "application/dns-message";

    /// Create a new upstream for the given server URL.
    ///
    /// When `bootstrap_ip` is set, the URL's host is pinned to that address
    /// instead of being looked up, which avoids a resolution loop when this
    /// process is the system resolver.
    pub fn new(url: Url, bootstrap_ip: Option<IpAddr>, timeout: Duration) -> AppResult<Self> {
        if url.scheme() != "https" {
            return Err(AppError::configuration(format!(
                "DoH upstream requires an 'https' URL, got scheme '{}'",
                url.scheme()
            )));
        }
        let Some(host) = url.host_str() else {
            return Err(AppError::configuration(format!(
                "DoH upstream URL '{url}' does not specify a host"
            )));
        };

        let mut builder = reqwest::Client::builder()
            .redirect(Policy::none())
            .timeout(timeout)
            .https_only(true)
            .http2_prior_knowledge();

        if let Some(ip) = bootstrap_ip {
            debug!(host, %ip, "Pinning DoH server host to bootstrap address");
            builder = builder.resolve(host, SocketAddr::new(ip, 0));
        }

        let client = builder.build().map_err(|e| {
            AppError::with_source(
                ErrorKind::Configuration,
                format!("Failed to build HTTP client: {e}"),
                e,
            )
        })?;

        Ok(Self { client, url })
    }

    /// Create an upstream from configuration.
    pub fn from_config(config: &HttpsUpstreamConfig) -> AppResult<Self> {
        let Some(raw_url) = config.url.as_deref() else {
            return Err(AppError::configuration(
                "upstream.https.url is required for the 'https' provider",
            ));
        };
        let url = Url::parse(raw_url).map_err(|e| {
            AppError::configuration(format!("Invalid DoH URL '{raw_url}': {e}"))
        })?;
        Self::new(
            url,
            config.bootstrap_ip,
            Duration::from_secs(config.timeout_seconds),
        )
    }

    /// Server URL queries are posted to.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

fn map_request_error(err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::with_source(ErrorKind::Timeout, format!("DoH request timed out: {err}"), err)
    } else {
        AppError::with_source(ErrorKind::Upstream, format!("DoH request failed: {err}"), err)
    }
}

/// Saves the query's transaction ID and replaces it with 0 on the wire.
///
/// RFC 8484, Section 4.1: clients SHOULD use ID 0 for cache friendliness.
fn prepare_query(mut query: BytesMut) -> AppResult<(u16, Bytes)> {
    let txid = proto::txid(&query)?;
    proto::set_txid(&mut query, 0)?;
    Ok((txid, query.freeze()))
}

/// Checks the HTTP outcome and restores `txid` on the returned message.
fn finish_response(status: StatusCode, body: &[u8], txid: u16) -> AppResult<BytesMut> {
    if !status.is_success() {
        return Err(AppError::upstream(format!(
            "DoH server returned non-success status: {status}"
        )));
    }
    if body.len() < HEADER_LEN {
        return Err(AppError::protocol(format!(
            "DoH server returned {} bytes, shorter than a DNS header",
            body.len()
        )));
    }

    let mut data = BytesMut::from(body);
    proto::set_txid(&mut data, txid)?;
    Ok(data)
}

#[async_trait]
impl UpstreamClient for HttpsUpstream {
    fn kind(&self) -> &str {
        "https"
    }

    async fn resolve_raw(&self, query: BytesMut) -> AppResult<BytesMut> {
        let (txid, body) = prepare_query(query)?;

        let response = self
            .client
            .post(self.url.clone())
            .header(header::ACCEPT, Self::CONTENT_TYPE_DNS_MESSAGE)
            .header(header::CONTENT_TYPE, Self::CONTENT_TYPE_DNS_MESSAGE)
            .body(body)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_request_error)?;
        finish_response(status, &body, txid)
    }
}
