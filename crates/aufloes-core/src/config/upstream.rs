//! Upstream server configuration.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// Top-level upstream configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Upstream provider type: `"https"` or `"udp"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// DNS-over-HTTPS upstream settings.
    #[serde(default)]
    pub https: HttpsUpstreamConfig,
    /// Plain UDP upstream settings.
    #[serde(default)]
    pub udp: UdpUpstreamConfig,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            https: HttpsUpstreamConfig::default(),
            udp: UdpUpstreamConfig::default(),
        }
    }
}

/// DNS-over-HTTPS upstream configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpsUpstreamConfig {
    /// Server URL, e.g. `https://dns10.quad9.net/dns-query`.
    #[serde(default)]
    pub url: Option<String>,
    /// IP address of the server host, used instead of a DNS lookup.
    ///
    /// Required when aufloes is itself the system resolver.
    #[serde(default)]
    pub bootstrap_ip: Option<IpAddr>,
    /// Request timeout in seconds.
    #[serde(default = "default_https_timeout")]
    pub timeout_seconds: u64,
}

impl Default for HttpsUpstreamConfig {
    fn default() -> Self {
        Self {
            url: None,
            bootstrap_ip: None,
            timeout_seconds: default_https_timeout(),
        }
    }
}

/// Plain UDP upstream configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UdpUpstreamConfig {
    /// Upstream `ip:port`.
    #[serde(default = "default_udp_address")]
    pub address: String,
    /// Per-query timeout in seconds.
    #[serde(default = "default_udp_timeout")]
    pub timeout_seconds: u64,
}

impl Default for UdpUpstreamConfig {
    fn default() -> Self {
        Self {
            address: default_udp_address(),
            timeout_seconds: default_udp_timeout(),
        }
    }
}

fn default_provider() -> String {
    "https".to_string()
}

fn default_https_timeout() -> u64 {
    10
}

fn default_udp_address() -> String {
    "9.9.9.10:53".to_string()
}

fn default_udp_timeout() -> u64 {
    5
}
