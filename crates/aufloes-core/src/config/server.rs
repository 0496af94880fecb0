//! Listener configuration.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use serde::{Deserialize, Serialize};

/// UDP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Addresses to listen on. One socket is bound per address.
    #[serde(default = "default_bind_addresses")]
    pub bind_addresses: Vec<IpAddr>,
    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Receive buffer size and upper bound for responses sent to EDNS clients.
    #[serde(default = "default_max_udp_payload")]
    pub max_udp_payload: usize,
    /// Answer with SERVFAIL when the upstream fails instead of staying silent.
    #[serde(default = "default_true")]
    pub servfail_on_error: bool,
    /// How long to wait for in-flight requests on shutdown.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_seconds: u64,
}

impl ServerConfig {
    /// Socket addresses the listener should bind.
    pub fn socket_addrs(&self) -> Vec<SocketAddr> {
        self.bind_addresses
            .iter()
            .map(|ip| SocketAddr::new(*ip, self.port))
            .collect()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addresses: default_bind_addresses(),
            port: default_port(),
            max_udp_payload: default_max_udp_payload(),
            servfail_on_error: default_true(),
            shutdown_grace_seconds: default_shutdown_grace(),
        }
    }
}

fn default_bind_addresses() -> Vec<IpAddr> {
    vec![Ipv4Addr::LOCALHOST.into(), Ipv6Addr::LOCALHOST.into()]
}

fn default_port() -> u16 {
    53
}

fn default_max_udp_payload() -> usize {
    4096
}

fn default_true() -> bool {
    true
}

fn default_shutdown_grace() -> u64 {
    5
}
