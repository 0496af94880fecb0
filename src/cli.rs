//! Command-line arguments.

use std::net::{IpAddr, SocketAddr};

use clap::Parser;
use reqwest::Url;

use aufloes_core::config::AppConfig;

/// Crates whose log level `--verbose` raises to debug.
const WORKSPACE_CRATES: &[&str] = &[
    "aufloes",
    "aufloes_core",
    "aufloes_cache",
    "aufloes_upstream",
    "aufloes_server",
];

/// aufloes — forwards local DNS queries to a DNS-over-HTTPS server
#[derive(Debug, Parser)]
#[command(name = "aufloes", version, about, long_about = None)]
pub struct Cli {
    /// Upstream server URL.
    /// Example: https://dnsserver.example.net/dns-query
    #[arg(value_parser = parse_https_url, conflicts_with = "udp")]
    pub server: Option<Url>,

    /// Upstream server IP address.
    /// Required for DNS-over-HTTPS when aufloes is the system resolver.
    #[arg(long = "ip")]
    pub server_ip: Option<IpAddr>,

    /// Forward over plain UDP to this ip:port instead of DNS-over-HTTPS.
    #[arg(long)]
    pub udp: Option<SocketAddr>,

    /// Port to bind the UDP listener to.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Be more verbose.
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to a TOML configuration file.
    #[arg(short, long)]
    pub config: Option<String>,

    /// Print the effective configuration as JSON and exit.
    #[arg(long)]
    pub print_config: bool,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(url) = &self.server {
            config.upstream.provider = "https".to_string();
            config.upstream.https.url = Some(url.to_string());
        }
        if let Some(ip) = self.server_ip {
            config.upstream.https.bootstrap_ip = Some(ip);
        }
        if let Some(addr) = self.udp {
            config.upstream.provider = "udp".to_string();
            config.upstream.udp.address = addr.to_string();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.verbose {
            config.logging.level = verbose_filter();
        }
    }
}

fn parse_https_url(s: &str) -> Result<Url, String> {
    let url = Url::parse(s).map_err(|e| e.to_string())?;
    if url.scheme() != "https" {
        return Err("URL scheme is not 'https' (only DNS-over-HTTPS is supported)".to_string());
    }
    Ok(url)
}

fn verbose_filter() -> String {
    let mut filter = String::from("info");
    for krate in WORKSPACE_CRATES {
        filter.push_str(&format!(",{krate}=debug"));
    }
    filter
}
