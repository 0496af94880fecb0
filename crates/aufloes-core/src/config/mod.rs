//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! an optional TOML file plus `AUFLOES__`-prefixed environment variables.
//! Every field has a default, so an empty configuration is valid apart from
//! the upstream URL, which usually comes from the command line.

pub mod cache;
pub mod logging;
pub mod server;
pub mod upstream;

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use self::cache::CacheConfig;
use self::logging::LoggingConfig;
use self::server::ServerConfig;
use self::upstream::UpstreamConfig;

use crate::error::AppError;
use crate::result::AppResult;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// UDP listener settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream server settings.
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Response cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from an optional TOML file and the environment.
    ///
    /// Environment variables use the `AUFLOES` prefix and `__` as the
    /// section separator, e.g. `AUFLOES__SERVER__PORT=5353`.
    pub fn load(path: Option<&str>) -> AppResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }
        let config = builder
            .add_source(
                config::Environment::with_prefix("AUFLOES")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> AppResult<()> {
        if self.server.bind_addresses.is_empty() {
            return Err(AppError::configuration(
                "server.bind_addresses must contain at least one address",
            ));
        }
        if !(512..=65535).contains(&self.server.max_udp_payload) {
            return Err(AppError::configuration(format!(
                "server.max_udp_payload must be between 512 and 65535, got {}",
                self.server.max_udp_payload
            )));
        }

        match self.upstream.provider.as_str() {
            "https" => {
                let Some(url) = self.upstream.https.url.as_deref() else {
                    return Err(AppError::configuration(
                        "upstream.https.url is required for the 'https' provider",
                    ));
                };
                if !url.starts_with("https://") {
                    return Err(AppError::configuration(format!(
                        "upstream.https.url must use the https scheme, got '{url}'"
                    )));
                }
            }
            "udp" => {
                self.upstream
                    .udp
                    .address
                    .parse::<SocketAddr>()
                    .map_err(|e| {
                        AppError::configuration(format!(
                            "upstream.udp.address '{}' is not ip:port: {e}",
                            self.upstream.udp.address
                        ))
                    })?;
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown upstream provider: '{other}'. Supported: https, udp"
                )));
            }
        }

        if self.cache.min_ttl_seconds > self.cache.max_ttl_seconds {
            return Err(AppError::configuration(format!(
                "cache.min_ttl_seconds ({}) exceeds cache.max_ttl_seconds ({})",
                self.cache.min_ttl_seconds, self.cache.max_ttl_seconds
            )));
        }

        if !matches!(self.logging.format.as_str(), "pretty" | "compact" | "json") {
            return Err(AppError::configuration(format!(
                "Unknown logging format: '{}'. Supported: pretty, compact, json",
                self.logging.format
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::error::ErrorKind;

    fn https_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.upstream.https.url = Some("https://dns.example.net/dns-query".to_string());
        config
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 53);
        assert_eq!(config.server.bind_addresses.len(), 2);
        assert_eq!(config.upstream.provider, "https");
        assert_eq!(config.upstream.https.timeout_seconds, 10);
        assert_eq!(config.upstream.udp.timeout_seconds, 5);
        assert_eq!(config.cache.provider, "memory");
        assert!(config.server.servfail_on_error);
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 5353
bind_addresses = ["127.0.0.1"]

[upstream]
provider = "udp"

[upstream.udp]
address = "127.0.0.1:5300"
timeout_seconds = 2

[cache]
provider = "disabled"
"#
        )
        .unwrap();

        let config = AppConfig::load(file.path().to_str()).unwrap();
        assert_eq!(config.server.port, 5353);
        assert_eq!(config.server.socket_addrs(), vec!["127.0.0.1:5353".parse().unwrap()]);
        assert_eq!(config.upstream.provider, "udp");
        assert_eq!(config.upstream.udp.address, "127.0.0.1:5300");
        assert_eq!(config.upstream.udp.timeout_seconds, 2);
        assert_eq!(config.cache.provider, "disabled");
        assert_eq!(config.logging.level, "info");
        config.validate().unwrap();
    }

    #[test]
    fn test_load_missing_file_fails() {
        let err = AppConfig::load(Some("/nonexistent/aufloes.toml")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }

    #[test]
    fn test_validate_requires_https_url() {
        let err = AppConfig::default().validate().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
        assert!(https_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_plain_http() {
        let mut config = https_config();
        config.upstream.https.url = Some("http://dns.example.net/dns-query".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_udp_address() {
        let mut config = AppConfig::default();
        config.upstream.provider = "udp".to_string();
        config.upstream.udp.address = "dns.example.net".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_provider() {
        let mut config = https_config();
        config.upstream.provider = "tls".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.message.contains("tls"));
    }

    #[test]
    fn test_validate_ttl_bounds() {
        let mut config = https_config();
        config.cache.min_ttl_seconds = 600;
        config.cache.max_ttl_seconds = 60;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_payload_bounds() {
        let mut config = https_config();
        config.server.max_udp_payload = 100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_empty_bind_addresses() {
        let mut config = https_config();
        config.server.bind_addresses.clear();
        assert!(config.validate().is_err());
    }
}
