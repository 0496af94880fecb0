//! Response cache configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::proto::TtlPolicy;

/// Response cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache provider type: `"memory"` or `"disabled"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Maximum number of cached responses.
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
    /// Lower bound applied to record TTLs.
    #[serde(default)]
    pub min_ttl_seconds: u64,
    /// Upper bound applied to record TTLs.
    #[serde(default = "default_max_ttl")]
    pub max_ttl_seconds: u64,
    /// TTL for negative answers that carry no SOA record.
    #[serde(default = "default_negative_ttl")]
    pub negative_ttl_seconds: u64,
}

impl CacheConfig {
    /// TTL bounds derived from this configuration.
    pub fn ttl_policy(&self) -> TtlPolicy {
        TtlPolicy {
            min_ttl: Duration::from_secs(self.min_ttl_seconds),
            max_ttl: Duration::from_secs(self.max_ttl_seconds),
            negative_ttl: Duration::from_secs(self.negative_ttl_seconds),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            max_capacity: default_max_capacity(),
            min_ttl_seconds: 0,
            max_ttl_seconds: default_max_ttl(),
            negative_ttl_seconds: default_negative_ttl(),
        }
    }
}

fn default_provider() -> String {
    "memory".to_string()
}

fn default_max_capacity() -> u64 {
    10000
}

fn default_max_ttl() -> u64 {
    86400
}

fn default_negative_ttl() -> u64 {
    300
}
