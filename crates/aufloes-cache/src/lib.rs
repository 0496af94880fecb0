//! # aufloes-cache
//!
//! Response cache providers for aufloes. Supports two modes:
//!
//! - **memory**: In-process cache using [moka](https://crates.io/crates/moka)
//!   with per-entry expiry taken from the response TTL
//! - **disabled**: Stores nothing, every lookup misses
//!
//! The provider is selected at runtime based on configuration.

pub mod disabled;
pub mod keys;
#[cfg(feature = "memory")]
pub mod memory;
pub mod provider;

pub use provider::CacheManager;
