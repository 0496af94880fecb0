//! # aufloes-upstream
//!
//! Upstream transports for aufloes. Supports DNS-over-HTTPS (RFC 8484) and
//! plain DNS over UDP.

pub mod manager;
pub mod providers;

#[cfg(test)]
pub(crate) mod testing;

pub use manager::UpstreamManager;
