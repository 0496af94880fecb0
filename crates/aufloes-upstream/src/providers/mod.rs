//! Upstream transport implementations.

#[cfg(feature = "https")]
pub mod https;
#[cfg(feature = "udp")]
pub mod udp;
