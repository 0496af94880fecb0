//! Core traits defined in `aufloes-core` and implemented by other crates.

pub mod cache;
pub mod upstream;

pub use cache::{CachedResponse, ResponseCache};
pub use upstream::UpstreamClient;
