//! In-memory cache backend.

pub mod store;

pub use store::MemoryResponseCache;
