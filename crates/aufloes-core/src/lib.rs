//! # aufloes-core
//!
//! Core crate for aufloes. Contains the upstream and cache traits,
//! configuration schemas, DNS wire-format helpers, and the unified error
//! system.
//!
//! This crate has **no** internal dependencies on other aufloes crates.

pub mod config;
pub mod error;
pub mod proto;
pub mod result;
pub mod traits;

pub use error::AppError;
pub use result::AppResult;
