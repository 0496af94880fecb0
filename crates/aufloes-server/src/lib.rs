//! # aufloes-server
//!
//! The forwarding pipeline: a UDP listener that accepts downstream queries,
//! a [`Resolver`] that answers them from cache or upstream, and the
//! counters both of them report to.

pub mod listener;
pub mod metrics;
pub mod request;
pub mod resolver;

pub use listener::DnsServer;
pub use metrics::{MetricsSnapshot, ResolverMetrics};
pub use request::Request;
pub use resolver::{Resolver, ResolverOptions};
