//! Concurrent HTTP latency probe.
//!
//! A pool of requester tasks issues GETs against a target URL at a fixed
//! cadence and publishes each round-trip time, in nanoseconds, onto a
//! bounded channel. A single aggregator loop drains the channel into a
//! per-period measurement window and prints summary statistics once per
//! reporting interval, while an HTTP endpoint exposes live gauges for
//! external scraping.

pub mod aggregator;
pub mod config;
pub mod exporter;
pub mod metrics;
pub mod requester;

pub use aggregator::{Aggregator, Report};
pub use config::Config;
pub use metrics::ProbeMetrics;
pub use requester::Requester;
