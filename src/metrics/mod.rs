pub mod percentiles;
pub mod recorder;
pub mod window;

pub use percentiles::PercentileSet;
pub use recorder::{Recorder, Summary};
pub use window::{Window, WindowStats};

use prometheus::{IntCounter, IntGauge, Registry};

/// Process-wide instrumentation.
///
/// Built once at startup and handed by reference to whoever reports into
/// it; nothing is registered into a global default registry. The gauge
/// and counter are cheap clones sharing the registered atomics, so every
/// requester can carry its own copy.
pub struct ProbeMetrics {
    registry: Registry,

    /// In-flight request count across the whole pool. Incremented when a
    /// requester issues a request, decremented when the attempt completes,
    /// whatever the outcome.
    pub jobs_in_queue: IntGauge,

    /// Failed or timed-out attempts. The matching latency samples stay in
    /// the statistics; this only counts how many of them were errors.
    pub probe_errors: IntCounter,
}

impl ProbeMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let jobs_in_queue =
            IntGauge::new("jobs_in_queue", "Current number of jobs in the queue")?;
        let probe_errors = IntCounter::new(
            "probe_errors_total",
            "Total number of failed or timed-out probe requests",
        )?;

        registry.register(Box::new(jobs_in_queue.clone()))?;
        registry.register(Box::new(probe_errors.clone()))?;

        Ok(Self {
            registry,
            jobs_in_queue,
            probe_errors,
        })
    }

    /// The registry backing the `/metrics` exposition.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}
