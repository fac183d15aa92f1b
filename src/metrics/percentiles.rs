use hdrhistogram::Histogram;
use serde::Serialize;

/// Percentile breakdown of the lifetime latency distribution, in
/// nanoseconds. Serialized straight into the `/stats` payload and read by
/// the end-of-run console summary.
#[derive(Debug, Clone, Serialize)]
pub struct PercentileSet {
    pub min_ns: u64,
    pub max_ns: u64,
    pub mean_ns: f64,
    pub p50_ns: u64,
    pub p95_ns: u64,
    pub p99_ns: u64,
    pub count: u64,
}

impl PercentileSet {
    /// Extracts a full percentile set from an HdrHistogram.
    /// Returns zeroed values while the histogram is still empty.
    pub fn from_histogram(hist: &Histogram<u64>) -> Self {
        if hist.len() == 0 {
            return Self::empty();
        }

        Self {
            min_ns: hist.min(),
            max_ns: hist.max(),
            mean_ns: hist.mean(),
            p50_ns: hist.value_at_percentile(50.0),
            p95_ns: hist.value_at_percentile(95.0),
            p99_ns: hist.value_at_percentile(99.0),
            count: hist.len(),
        }
    }

    /// All-zero placeholder used before any samples are recorded.
    pub fn empty() -> Self {
        Self {
            min_ns: 0,
            max_ns: 0,
            mean_ns: 0.0,
            p50_ns: 0,
            p95_ns: 0,
            p99_ns: 0,
            count: 0,
        }
    }

    /// Is this set backed by at least one observation?
    pub fn has_data(&self) -> bool {
        self.count > 0
    }
}
