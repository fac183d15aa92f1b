use std::time::Instant;

use hdrhistogram::Histogram;
use parking_lot::Mutex;
use serde::Serialize;

use super::percentiles::PercentileSet;

/// HdrHistogram range: 1 ns → 120 s, 3 significant figures
const HIST_LOW: u64 = 1;
const HIST_HIGH: u64 = 120_000_000_000;
const HIST_SIGFIG: u8 = 3;

/// Lifetime measurement store spanning every reporting period.
///
/// The aggregator records each drained sample; the exporter and the
/// end-of-run summary read snapshots. Each call takes one short-lived
/// lock.
pub struct Recorder {
    inner: Mutex<Inner>,
}

struct Inner {
    hist: Histogram<u64>,
    total_samples: u64,

    // Wall-clock anchor, set lazily on the first sample
    started: Option<Instant>,
}

/// Read-only view over everything recorded since startup.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub latency: PercentileSet,
    pub total_samples: u64,
    pub elapsed_secs: f64,
    pub samples_per_sec: f64,
}

impl Recorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                hist: Histogram::<u64>::new_with_bounds(HIST_LOW, HIST_HIGH, HIST_SIGFIG)
                    .expect("histogram creation"),
                total_samples: 0,
                started: None,
            }),
        }
    }

    /// Records one latency sample in nanoseconds. Values below 1 ns are
    /// clamped to the histogram floor; values beyond its ceiling are
    /// dropped from the distribution but still counted.
    pub fn record(&self, sample_ns: i64) {
        let mut inner = self.inner.lock();
        inner.started.get_or_insert_with(Instant::now);
        inner.total_samples += 1;
        let _ = inner.hist.record(sample_ns.max(1) as u64);
    }

    /// Produces a read-only snapshot of the lifetime distribution.
    pub fn snapshot(&self) -> Summary {
        let inner = self.inner.lock();

        let elapsed_secs = inner
            .started
            .map(|started| started.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        let samples_per_sec = if elapsed_secs > 0.0 {
            inner.total_samples as f64 / elapsed_secs
        } else {
            0.0
        };

        Summary {
            latency: PercentileSet::from_histogram(&inner.hist),
            total_samples: inner.total_samples,
            elapsed_secs,
            samples_per_sec,
        }
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}
