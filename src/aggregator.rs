use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc::Receiver;
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::info;

use crate::metrics::{Recorder, Window, WindowStats};
use crate::requester::RequesterHandle;

const NANOS_PER_MILLI: i64 = 1_000_000;

/// Statistics printed for one reporting period, kept around for `/stats`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Report {
    pub max_ms: i64,
    pub p99_ms: i64,
    pub p95_ms: i64,
    pub avg_ms: i64,
    pub samples: usize,
    pub rate: u64,
}

impl Report {
    /// Millisecond and req/s figures use truncating integer division, the
    /// same arithmetic the console lines have always shown.
    fn new(stats: WindowStats, samples: usize, period: Duration) -> Self {
        Self {
            max_ms: stats.max / NANOS_PER_MILLI,
            p99_ms: stats.p99 / NANOS_PER_MILLI,
            p95_ms: stats.p95 / NANOS_PER_MILLI,
            avg_ms: stats.avg / NANOS_PER_MILLI,
            samples,
            rate: samples as u64 / period.as_secs().max(1),
        }
    }

    fn print(&self) {
        println!();
        println!("Statistics for the last period:");
        println!("{:>10}: {:>5}ms", "Max", self.max_ms);
        println!("{:>10}: {:>5}ms", "99pctile", self.p99_ms);
        println!("{:>10}: {:>5}ms", "95pctile", self.p95_ms);
        println!("{:>10}: {:>5}ms", "Average", self.avg_ms);
        println!("{:>10}: {:>5}req/s", "Rate", self.rate);
    }
}

/// Shared slot holding the most recent periodic report.
pub type LastReport = Arc<Mutex<Option<Report>>>;

/// The control loop of the pipeline: drains samples into the current
/// window, reports on a fixed cadence, and owns pool teardown.
pub struct Aggregator {
    rx: Receiver<i64>,
    pool: Vec<RequesterHandle>,
    recorder: Arc<Recorder>,
    last_report: LastReport,
    print_interval: Duration,
}

impl Aggregator {
    pub fn new(
        rx: Receiver<i64>,
        pool: Vec<RequesterHandle>,
        recorder: Arc<Recorder>,
        last_report: LastReport,
        print_interval: Duration,
    ) -> Self {
        Self {
            rx,
            pool,
            recorder,
            last_report,
            print_interval,
        }
    }

    /// Multiplexes over incoming samples, the report tick and the
    /// shutdown signal until the signal flips or every sender is gone,
    /// then tears the pool down.
    ///
    /// A sample only counts toward the period whose tick has not fired
    /// yet; late arrivals land in the next window.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = time::interval_at(
            time::Instant::now() + self.print_interval,
            self.print_interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut window = Window::new();

        loop {
            tokio::select! {
                received = self.rx.recv() => match received {
                    Some(sample_ns) => {
                        self.recorder.record(sample_ns);
                        window.append(sample_ns);
                    }
                    None => break,
                },
                _ = ticker.tick() => self.report(&mut window),
                _ = shutdown.changed() => break,
            }
        }

        self.shutdown().await;
    }

    fn report(&self, window: &mut Window) {
        if window.is_empty() {
            println!();
            println!("No result:");
            return;
        }

        let report = Report::new(window.stats(), window.len(), self.print_interval);
        report.print();
        *self.last_report.lock() = Some(report);
        window.reset();
    }

    /// Cooperative teardown: every requester observes its stop flag
    /// before the channel is closed and drained.
    async fn shutdown(mut self) {
        info!("stopping requesters");
        for handle in &self.pool {
            handle.requester.stop();
        }
        for handle in self.pool.drain(..) {
            let _ = handle.task.await;
        }

        // Whatever was still buffered belongs to the lifetime totals even
        // though no period will report it.
        self.rx.close();
        while let Ok(sample_ns) = self.rx.try_recv() {
            self.recorder.record(sample_ns);
        }
        info!("all requesters stopped");
    }
}
