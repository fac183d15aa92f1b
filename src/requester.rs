use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use prometheus::{IntCounter, IntGauge};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::Sender;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

/// One logical concurrent probe.
///
/// `run` issues a GET against the target once per interval and publishes
/// the measured round-trip time, in nanoseconds, onto the shared sample
/// channel. `stop` asks the loop to exit after its current iteration.
pub struct Requester {
    url: reqwest::Url,
    interval: Duration,
    client: reqwest::Client,
    tx: Sender<i64>,
    jobs_in_queue: IntGauge,
    probe_errors: IntCounter,
    stopped: AtomicBool,
    stop_wakeup: Notify,
}

/// A spawned requester together with its task handle.
pub struct RequesterHandle {
    pub requester: Arc<Requester>,
    pub task: JoinHandle<()>,
}

impl Requester {
    /// The client carries the per-request timeout; share one clone across
    /// the whole pool.
    pub fn new(
        url: reqwest::Url,
        interval: Duration,
        client: reqwest::Client,
        tx: Sender<i64>,
        jobs_in_queue: IntGauge,
        probe_errors: IntCounter,
    ) -> Arc<Self> {
        Arc::new(Self {
            url,
            interval,
            client,
            tx,
            jobs_in_queue,
            probe_errors,
            stopped: AtomicBool::new(false),
            stop_wakeup: Notify::new(),
        })
    }

    /// Spawns `run` on the runtime and hands back the task handle.
    pub fn spawn(self: Arc<Self>) -> RequesterHandle {
        let requester = Arc::clone(&self);
        let task = tokio::spawn(async move { requester.run().await });
        RequesterHandle {
            requester: self,
            task,
        }
    }

    /// Waits out one interval per iteration, probes, repeats until
    /// stopped. A probe outlasting the interval skips ticks instead of
    /// bursting, like a wall-clock ticker.
    pub async fn run(&self) {
        let mut ticker = time::interval_at(time::Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            if self.stopped.load(Ordering::SeqCst) {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.stop_wakeup.notified() => break,
            }

            self.probe_once().await;
        }
    }

    /// Signals the running loop to exit after its current iteration.
    /// Idempotent and safe to call before `run` has started. An in-flight
    /// request is left to finish or time out on its own.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.stop_wakeup.notify_one();
    }

    /// One timed attempt. Success or failure, exactly one sample equal to
    /// the measured elapsed time is produced.
    async fn probe_once(&self) {
        self.jobs_in_queue.inc();
        let started = Instant::now();
        let outcome = self.fetch().await;
        let elapsed_ns = started.elapsed().as_nanos() as i64;
        self.jobs_in_queue.dec();

        if let Err(err) = outcome {
            self.probe_errors.inc();
            debug!(url = %self.url, %err, "probe failed");
        }

        match self.tx.try_send(elapsed_ns) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                // Consumer is behind: the sample is dropped so the cadence
                // never stalls on a full channel.
                debug!(url = %self.url, "sample channel full, dropping measurement");
            }
            Err(TrySendError::Closed(_)) => {}
        }
    }

    async fn fetch(&self) -> reqwest::Result<()> {
        let response = self.client.get(self.url.clone()).send().await?;
        // Drain the body so the measurement spans the full response.
        response.bytes().await?;
        Ok(())
    }
}
