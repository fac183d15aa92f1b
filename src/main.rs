use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use latency_probe::aggregator::Aggregator;
use latency_probe::config::Config;
use latency_probe::exporter::{self, ExporterState};
use latency_probe::metrics::{ProbeMetrics, Recorder, Summary};
use latency_probe::requester::Requester;

/// Capacity of the sample channel. A full buffer drops, never blocks.
const SAMPLE_CHANNEL_CAPACITY: usize = 1024;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse_or_exit();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!();
    println!("╔══════════════════════════════════════════════════╗");
    println!("║   LATENCY PROBE :: timed HTTP cadence tester     ║");
    println!("╚══════════════════════════════════════════════════╝");
    println!();

    let url: reqwest::Url = config.url.parse().context("invalid target URL")?;

    // ── Shared instrumentation ──────────────────────────────────
    let metrics = ProbeMetrics::new().context("build metrics registry")?;
    let recorder = Arc::new(Recorder::new());
    let last_report = Arc::new(Mutex::new(None));

    // ── Metrics exporter ────────────────────────────────────────
    let exporter_state = Arc::new(ExporterState {
        registry: metrics.registry().clone(),
        recorder: Arc::clone(&recorder),
        last_report: Arc::clone(&last_report),
    });
    tokio::spawn(async move {
        let app = exporter::router(exporter_state);
        if let Err(err) = exporter::serve(exporter::METRICS_ADDR, app).await {
            error!(%err, "metrics exporter failed");
            process::exit(1);
        }
    });

    // ── Requester pool ──────────────────────────────────────────
    let client = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()
        .context("build HTTP client")?;

    let (tx, rx) = mpsc::channel(SAMPLE_CHANNEL_CAPACITY);

    info!(
        concurrency = config.concurrency,
        interval_us = config.interval,
        url = %url,
        "preparing requesters"
    );
    let pool: Vec<_> = (0..config.concurrency)
        .map(|_| {
            Requester::new(
                url.clone(),
                config.request_interval(),
                client.clone(),
                tx.clone(),
                metrics.jobs_in_queue.clone(),
                metrics.probe_errors.clone(),
            )
            .spawn()
        })
        .collect();
    // The pool now holds the only senders.
    drop(tx);

    // ── Shutdown signal ─────────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    // ── Record & report ─────────────────────────────────────────
    info!("recording");
    let aggregator = Aggregator::new(
        rx,
        pool,
        Arc::clone(&recorder),
        last_report,
        config.report_interval(),
    );
    aggregator.run(shutdown_rx).await;

    print_summary(&recorder.snapshot());
    Ok(())
}

/// Completes on SIGINT or, on unix, SIGTERM.
#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        Err(err) => {
            error!(%err, "cannot listen for SIGTERM, falling back to ctrl-c only");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

/// End-of-run totals over every sample of the whole session.
fn print_summary(summary: &Summary) {
    if !summary.latency.has_data() {
        println!();
        println!("No samples were recorded.");
        return;
    }

    const NANOS_PER_MILLI: u64 = 1_000_000;

    println!();
    println!("Totals for this run:");
    println!("{:>10}: {:>5}", "Samples", summary.total_samples);
    println!(
        "{:>10}: {:>5}ms",
        "Max",
        summary.latency.max_ns / NANOS_PER_MILLI
    );
    println!(
        "{:>10}: {:>5}ms",
        "99pctile",
        summary.latency.p99_ns / NANOS_PER_MILLI
    );
    println!(
        "{:>10}: {:>5}ms",
        "95pctile",
        summary.latency.p95_ns / NANOS_PER_MILLI
    );
    println!(
        "{:>10}: {:>5}ms",
        "Median",
        summary.latency.p50_ns / NANOS_PER_MILLI
    );
    println!("{:>10}: {:>5.0}req/s", "Rate", summary.samples_per_sec);
}
