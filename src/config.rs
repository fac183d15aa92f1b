use std::time::Duration;

use clap::error::ErrorKind;
use clap::Parser;

/// Runtime configuration, read once at startup and never mutated.
///
/// Every option can also be supplied through the environment variable
/// named next to it; a command-line flag wins over the environment.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "latency-probe",
    version,
    about = "Fires timed HTTP GETs at a URL from a pool of workers and \
             reports latency percentiles"
)]
pub struct Config {
    /// URL to connect to
    #[arg(short, long, env = "URL")]
    pub url: String,

    /// Number of parallel requesters
    #[arg(
        short,
        long,
        env = "CONCURRENCY",
        default_value_t = 25,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub concurrency: u32,

    /// Interval between two requests of one requester, in microseconds
    #[arg(short, long, env = "INTERVAL", default_value_t = 100_000)]
    pub interval: u64,

    /// Timeout for requests, in milliseconds
    #[arg(short, long, env = "TIMEOUT", default_value_t = 500)]
    pub timeout: u64,

    /// Interval between two statistics prints, in seconds
    #[arg(short, long, env = "PRINTINTERVAL", default_value_t = 30)]
    pub print_interval: u64,
}

impl Config {
    /// Parses the command line, exiting the process on anything that is
    /// not a valid configuration: 0 after printing help or the version,
    /// 1 for malformed or missing options.
    pub fn parse_or_exit() -> Self {
        match Self::try_parse() {
            Ok(config) => config,
            Err(err) => {
                let code = match err.kind() {
                    ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                    _ => 1,
                };
                let _ = err.print();
                std::process::exit(code);
            }
        }
    }

    /// Time between two successive requests of a single requester.
    pub fn request_interval(&self) -> Duration {
        Duration::from_micros(self.interval)
    }

    /// Per-request timeout, covering connect through body completion.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }

    /// Cadence of the printed statistics reports.
    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.print_interval)
    }
}
