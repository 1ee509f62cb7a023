use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use log::LevelFilter;
use tracker_engine::{ClientSettings, DEFAULT_BASE_URL};
use tracker_logging::{LogDestination, LogSettings, DEFAULT_LOG_FILE};

/// Start extraction tasks and follow their progress.
#[derive(Debug, Parser)]
#[command(name = "tracker", version)]
pub struct Cli {
    /// Root of the extraction API.
    #[arg(long, env = "TRACKER_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Delay between status checks while a task is pending.
    #[arg(
        long,
        env = "TRACKER_POLL_INTERVAL_MS",
        default_value_t = 1000,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub poll_interval_ms: u64,

    /// Upper bound for a single request; an expired request ends its watch.
    #[arg(long, env = "TRACKER_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    #[arg(long, env = "TRACKER_CONNECT_TIMEOUT_SECS", default_value_t = 10)]
    pub connect_timeout_secs: u64,

    /// Log destination: file, terminal or both.
    #[arg(long, env = "TRACKER_LOG", default_value = "file")]
    pub log: LogDestination,

    #[arg(long, env = "TRACKER_LOG_FILE", default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    #[arg(long, env = "TRACKER_LOG_LEVEL", default_value = "info")]
    pub log_level: LevelFilter,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub client: ClientSettings,
    pub poll_interval: Duration,
    pub logging: LogSettings,
}

impl Cli {
    pub fn config(&self) -> AppConfig {
        AppConfig {
            client: ClientSettings {
                base_url: self.base_url.clone(),
                connect_timeout: Duration::from_secs(self.connect_timeout_secs),
                request_timeout: Duration::from_secs(self.request_timeout_secs),
            },
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            logging: LogSettings {
                destination: self.log,
                level: self.log_level,
                file_path: self.log_file.clone(),
            },
        }
    }
}
