use std::fs::{File, OpenOptions};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_ENV: &str = "PV_LOG";
const DEFAULT_FILTER: &str = "pv=info";

pub fn log_file(name: &str) -> Result<File> {
    let dir = crate::pv_io::log_dir()?;
    let path = dir.join(name);
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file: {}", path.display()))
}

/// Route tracing output to `~/.pv/logs/pv.log`, or to stderr at `warn` when
/// the log file is unavailable. Stdout stays reserved for command output.
pub fn init() {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    match log_file("pv.log") {
        Ok(file) => {
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .try_init();
        }
        Err(err) => {
            let _ = tracing_subscriber::registry()
                .with(EnvFilter::new("pv=warn"))
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .try_init();
            tracing::warn!("file logging disabled: {err:#}");
        }
    }
}
