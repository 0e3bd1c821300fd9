//! Structured Logger
//!
//! Console output plus an optional daily-rolling NDJSON file, with the level
//! taken from `RUST_LOG` when set.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global subscriber.
///
/// `json` switches the console layer to JSON lines. When `log_dir` is set,
/// NDJSON is also written to `watchdog.YYYY-MM-DD.log` in that directory.
/// A second call is a no-op.
pub fn init_logger(level: &str, log_dir: Option<&Path>, json: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_layer = match log_dir {
        Some(dir) => {
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("watchdog")
                .filename_suffix("log")
                .build(dir)
                .with_context(|| format!("Failed to open log directory {}", dir.display()))?;
            Some(fmt::layer().json().with_writer(appender).with_ansi(false))
        }
        None => None,
    };

    let console_json = json.then(|| fmt::layer().json().with_writer(std::io::stdout));
    let console_plain = (!json).then(|| {
        fmt::layer()
            .with_writer(std::io::stdout)
            .with_target(false)
            .with_ansi(true)
    });

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_plain)
        .with(console_json)
        .with(file_layer)
        .try_init();
    Ok(())
}
