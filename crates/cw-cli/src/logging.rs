//! Log subscriber setup
//!
//! Library crates log through the `log` facade; records are bridged into a
//! tracing subscriber with a console layer and, for pipeline runs, a per-run
//! file layer.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Install the global subscriber.
///
/// The console shows warnings unless `-v` or `RUST_LOG` asks for more; the
/// log file, when given, always records at least `info`.
pub fn init(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let console_filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into())
    };
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_filter);

    let file = match log_file {
        Some(path) => Some(open_log_file(path)?),
        None => None,
    };
    let file_layer = file.map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .with_filter(EnvFilter::new(if verbose { "debug" } else { "info" }))
    });

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .try_init()
        .context("Failed to install log subscriber")?;
    Ok(())
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }
    File::create(path).with_context(|| format!("Failed to create log file {}", path.display()))
}
