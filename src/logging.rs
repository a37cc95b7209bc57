//! Process-wide tracing setup.
//!
//! Called once from the CLI after the configuration is loaded. Everything else in
//! the crate only emits events and spans.

use std::fs::{self, OpenOptions};
use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingSettings;

const DEFAULT_LEVEL: &str = "info";

/// Filter precedence: `RUST_LOG`, then `--verbose`, then `logging.level`, then `info`.
pub fn build_filter(settings: &LoggingSettings, verbose: bool) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    configured_filter(settings, verbose)
}

/// [`build_filter`] without the `RUST_LOG` override.
fn configured_filter(settings: &LoggingSettings, verbose: bool) -> EnvFilter {
    let level = if verbose {
        "debug".to_string()
    } else {
        settings
            .level
            .as_deref()
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| DEFAULT_LEVEL.to_string())
    };
    EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
}

/// Install the global subscriber: stderr always, plus `logging.file` when set.
///
/// A second call is a no-op. Failing to open the log file is reported on stderr and
/// logging continues without it.
pub fn init(settings: &LoggingSettings, verbose: bool) {
    let file_layer = settings.file.as_ref().and_then(|path| {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Arc::new(file)),
            ),
            Err(e) => {
                eprintln!("warning: cannot open log file {}: {}", path.display(), e);
                None
            }
        }
    });

    let _ = tracing_subscriber::registry()
        .with(build_filter(settings, verbose))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .try_init();
}
