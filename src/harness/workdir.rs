//! Working directory maintenance.

use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, warn};

/// Remove `dir` and everything under it. A missing directory is not an error.
///
/// With `force`, removal errors are logged and swallowed.
pub fn cleanup(dir: &Path, force: bool) -> io::Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    match fs::remove_dir_all(dir) {
        Ok(()) => {
            debug!(path = %dir.display(), "cleaned up working directory");
            Ok(())
        }
        Err(e) if force => {
            warn!(path = %dir.display(), error = %e, "failed to clean up");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Human-readable byte count with two decimals, e.g. `1.50 MB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    for unit in UNITS {
        if size < 1024.0 {
            return format!("{:.2} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.2} PB", size)
}
