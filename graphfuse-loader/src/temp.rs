//! Temp-file naming and best-effort cleanup helpers

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static SEQ: AtomicU64 = AtomicU64::new(0);

/// Generate a fresh temp-file path under `dir`
///
/// Names combine the process id with a process-wide counter, so
/// concurrent loaders in one process never collide.
pub(crate) fn fresh_path(dir: &Path, label: &str) -> PathBuf {
    let seq = SEQ.fetch_add(1, Ordering::Relaxed);
    dir.join(format!(
        "graphfuse-{label}-{pid}-{seq}.tmp",
        pid = std::process::id()
    ))
}

/// Delete a temp file, logging and swallowing failures
///
/// Cleanup must never mask the error that triggered it nor crash the
/// close path; a file already gone is not worth a log line.
pub(crate) fn remove_quietly(path: &Path, what: &str) {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to delete {what} temp file"
            );
        }
    }
}
