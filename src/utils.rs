// src/utils.rs
use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

/// Sortable timestamp used in artifact file names, e.g. `20250620_153012_417`.
pub fn artifact_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S_%3f").to_string()
}

/// Truncate to at most `max_chars` characters, marking the cut with `…`.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Create `log_dir` if needed and open `file_name` in it, cleared.
///
/// Runs before the subscriber exists, so it must not log.
pub fn open_log_file(log_dir: &Path, file_name: &str) -> Result<(File, PathBuf)> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let path = log_dir.join(file_name);
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true) // Clear file on startup
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    Ok((file, path))
}
