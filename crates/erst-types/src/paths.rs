//! Filesystem helpers for artifacts written by the CLI and caches.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};

/// Default cache root: `$XDG_CACHE_HOME/erst` (or platform equivalent),
/// falling back to `./.erst-cache`.
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|d| d.join("erst"))
        .unwrap_or_else(|| PathBuf::from(".erst-cache"))
}

/// Ensure parent directories exist for a file path.
pub fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                anyhow!("Failed to create directory {}: {}", parent.display(), e)
            })?;
        }
    }
    Ok(())
}

/// Write a file atomically (temp file in the same directory, then rename).
pub fn atomic_write(path: &Path, contents: &[u8]) -> Result<()> {
    ensure_parent_dirs(path)?;
    let tmp_path = path.with_extension(format!(
        "{}.tmp",
        path.extension().and_then(|s| s.to_str()).unwrap_or("out")
    ));
    std::fs::write(&tmp_path, contents)
        .map_err(|e| anyhow!("Failed to write temp file {}: {}", tmp_path.display(), e))?;
    std::fs::rename(&tmp_path, path).map_err(|e| {
        anyhow!(
            "Failed to rename {} to {}: {}",
            tmp_path.display(),
            path.display(),
            e
        )
    })?;
    Ok(())
}

/// Write pretty-printed JSON atomically.
pub fn atomic_write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value)
        .map_err(|e| anyhow!("Failed to serialize JSON: {}", e))?;
    atomic_write(path, &json)
}
