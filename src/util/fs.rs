//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::glob;

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Read a file to string, with nice error messages.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read file: {}", path.display()))
}

/// Write a string to a file, creating parent directories if needed.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write file: {}", path.display()))
}

/// Write `contents` unless the file already holds exactly those bytes.
///
/// Returns whether the file was written. An untouched file keeps its mtime,
/// so make doesn't consider anything downstream of it stale.
pub fn write_if_changed(path: &Path, contents: &str) -> Result<bool> {
    if let Ok(existing) = fs::read(path) {
        if existing == contents.as_bytes() {
            return Ok(false);
        }
    }
    write_string(path, contents)?;
    Ok(true)
}

/// Remove a file if it exists. Returns whether anything was removed.
pub fn remove_file_if_exists(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(path).with_context(|| format!("failed to remove file: {}", path.display()))?;
    Ok(true)
}

/// Whether `pattern` needs glob expansion.
pub fn is_glob(pattern: &str) -> bool {
    pattern.contains(&['*', '?', '['][..])
}

/// Find files matching a glob pattern relative to a base directory.
///
/// Matches are returned relative to `base`, sorted, with `/` separators.
pub fn glob_files(base: &Path, pattern: &str) -> Result<Vec<String>> {
    let full_pattern = base.join(pattern);
    let pattern_str = full_pattern.to_string_lossy();

    let mut results: Vec<PathBuf> = Vec::new();
    for entry in glob(&pattern_str).with_context(|| format!("invalid glob pattern: {}", pattern))? {
        match entry {
            Ok(path) => {
                if path.is_file() {
                    results.push(path);
                }
            }
            Err(e) => {
                tracing::warn!("glob error: {}", e);
            }
        }
    }

    results.sort();
    results.dedup();
    Ok(results
        .iter()
        .map(|p| {
            let rel = p.strip_prefix(base).unwrap_or(p);
            rel.to_string_lossy().replace('\\', "/")
        })
        .collect())
}

/// Canonicalize a path, but don't fail if it doesn't exist yet.
/// Returns the path as-is if canonicalization fails.
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}
