//! File operations for publishing
//!
//! This module handles:
//! - Directory creation
//! - Atomic file writes (temp file in the target directory, then rename)
//! - Copy-if-outdated for assets and shared files
//!
//! Several packages publish the same shared files concurrently, so every
//! write lands through a rename and readers never observe a partial file.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{GrindError, Result};
use crate::staleness;

/// Ensure a directory exists
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| GrindError::write_failed(path, e))
}

/// Ensure parent directory exists for a path
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) => ensure_dir(parent),
        None => Ok(()),
    }
}

/// Write a file through a buffered writer, replacing the target atomically
pub fn write_atomic_with<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> std::io::Result<()>,
{
    ensure_parent_dir(path)?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir).map_err(|e| GrindError::write_failed(path, e))?;

    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        fill(&mut writer).map_err(|e| GrindError::write_failed(path, e))?;
        writer.flush().map_err(|e| GrindError::write_failed(path, e))?;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))
            .map_err(|e| GrindError::write_failed(path, e))?;
    }

    temp.persist(path)
        .map_err(|e| GrindError::write_failed(path, e.error))?;
    Ok(())
}

/// Write a whole file atomically
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    write_atomic_with(path, |w| w.write_all(contents))
}

/// Copy `source` to `target` unless the target is at least as recent.
///
/// Returns `true` when a copy was made.
pub fn copy_if_outdated(source: &Path, target: &Path) -> Result<bool> {
    let source_mtime = fs::metadata(source)
        .and_then(|m| m.modified())
        .map_err(|e| GrindError::read_failed(source, e))?;
    if !staleness::needs_rebuild(target, source_mtime) {
        return Ok(false);
    }

    let contents = fs::read(source).map_err(|e| GrindError::read_failed(source, e))?;
    write_atomic(target, &contents)?;
    tracing::debug!(from = %source.display(), to = %target.display(), "copied");
    Ok(true)
}
