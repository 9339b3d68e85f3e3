//! Staleness checks for published artifacts
//!
//! An artifact needs rebuilding when it is missing or when its modification
//! time is strictly older than a reference time. The reference for a bundle is
//! the most recent JS source or manifest across the package's dependency set;
//! the HTML loader additionally considers CSS assets when they are inlined.
//!
//! Nothing here writes to disk.

use std::fs;
use std::path::Path;
use std::time::SystemTime;

use crate::domain::DependencySet;

/// Modification time of a file, or `None` if it cannot be read
pub fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// True if `artifact` is missing or older than `reference`
pub fn needs_rebuild(artifact: &Path, reference: SystemTime) -> bool {
    match modified(artifact) {
        Some(mtime) => mtime < reference,
        None => true,
    }
}

/// Latest of the given times, or the epoch when there are none
pub fn most_recent(times: impl IntoIterator<Item = SystemTime>) -> SystemTime {
    times
        .into_iter()
        .max()
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

/// Reference time for a package bundle
pub fn bundle_reference(deps: &DependencySet<'_>) -> SystemTime {
    most_recent(deps.iter().map(|d| d.most_recent))
}

/// Reference time for a package's HTML loader
pub fn html_reference(deps: &DependencySet<'_>, inline_css: bool) -> SystemTime {
    let bundle = bundle_reference(deps);
    if !inline_css {
        return bundle;
    }
    let css = most_recent(
        deps.iter()
            .flat_map(|d| d.css_assets().filter_map(move |p| d.mtime(p))),
    );
    bundle.max(css)
}
