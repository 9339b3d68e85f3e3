//! Package discovery in source folders
//!
//! This module handles:
//! - Walking source roots for `package.json` manifests
//! - Parsing each manifest and scanning its directory
//! - Classifying files as JS sources, assets or ignored
//! - Merging everything into one `PackageRegistry`
//!
//! Roots, and the manifests inside one root, are processed in parallel. Walks
//! are sorted by file name and results are merged in root order, so the
//! registry and every file list are identical from run to run.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use rayon::prelude::*;
use walkdir::{DirEntry, WalkDir};

use crate::domain::{MANIFEST_FILE, PackageDetails, PackageManifest, PackageRegistry};
use crate::error::{GrindError, Result};

/// Extensions of files copied verbatim into the published package
pub const ASSET_EXTENSIONS: &[&str] = &["jpg", "png", "gif", "html", "json", "css", "vis"];

/// What a package file is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    JsSource,
    Asset,
    Ignored,
}

/// Classify a file by its extension
pub fn classify(path: &Path) -> FileKind {
    match path.extension().and_then(|e| e.to_str()) {
        Some("js") => FileKind::JsSource,
        Some(ext) if ASSET_EXTENSIONS.contains(&ext) => FileKind::Asset,
        _ => FileKind::Ignored,
    }
}

/// Find every package under the given roots
///
/// When two manifests declare the same package name, the first one found (in
/// root order, then walk order) is kept and the other is skipped with a
/// warning.
pub fn find_packages(roots: &[PathBuf]) -> Result<PackageRegistry> {
    let per_root = roots
        .par_iter()
        .map(|root| find_packages_in_root(root))
        .collect::<Result<Vec<_>>>()?;

    let registry: PackageRegistry = per_root.into_iter().flatten().collect();
    tracing::debug!(packages = registry.len(), "discovery finished");
    Ok(registry)
}

/// Find all packages below one root, in walk order
fn find_packages_in_root(root: &Path) -> Result<Vec<PackageDetails>> {
    let manifests = find_manifests(root)?;
    manifests
        .par_iter()
        .map(|manifest| load_package_details(manifest))
        .collect()
}

fn find_manifests(root: &Path) -> Result<Vec<PathBuf>> {
    let mut manifests = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && entry.file_name() == MANIFEST_FILE {
            manifests.push(entry.into_path());
        }
    }
    Ok(manifests)
}

/// Parse one manifest and scan the directory that holds it
pub fn load_package_details(manifest_path: &Path) -> Result<PackageDetails> {
    let text = fs::read_to_string(manifest_path).map_err(|e| GrindError::discovery(manifest_path, e))?;
    let manifest = PackageManifest::from_json(&text).map_err(|e| GrindError::ManifestParse {
        path: manifest_path.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut details = PackageDetails::new(manifest, manifest_path.to_path_buf());
    let manifest_mtime = fs::metadata(manifest_path)
        .and_then(|m| m.modified())
        .map_err(|e| GrindError::discovery(manifest_path, e))?;
    details.add_manifest_mtime(manifest_mtime);

    scan_package_files(&mut details)?;

    tracing::debug!(
        package = %details.name,
        js = details.js.len(),
        assets = details.assets.len(),
        "scanned package"
    );
    Ok(details)
}

fn scan_package_files(details: &mut PackageDetails) -> Result<()> {
    for entry in WalkDir::new(&details.root)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        match classify(entry.path()) {
            FileKind::JsSource => {
                let mtime = modified(&entry)?;
                details.add_js(entry.into_path(), mtime);
            }
            FileKind::Asset => {
                let mtime = modified(&entry)?;
                details.add_asset(entry.into_path(), mtime);
            }
            FileKind::Ignored => {}
        }
    }
    Ok(())
}

fn modified(entry: &DirEntry) -> Result<SystemTime> {
    entry
        .metadata()
        .map_err(GrindError::from)?
        .modified()
        .map_err(|e| GrindError::discovery(entry.path(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(base: &Path, rel: &str, content: &str) {
        let path = base.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(Path::new("a/b.js")), FileKind::JsSource);
        assert_eq!(classify(Path::new("a/b.css")), FileKind::Asset);
        assert_eq!(classify(Path::new("a/package.json")), FileKind::Asset);
        assert_eq!(classify(Path::new("a/b.vis")), FileKind::Asset);
        assert_eq!(classify(Path::new("a/README.md")), FileKind::Ignored);
        assert_eq!(classify(Path::new("a/Makefile")), FileKind::Ignored);
    }

    #[test]
    fn test_find_packages_scans_nested_files() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "pkg/package.json", r#"{"name": "pkg"}"#);
        write(temp.path(), "pkg/pkg.js", "exports.a = 1;");
        write(temp.path(), "pkg/lib/util.js", "exports.b = 2;");
        write(temp.path(), "pkg/img/logo.png", "png");
        write(temp.path(), "pkg/notes.txt", "ignored");

        let registry = find_packages(&[temp.path().to_path_buf()]).unwrap();
        let pkg = registry.get("pkg").unwrap();

        let js: Vec<String> = pkg.js.iter().map(|p| pkg.relative_path(p)).collect();
        assert_eq!(js, vec!["lib/util.js", "pkg.js"]);
        let assets: Vec<String> = pkg.assets.iter().map(|p| pkg.relative_path(p)).collect();
        assert_eq!(assets, vec!["img/logo.png", "package.json"]);
        assert!(pkg.mtime(&pkg.manifest_path).is_some());
    }

    #[test]
    fn test_name_defaults_to_directory() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "nameless/package.json", "{}");
        let registry = find_packages(&[temp.path().to_path_buf()]).unwrap();
        assert!(registry.contains("nameless"));
    }

    #[test]
    fn test_multiple_roots_first_wins() {
        let one = TempDir::new().unwrap();
        let two = TempDir::new().unwrap();
        write(one.path(), "a/package.json", r#"{"name": "dup"}"#);
        write(two.path(), "b/package.json", r#"{"name": "dup"}"#);
        write(two.path(), "c/package.json", r#"{"name": "other"}"#);

        let registry =
            find_packages(&[one.path().to_path_buf(), two.path().to_path_buf()]).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("dup").unwrap().root, one.path().join("a"));
    }

    #[test]
    fn test_malformed_manifest_aborts() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "good/package.json", r#"{"name": "good"}"#);
        write(temp.path(), "bad/package.json", "{ not json");
        let err = find_packages(&[temp.path().to_path_buf()]).unwrap_err();
        assert!(matches!(err, GrindError::ManifestParse { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_package_dir_is_found() {
        let temp = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        write(outside.path(), "linked/package.json", r#"{"name": "linked"}"#);
        write(outside.path(), "linked/linked.js", "exports.a = 1;");
        fs::create_dir_all(temp.path().join("src")).unwrap();
        std::os::unix::fs::symlink(outside.path().join("linked"), temp.path().join("src/linked"))
            .unwrap();

        let registry = find_packages(&[temp.path().join("src")]).unwrap();
        let linked = registry.get("linked").unwrap();
        assert_eq!(linked.js.len(), 1);
        assert_eq!(linked.module_path(&linked.js[0]), "linked/linked");
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_source_file_is_scanned() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "pkg/package.json", r#"{"name": "pkg"}"#);
        write(temp.path(), "pkg/pkg.js", "exports.a = 1;");
        write(temp.path(), "shared/helper.js", "exports.h = 1;");
        std::os::unix::fs::symlink(
            temp.path().join("shared/helper.js"),
            temp.path().join("pkg/helper.js"),
        )
        .unwrap();

        let registry = find_packages(&[temp.path().join("pkg")]).unwrap();
        let pkg = registry.get("pkg").unwrap();
        let js: Vec<String> = pkg.js.iter().map(|p| pkg.relative_path(p)).collect();
        assert_eq!(js, vec!["helper.js", "pkg.js"]);
    }

    #[test]
    fn test_missing_root_is_discovery_error() {
        let temp = TempDir::new().unwrap();
        let err = find_packages(&[temp.path().join("missing")]).unwrap_err();
        assert!(matches!(err, GrindError::Discovery { .. }));
    }
}
