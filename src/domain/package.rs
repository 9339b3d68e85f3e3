//! Package domain types
//!
//! Contains the manifest, the per-package scan results and the registry that
//! discovery builds.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Manifest file name that marks a package directory
pub const MANIFEST_FILE: &str = "package.json";

/// Parsed `package.json`
///
/// Only the fields the bundler uses are read; everything else is ignored.
/// Version strings are kept for reference and never evaluated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<IndexMap<String, String>>,
}

impl PackageManifest {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Declared dependency names, in declaration order
    pub fn dependency_names(&self) -> Vec<String> {
        self.dependencies
            .as_ref()
            .map(|deps| deps.keys().cloned().collect())
            .unwrap_or_default()
    }
}

/// A package found on disk: its manifest plus everything the scan collected
#[derive(Debug, Clone)]
pub struct PackageDetails {
    /// Package name (manifest `name`, else the directory name)
    pub name: String,

    pub manifest: PackageManifest,

    pub manifest_path: PathBuf,

    /// Directory holding the manifest; all relative paths start here
    pub root: PathBuf,

    /// JS sources in walk order
    pub js: Vec<PathBuf>,

    /// Copied assets in walk order
    pub assets: Vec<PathBuf>,

    /// Modification time of every classified file and of the manifest
    pub mtimes: HashMap<PathBuf, SystemTime>,

    /// Most recent mtime among JS sources and the manifest
    pub most_recent: SystemTime,
}

impl PackageDetails {
    pub fn new(manifest: PackageManifest, manifest_path: PathBuf) -> Self {
        let root = manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let name = manifest.name.clone().unwrap_or_else(|| {
            root.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        });
        Self {
            name,
            manifest,
            manifest_path,
            root,
            js: Vec::new(),
            assets: Vec::new(),
            mtimes: HashMap::new(),
            most_recent: SystemTime::UNIX_EPOCH,
        }
    }

    /// Record the manifest's own mtime (it counts towards `most_recent`)
    pub fn add_manifest_mtime(&mut self, mtime: SystemTime) {
        self.mtimes.insert(self.manifest_path.clone(), mtime);
        self.bump(mtime);
    }

    pub fn add_js(&mut self, path: PathBuf, mtime: SystemTime) {
        self.mtimes.insert(path.clone(), mtime);
        self.js.push(path);
        self.bump(mtime);
    }

    pub fn add_asset(&mut self, path: PathBuf, mtime: SystemTime) {
        self.mtimes.insert(path.clone(), mtime);
        self.assets.push(path);
    }

    fn bump(&mut self, mtime: SystemTime) {
        if mtime > self.most_recent {
            self.most_recent = mtime;
        }
    }

    pub fn dependency_names(&self) -> Vec<String> {
        self.manifest.dependency_names()
    }

    pub fn mtime(&self, path: &Path) -> Option<SystemTime> {
        self.mtimes.get(path).copied()
    }

    /// Path of a package file relative to the package root, with `/` separators
    pub fn relative_path(&self, file: &Path) -> String {
        let relative = file.strip_prefix(&self.root).unwrap_or(file);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Module path of a JS source: `<name>/<relative path without .js>`
    pub fn module_path(&self, file: &Path) -> String {
        let relative = self.relative_path(file);
        let relative = relative.strip_suffix(".js").unwrap_or(&relative);
        format!("{}/{}", self.name, relative)
    }

    /// Output-relative path of a package file: `<name>/<relative path>`
    pub fn published_path(&self, file: &Path) -> String {
        format!("{}/{}", self.name, self.relative_path(file))
    }

    pub fn css_assets(&self) -> impl Iterator<Item = &PathBuf> {
        self.assets
            .iter()
            .filter(|p| p.extension().is_some_and(|e| e == "css"))
    }
}

/// All packages found by one discovery run, keyed by name
#[derive(Debug, Clone, Default)]
pub struct PackageRegistry {
    packages: BTreeMap<String, PackageDetails>,
}

impl PackageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a package unless its name is taken.
    ///
    /// The first package registered under a name is kept; the rejected one is
    /// handed back so the caller can report the collision.
    pub fn insert(&mut self, details: PackageDetails) -> std::result::Result<(), PackageDetails> {
        if self.packages.contains_key(&details.name) {
            return Err(details);
        }
        self.packages.insert(details.name.clone(), details);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&PackageDetails> {
        self.packages.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.packages.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PackageDetails> {
        self.packages.values()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

/// Collects in order; a repeated name warns and keeps the first one
impl FromIterator<PackageDetails> for PackageRegistry {
    fn from_iter<T: IntoIterator<Item = PackageDetails>>(iter: T) -> Self {
        let mut registry = Self::new();
        for details in iter {
            if let Err(rejected) = registry.insert(details) {
                let kept = registry
                    .get(&rejected.name)
                    .map(|d| d.manifest_path.display().to_string())
                    .unwrap_or_default();
                tracing::warn!(
                    package = %rejected.name,
                    kept = %kept,
                    skipped = %rejected.manifest_path.display(),
                    "duplicate package name, keeping the first one found"
                );
            }
        }
        registry
    }
}

/// The transitive closure of one package within a registry
///
/// Insertion ordered: the requested package first, then its dependencies
/// depth-first in declaration order.
#[derive(Debug, Clone)]
pub struct DependencySet<'a> {
    packages: IndexMap<String, &'a PackageDetails>,
}

impl<'a> DependencySet<'a> {
    pub(crate) fn new() -> Self {
        Self {
            packages: IndexMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, details: &'a PackageDetails) {
        self.packages.insert(details.name.clone(), details);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&'a PackageDetails> {
        self.packages.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.packages.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a PackageDetails> + '_ {
        self.packages.values().copied()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn details(name: Option<&str>, dir: &str) -> PackageDetails {
        let manifest = PackageManifest {
            name: name.map(str::to_string),
            ..PackageManifest::default()
        };
        PackageDetails::new(manifest, PathBuf::from(dir).join(MANIFEST_FILE))
    }

    #[test]
    fn test_manifest_parsing_keeps_dependency_order() {
        let manifest = PackageManifest::from_json(
            r#"{"name": "app", "version": "1.0.0", "dependencies": {"zeta": "*", "alpha": ">=2"}}"#,
        )
        .unwrap();
        assert_eq!(manifest.name.as_deref(), Some("app"));
        assert_eq!(manifest.dependency_names(), vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_manifest_without_fields() {
        let manifest = PackageManifest::from_json("{}").unwrap();
        assert!(manifest.name.is_none());
        assert!(manifest.dependency_names().is_empty());
    }

    #[test]
    fn test_name_falls_back_to_directory() {
        assert_eq!(details(None, "/src/widgets").name, "widgets");
        assert_eq!(details(Some("named"), "/src/widgets").name, "named");
    }

    #[test]
    fn test_module_and_published_paths() {
        let d = details(Some("pkg"), "/src/pkg");
        assert_eq!(d.module_path(Path::new("/src/pkg/lib/util.js")), "pkg/lib/util");
        assert_eq!(d.module_path(Path::new("/src/pkg/pkg.js")), "pkg/pkg");
        assert_eq!(
            d.published_path(Path::new("/src/pkg/img/logo.png")),
            "pkg/img/logo.png"
        );
    }

    #[test]
    fn test_most_recent_ignores_assets() {
        let mut d = details(Some("pkg"), "/src/pkg");
        let base = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);
        d.add_manifest_mtime(base);
        d.add_js(PathBuf::from("/src/pkg/a.js"), base + Duration::from_secs(5));
        d.add_asset(
            PathBuf::from("/src/pkg/a.css"),
            base + Duration::from_secs(50),
        );
        assert_eq!(d.most_recent, base + Duration::from_secs(5));
        assert_eq!(d.css_assets().count(), 1);
    }

    #[test]
    fn test_registry_first_wins() {
        let mut registry = PackageRegistry::new();
        assert!(registry.insert(details(Some("a"), "/one/a")).is_ok());
        let rejected = registry.insert(details(Some("a"), "/two/a")).unwrap_err();
        assert_eq!(rejected.root, PathBuf::from("/two/a"));
        assert_eq!(registry.get("a").unwrap().root, PathBuf::from("/one/a"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_collected_registry_keeps_first_duplicate() {
        let registry: PackageRegistry = [
            details(Some("a"), "/one/a"),
            details(Some("b"), "/one/b"),
            details(Some("a"), "/two/a"),
        ]
        .into_iter()
        .collect();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("a").unwrap().root, PathBuf::from("/one/a"));
    }
}
