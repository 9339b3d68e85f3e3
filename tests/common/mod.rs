//! Common test utilities for Grindstone integration tests

use std::fs::File;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use grindstone::Options;
use tempfile::TempDir;

/// A source tree and an output folder inside one temporary directory
#[allow(dead_code)]
pub struct TestWorkspace {
    /// Temporary directory
    #[allow(dead_code)]
    pub temp: TempDir,
    /// Path to workspace root
    pub path: PathBuf,
}

#[allow(dead_code)]
impl TestWorkspace {
    /// Create a new test workspace
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().to_path_buf();
        Self { temp, path }
    }

    /// Write a file in workspace
    pub fn write_file(&self, path: &str, content: &str) {
        let file_path = self.path.join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
    }

    /// Read a file from workspace
    pub fn read_file(&self, path: &str) -> String {
        let file_path = self.path.join(path);
        std::fs::read_to_string(&file_path).expect("Failed to read file")
    }

    /// Check if a file exists in workspace
    pub fn file_exists(&self, path: &str) -> bool {
        self.path.join(path).exists()
    }

    /// Create a package under `src/<name>` with a main module and optional dependencies
    pub fn create_package(&self, name: &str, deps: &[&str]) {
        let deps = deps
            .iter()
            .map(|d| format!("\"{d}\": \"*\""))
            .collect::<Vec<_>>()
            .join(", ");
        self.write_file(
            &format!("src/{name}/package.json"),
            &format!("{{\"name\": \"{name}\", \"dependencies\": {{{deps}}}}}"),
        );
        self.write_file(
            &format!("src/{name}/{name}.js"),
            &format!("exports.name = \"{name}\";\n"),
        );
    }

    /// Move a file's mtime `secs` seconds into the future
    pub fn touch(&self, path: &str, secs: u64) {
        let file = File::options()
            .write(true)
            .open(self.path.join(path))
            .expect("Failed to open file");
        file.set_modified(SystemTime::now() + Duration::from_secs(secs))
            .expect("Failed to set mtime");
    }

    /// Options publishing `src` into `out`
    pub fn options(&self) -> Options {
        Options::new(vec![self.path.join("src")], self.path.join("out"))
    }

    /// Absolute path of an output-relative file
    pub fn out(&self, path: &str) -> PathBuf {
        self.path.join("out").join(path)
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_file_operations() {
        let workspace = TestWorkspace::new();
        workspace.write_file("test/file.txt", "hello");
        assert!(workspace.file_exists("test/file.txt"));
        assert_eq!(workspace.read_file("test/file.txt"), "hello");
    }

    #[test]
    fn test_create_package_writes_manifest() {
        let workspace = TestWorkspace::new();
        workspace.create_package("app", &["lib", "ui"]);
        let manifest = workspace.read_file("src/app/package.json");
        assert!(manifest.contains("\"lib\": \"*\""));
        assert!(workspace.file_exists("src/app/app.js"));
    }
}
