//! Error types and handling for Grindstone
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! Publishing errors (discovery, manifests, missing packages, file I/O) and
//! runtime loader errors (unavailable packages or modules, failed loads) share
//! one enum. Every field is an owned string so the error is `Clone`: a failed
//! bundle load is delivered to every caller waiting on that package.

use std::path::Path;

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for Grindstone operations
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum GrindError {
    // Discovery errors
    #[error("Cannot read '{path}': {reason}")]
    #[diagnostic(
        code(grindstone::discovery::unreadable),
        help("Check that the source folder exists and is readable")
    )]
    Discovery { path: String, reason: String },

    #[error("Failed to parse manifest: {path}")]
    #[diagnostic(
        code(grindstone::discovery::manifest),
        help("A package.json must be a JSON object with optional 'name', 'main' and 'dependencies'")
    )]
    ManifestParse { path: String, reason: String },

    // Dependency errors
    #[error("Missing package '{name}'{}", required_by_suffix(.required_by))]
    #[diagnostic(
        code(grindstone::deps::missing_package),
        help("Add a folder containing this package to the source folders")
    )]
    MissingPackage {
        name: String,
        required_by: Option<String>,
    },

    // File system errors
    #[error("Failed to read file: {path}")]
    #[diagnostic(code(grindstone::fs::read_failed))]
    FileReadFailed { path: String, reason: String },

    #[error("Failed to write file: {path}")]
    #[diagnostic(code(grindstone::fs::write_failed))]
    FileWriteFailed { path: String, reason: String },

    // Publishing errors
    #[error("Failed to render template '{template}': {reason}")]
    #[diagnostic(code(grindstone::publish::render))]
    Render { template: String, reason: String },

    // Configuration errors
    #[error("Invalid options: {message}")]
    #[diagnostic(
        code(grindstone::config::invalid),
        help("Provide at least one source folder followed by a destination folder")
    )]
    InvalidOptions { message: String },

    // Runtime loader errors
    #[error("Unavailable package {name}")]
    #[diagnostic(code(grindstone::runtime::unavailable_package))]
    UnavailablePackage { name: String },

    #[error("Unavailable module {path} in package {package}")]
    #[diagnostic(code(grindstone::runtime::unavailable_module))]
    UnavailableModule { package: String, path: String },

    #[error("Could not load {package}: {reason}")]
    #[diagnostic(code(grindstone::runtime::load))]
    Load { package: String, reason: String },

    #[error("Malformed bundle at line {line}: {reason}")]
    #[diagnostic(code(grindstone::runtime::bundle_parse))]
    BundleParse { line: usize, reason: String },

    #[error("Module {id} failed: {message}")]
    #[diagnostic(code(grindstone::runtime::factory))]
    Factory { id: String, message: String },
}

impl GrindError {
    pub fn discovery(path: &Path, err: impl std::fmt::Display) -> Self {
        GrindError::Discovery {
            path: path.display().to_string(),
            reason: err.to_string(),
        }
    }

    pub fn read_failed(path: &Path, err: impl std::fmt::Display) -> Self {
        GrindError::FileReadFailed {
            path: path.display().to_string(),
            reason: err.to_string(),
        }
    }

    pub fn write_failed(path: &Path, err: impl std::fmt::Display) -> Self {
        GrindError::FileWriteFailed {
            path: path.display().to_string(),
            reason: err.to_string(),
        }
    }

    pub fn missing_package(name: impl Into<String>, required_by: Option<&str>) -> Self {
        GrindError::MissingPackage {
            name: name.into(),
            required_by: required_by.map(str::to_string),
        }
    }

    pub fn load(package: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        GrindError::Load {
            package: package.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<walkdir::Error> for GrindError {
    fn from(err: walkdir::Error) -> Self {
        let path = err
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        GrindError::Discovery {
            path,
            reason: err.to_string(),
        }
    }
}

fn required_by_suffix(required_by: &Option<String>) -> String {
    required_by
        .as_ref()
        .map(|r| format!(" (required by '{r}')"))
        .unwrap_or_default()
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, GrindError>;
