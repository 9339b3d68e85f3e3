//! Publishing options
//!
//! `Options` is the explicit configuration consumed by the pipeline. The CLI
//! builds it from arguments; embedders can also deserialize it from JSON
//! (camelCase keys). `validate` must pass before any publishing starts.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{GrindError, Result};

/// Cache lifetime advertised for outputs of packages listed in `cache_package_names`
pub const HTTP_CACHE_CONTROL: &str = "max-age=2592000";

/// Options for one publishing run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Options {
    /// Root folders scanned for packages
    pub source_folders: Vec<PathBuf>,

    /// Output root for published artifacts
    pub dest_folder: PathBuf,

    /// jQuery sources copied next to the runtime and referenced by HTML loaders
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jquery_source_path: Option<PathBuf>,

    /// Reference every dependency's CSS from the HTML loaders
    #[serde(default)]
    pub inline_css: bool,

    /// Only bring this output-relative path up to date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only_path: Option<String>,

    /// Packages whose outputs may be cached by HTTP clients
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cache_package_names: Vec<String>,
}

impl Options {
    pub fn new(source_folders: Vec<PathBuf>, dest_folder: impl Into<PathBuf>) -> Self {
        Self {
            source_folders,
            dest_folder: dest_folder.into(),
            ..Self::default()
        }
    }

    /// Parse options from a JSON document and validate them
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json).map_err(|e| GrindError::InvalidOptions {
            message: e.to_string(),
        })?;
        options.validate()?;
        Ok(options)
    }

    /// Check the options before they reach the pipeline
    pub fn validate(&self) -> Result<()> {
        if self.source_folders.is_empty() {
            return Err(invalid("no source folder given"));
        }
        if self.dest_folder.as_os_str().is_empty() {
            return Err(invalid("no destination folder given"));
        }
        if let Some(src) = self
            .source_folders
            .iter()
            .find(|f| f.as_os_str().is_empty())
        {
            return Err(invalid(format!("empty source folder '{}'", src.display())));
        }
        if let Some(jquery) = &self.jquery_source_path {
            if jquery.file_name().is_none() {
                return Err(invalid(format!(
                    "jQuery path '{}' does not name a file",
                    jquery.display()
                )));
            }
        }
        if let Some(only) = &self.only_path {
            if !is_output_relative(only) {
                return Err(invalid(format!(
                    "'{only}' must be relative to the destination folder"
                )));
            }
        }
        Ok(())
    }

    /// File name of the jQuery copy in the output root
    pub fn jquery_file_name(&self) -> Option<String> {
        self.jquery_source_path
            .as_deref()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
    }

    /// Cache-Control value for a published output-relative path, if its package is cacheable
    pub fn http_cache_control(&self, relative_path: &str) -> Option<&'static str> {
        let relative_path = relative_path.trim_start_matches('/');
        self.cache_package_names
            .iter()
            .any(|name| {
                relative_path
                    .strip_prefix(name.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
            })
            .then_some(HTTP_CACHE_CONTROL)
    }
}

fn invalid(message: impl Into<String>) -> GrindError {
    GrindError::InvalidOptions {
        message: message.into(),
    }
}

fn is_output_relative(path: &str) -> bool {
    !path.is_empty()
        && Path::new(path)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Options {
        Options::new(vec![PathBuf::from("src")], "out")
    }

    #[test]
    fn test_validate_ok() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_validate_requires_source_folder() {
        let options = Options::new(Vec::new(), "out");
        assert!(matches!(
            options.validate(),
            Err(GrindError::InvalidOptions { .. })
        ));
    }

    #[test]
    fn test_validate_requires_destination() {
        let options = Options::new(vec![PathBuf::from("src")], "");
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_escaping_only_path() {
        let mut options = valid();
        options.only_path = Some("../etc/passwd".to_string());
        assert!(options.validate().is_err());

        options.only_path = Some("/abs/path".to_string());
        assert!(options.validate().is_err());

        options.only_path = Some("pkg/pkg.js".to_string());
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_from_json_camel_case() {
        let options = Options::from_json(
            r#"{
                "sourceFolders": ["a", "b"],
                "destFolder": "out",
                "jquerySourcePath": "vendor/jquery-1.7.js",
                "inlineCss": true,
                "cachePackageNames": ["widgets"]
            }"#,
        )
        .unwrap();
        assert_eq!(options.source_folders.len(), 2);
        assert!(options.inline_css);
        assert_eq!(options.jquery_file_name().as_deref(), Some("jquery-1.7.js"));
        assert!(options.only_path.is_none());
    }

    #[test]
    fn test_from_json_rejects_missing_fields() {
        assert!(Options::from_json(r#"{"destFolder": "out"}"#).is_err());
    }

    #[test]
    fn test_http_cache_control() {
        let mut options = valid();
        options.cache_package_names = vec!["widgets".to_string()];
        assert_eq!(
            options.http_cache_control("widgets/widgets.js"),
            Some(HTTP_CACHE_CONTROL)
        );
        assert_eq!(options.http_cache_control("/widgets/img/a.png"), Some(HTTP_CACHE_CONTROL));
        assert_eq!(options.http_cache_control("widgets.html"), None);
        assert_eq!(options.http_cache_control("widgetsx/a.js"), None);
        assert_eq!(options.http_cache_control("other/other.js"), None);
    }
}
