//! Artifact publishing for Grindstone packages
//!
//! This module handles:
//! - Source concatenation into one bundle per package
//! - Asset mirroring into the output tree
//! - Standalone HTML loader pages
//! - The shared runtime support file and optional jQuery copy
//!
//! Every artifact is regenerated only when the staleness oracle says so, which
//! makes a second run over an unchanged tree write nothing.

use std::path::PathBuf;

use crate::config::Options;
use crate::domain::{DependencySet, PackageDetails};
use crate::error::Result;
use crate::templates::{BuiltinTemplates, Renderer};

mod assets;
mod bundle;
pub mod files;
mod html;
pub mod pipeline;

pub use assets::{RUNTIME_FILE, RUNTIME_SOURCE};
pub use bundle::{bundle_path, main_module_path};
pub use html::html_path;
pub use pipeline::{OutputTarget, ensure_output, make_all, make_package};

/// Files written while publishing one package
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub package: String,
    pub written: Vec<PathBuf>,
}

impl PublishReport {
    pub fn is_up_to_date(&self) -> bool {
        self.written.is_empty()
    }
}

/// Publishes packages into `options.dest_folder`
pub struct Publisher {
    options: Options,
    renderer: Box<dyn Renderer>,
}

impl Publisher {
    /// Create a publisher using the built-in templates
    pub fn new(options: Options) -> Result<Self> {
        Self::with_renderer(options, Box::new(BuiltinTemplates))
    }

    pub fn with_renderer(options: Options, renderer: Box<dyn Renderer>) -> Result<Self> {
        options.validate()?;
        Ok(Self { options, renderer })
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Bring every artifact of one package up to date.
    ///
    /// `deps` must be the dependency set of `details`. The four sub-steps run
    /// concurrently; all of them run to completion and the first error in
    /// step order is returned. Files already written are left in place.
    pub fn publish(
        &self,
        details: &PackageDetails,
        deps: &DependencySet<'_>,
    ) -> Result<PublishReport> {
        files::ensure_dir(&self.options.dest_folder.join(&details.name))?;

        let ((bundle, assets), (html, shared)) = rayon::join(
            || {
                rayon::join(
                    || self.publish_bundle(details, deps),
                    || self.publish_assets(details),
                )
            },
            || {
                rayon::join(
                    || self.publish_html(details, deps),
                    || self.publish_shared(),
                )
            },
        );

        let mut written = Vec::new();
        for step in [bundle, assets, html, shared] {
            written.extend(step?);
        }

        if written.is_empty() {
            tracing::debug!(package = %details.name, "up to date");
        } else {
            tracing::info!(package = %details.name, files = written.len(), "published");
        }

        Ok(PublishReport {
            package: details.name.clone(),
            written,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery;
    use crate::error::GrindError;
    use crate::resolver;
    use serde_json::Value;
    use std::fs;
    use tempfile::TempDir;

    struct FailingRenderer;

    impl Renderer for FailingRenderer {
        fn render(&self, name: &str, _context: &Value) -> Result<String> {
            Err(GrindError::Render {
                template: name.to_string(),
                reason: "boom".to_string(),
            })
        }
    }

    fn write(path: PathBuf, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn fixture() -> (TempDir, Options) {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        write(
            src.join("app/package.json"),
            r#"{"name": "app", "dependencies": {"lib": "*"}}"#,
        );
        write(src.join("app/app.js"), "exports.run = 1;");
        write(src.join("app/style.css"), "body {}");
        write(src.join("lib/package.json"), r#"{"name": "lib"}"#);
        write(src.join("lib/lib.js"), "exports.lib = 1;");
        let options = Options::new(vec![src], temp.path().join("out"));
        (temp, options)
    }

    #[test]
    fn test_publish_writes_all_artifacts() {
        let (_temp, options) = fixture();
        let registry = discovery::find_packages(&options.source_folders).unwrap();
        let deps = resolver::resolve(&registry, "app").unwrap();
        let publisher = Publisher::new(options.clone()).unwrap();

        let report = publisher.publish(registry.get("app").unwrap(), &deps).unwrap();
        let dst = &options.dest_folder;
        assert!(report.written.contains(&dst.join("app/app.js")));
        assert!(report.written.contains(&dst.join("app/style.css")));
        assert!(report.written.contains(&dst.join("app.html")));
        assert!(report.written.contains(&dst.join(RUNTIME_FILE)));
        assert!(report.written.contains(&dst.join("app/package.json")));

        let again = publisher.publish(registry.get("app").unwrap(), &deps).unwrap();
        assert!(again.is_up_to_date());
    }

    #[test]
    fn test_render_failure_is_reported() {
        let (_temp, options) = fixture();
        let registry = discovery::find_packages(&options.source_folders).unwrap();
        let deps = resolver::resolve(&registry, "lib").unwrap();
        let publisher = Publisher::with_renderer(options, Box::new(FailingRenderer)).unwrap();

        let err = publisher
            .publish(registry.get("lib").unwrap(), &deps)
            .unwrap_err();
        assert!(matches!(err, GrindError::Render { .. }));
    }

    #[test]
    fn test_new_validates_options() {
        let options = Options::new(Vec::new(), "out");
        assert!(matches!(
            Publisher::new(options),
            Err(GrindError::InvalidOptions { .. })
        ));
    }
}
