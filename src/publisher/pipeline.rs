//! Publishing entry points
//!
//! Discovery → Resolve → Publish, for every package, for one package and its
//! closure, or for whatever produces a single output-relative path.

use std::path::{Component, Path, PathBuf};

use rayon::prelude::*;

use super::{PublishReport, Publisher};
use crate::config::Options;
use crate::discovery;
use crate::domain::PackageRegistry;
use crate::error::{GrindError, Result};
use crate::resolver;

/// What has to be regenerated for an output-relative path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Everything published for a package (and its closure)
    Package(String),
    /// Top-level files shared by all packages
    Shared,
}

impl OutputTarget {
    /// Map a path relative to the output root to the work that produces it.
    ///
    /// `pkg/anything` and `pkg.html` belong to `pkg`; a bare name without an
    /// extension is a package name; any other top-level file is shared.
    pub fn from_relative(relative_path: &str) -> Result<Self> {
        let segments = normalize(relative_path)?;
        let Some(first) = segments.first() else {
            return Err(GrindError::InvalidOptions {
                message: "empty output path".to_string(),
            });
        };

        if segments.len() > 1 {
            return Ok(Self::Package(first.clone()));
        }
        if let Some(name) = first.strip_suffix(".html") {
            return Ok(Self::Package(name.to_string()));
        }
        if !first.contains('.') {
            return Ok(Self::Package(first.clone()));
        }
        Ok(Self::Shared)
    }
}

fn normalize(relative_path: &str) -> Result<Vec<String>> {
    let mut segments = Vec::new();
    for component in Path::new(relative_path).components() {
        match component {
            Component::Normal(s) => segments.push(s.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => {
                return Err(GrindError::InvalidOptions {
                    message: format!("'{relative_path}' must be relative to the destination folder"),
                });
            }
        }
    }
    Ok(segments)
}

impl Publisher {
    /// Discover packages in the configured source folders
    pub fn discover(&self) -> Result<PackageRegistry> {
        let registry = discovery::find_packages(&self.options.source_folders)?;
        tracing::debug!(packages = registry.len(), "discovered packages");
        Ok(registry)
    }

    /// Publish every package of the registry
    pub fn make_all(&self) -> Result<Vec<PublishReport>> {
        let registry = self.discover()?;
        let names: Vec<&String> = registry.names().collect();
        self.publish_each(&registry, &names)
    }

    /// Publish one package and every package it depends on
    pub fn make_package(&self, name: &str) -> Result<Vec<PublishReport>> {
        let registry = self.discover()?;
        let closure = resolver::resolve(&registry, name)?;
        let names: Vec<&String> = closure.names().collect();
        self.publish_each(&registry, &names)
    }

    /// Bring one output-relative path up to date.
    ///
    /// Returns the files written on the way.
    pub fn ensure_output(&self, relative_path: &str) -> Result<Vec<PathBuf>> {
        match OutputTarget::from_relative(relative_path)? {
            OutputTarget::Package(name) => Ok(self
                .make_package(&name)?
                .into_iter()
                .flat_map(|report| report.written)
                .collect()),
            OutputTarget::Shared => {
                super::files::ensure_dir(&self.options.dest_folder)?;
                self.publish_shared()
            }
        }
    }

    /// Publish every named package independently.
    ///
    /// A failing package does not stop its siblings; once all of them have
    /// run, the first error in name order is returned.
    fn publish_each(
        &self,
        registry: &PackageRegistry,
        names: &[&String],
    ) -> Result<Vec<PublishReport>> {
        let results: Vec<Result<PublishReport>> = names
            .par_iter()
            .map(|name| {
                let deps = resolver::resolve(registry, name)?;
                let details = deps
                    .get(name)
                    .ok_or_else(|| GrindError::missing_package(name.as_str(), None))?;
                self.publish(details, &deps)
            })
            .collect();

        let mut reports = Vec::with_capacity(results.len());
        let mut first_error = None;
        for (name, result) in names.iter().zip(results) {
            match result {
                Ok(report) => reports.push(report),
                Err(e) => {
                    tracing::warn!(package = %name, error = %e, "publish failed");
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(reports),
        }
    }
}

/// Publish every package found in `options.source_folders`
pub fn make_all(options: &Options) -> Result<Vec<PublishReport>> {
    Publisher::new(options.clone())?.make_all()
}

/// Publish `name` and its dependency closure
pub fn make_package(options: &Options, name: &str) -> Result<Vec<PublishReport>> {
    Publisher::new(options.clone())?.make_package(name)
}

/// Bring one output-relative path up to date
pub fn ensure_output(options: &Options, relative_path: &str) -> Result<Vec<PathBuf>> {
    Publisher::new(options.clone())?.ensure_output(relative_path)
}
