//! Source concatenation into one bundle per package
//!
//! Every JS source becomes one `module` wrapper; wrappers are written in walk
//! order and followed by the `trailer`, which names the main module and the
//! direct dependencies the runtime loader has to fetch.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use super::{Publisher, files};
use crate::bundle::{self, BundleTrailer, ModuleWrapper};
use crate::domain::{DependencySet, PackageDetails};
use crate::error::{GrindError, Result};
use crate::staleness;
use crate::templates::{MODULE_TEMPLATE, TRAILER_TEMPLATE, to_context};

/// `<dst>/<name>/<name>.js`
pub fn bundle_path(dest_folder: &Path, package: &str) -> PathBuf {
    dest_folder.join(package).join(format!("{package}.js"))
}

/// Main module path of a package
///
/// An explicit manifest `main` wins. Otherwise the JS files whose stem equals
/// the package name are candidates; the shortest module path wins and the
/// first one in walk order breaks ties.
pub fn main_module_path(details: &PackageDetails) -> Option<String> {
    if let Some(main) = &details.manifest.main {
        return Some(normalize_main(&details.name, main));
    }

    let mut best: Option<String> = None;
    for file in &details.js {
        if file.file_stem().and_then(|s| s.to_str()) != Some(details.name.as_str()) {
            continue;
        }
        let candidate = details.module_path(file);
        if best.as_ref().is_none_or(|b| candidate.len() < b.len()) {
            best = Some(candidate);
        }
    }
    best
}

/// Turn a manifest `main` entry into a module path
fn normalize_main(package: &str, main: &str) -> String {
    let mut path = main;
    while let Some(rest) = path.strip_prefix("./") {
        path = rest;
    }
    let path = path.trim_start_matches('/');
    let path = path.strip_suffix(".js").unwrap_or(path);
    if path.starts_with(&format!("{package}/")) {
        path.to_string()
    } else {
        format!("{package}/{path}")
    }
}

impl Publisher {
    /// Regenerate the package bundle if any source in the dependency set is newer
    pub(super) fn publish_bundle(
        &self,
        details: &PackageDetails,
        deps: &DependencySet<'_>,
    ) -> Result<Vec<PathBuf>> {
        let target = bundle_path(&self.options.dest_folder, &details.name);
        if !staleness::needs_rebuild(&target, staleness::bundle_reference(deps)) {
            tracing::debug!(package = %details.name, "bundle up to date");
            return Ok(Vec::new());
        }

        let dependencies = details.dependency_names();
        let wrappers = details
            .js
            .par_iter()
            .map(|file| self.render_module(details, file, &dependencies))
            .collect::<Result<Vec<_>>>()?;

        let trailer = BundleTrailer {
            package_name: details.name.clone(),
            main_module: main_module_path(details),
            dependencies,
        };
        let trailer = self
            .renderer
            .render(TRAILER_TEMPLATE, &to_context(TRAILER_TEMPLATE, &trailer)?)?;

        files::write_atomic_with(&target, |out| {
            for wrapper in &wrappers {
                out.write_all(wrapper.as_bytes())?;
            }
            out.write_all(trailer.as_bytes())
        })?;

        tracing::debug!(
            package = %details.name,
            modules = wrappers.len(),
            path = %target.display(),
            "wrote bundle"
        );
        Ok(vec![target])
    }

    fn render_module(
        &self,
        details: &PackageDetails,
        file: &Path,
        dependencies: &[String],
    ) -> Result<String> {
        let source = fs::read_to_string(file).map_err(|e| GrindError::read_failed(file, e))?;
        let wrapper = ModuleWrapper {
            package_name: details.name.clone(),
            module_path: details.module_path(file),
            dependencies: dependencies.to_vec(),
            code: bundle::indent(&source),
        };
        self.renderer
            .render(MODULE_TEMPLATE, &to_context(MODULE_TEMPLATE, &wrapper)?)
    }
}
