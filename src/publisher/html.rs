//! Standalone HTML loader page per package

use std::path::{Path, PathBuf};

use super::assets::RUNTIME_FILE;
use super::{Publisher, files};
use crate::domain::{DependencySet, PackageDetails};
use crate::error::Result;
use crate::staleness;
use crate::templates::{LOADER_TEMPLATE, LoaderPage, to_context};

/// `<dst>/<name>.html`
pub fn html_path(dest_folder: &Path, package: &str) -> PathBuf {
    dest_folder.join(format!("{package}.html"))
}

impl Publisher {
    pub(super) fn publish_html(
        &self,
        details: &PackageDetails,
        deps: &DependencySet<'_>,
    ) -> Result<Vec<PathBuf>> {
        let target = html_path(&self.options.dest_folder, &details.name);
        let reference = staleness::html_reference(deps, self.options.inline_css);
        if !staleness::needs_rebuild(&target, reference) {
            tracing::debug!(package = %details.name, "html loader up to date");
            return Ok(Vec::new());
        }

        let page = self.loader_page(details, deps);
        let html = self
            .renderer
            .render(LOADER_TEMPLATE, &to_context(LOADER_TEMPLATE, &page)?)?;
        files::write_atomic(&target, html.as_bytes())?;

        tracing::debug!(package = %details.name, path = %target.display(), "wrote html loader");
        Ok(vec![target])
    }

    fn loader_page(&self, details: &PackageDetails, deps: &DependencySet<'_>) -> LoaderPage {
        let bundles = deps.names().map(|d| format!("{d}/{d}.js")).collect();
        let css = if self.options.inline_css {
            deps.iter()
                .flat_map(|d| d.css_assets().map(move |p| d.published_path(p)))
                .collect()
        } else {
            Vec::new()
        };
        LoaderPage {
            main: details.name.clone(),
            runtime: RUNTIME_FILE.to_string(),
            jquery: self.options.jquery_file_name(),
            bundles,
            css,
        }
    }
}
