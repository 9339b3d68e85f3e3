//! Asset mirroring and the shared files of the output root

use std::fs;
use std::path::PathBuf;

use super::{Publisher, files};
use crate::domain::PackageDetails;
use crate::error::Result;

/// Name of the runtime support file in the output root
pub const RUNTIME_FILE: &str = "grindstone.js";

/// Browser implementation of the runtime loader
pub const RUNTIME_SOURCE: &str = include_str!("../runtime/grindstone.js");

impl Publisher {
    /// Mirror every asset into `<dst>/<name>/`, copying only outdated ones
    pub(super) fn publish_assets(&self, details: &PackageDetails) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for asset in &details.assets {
            let target = self
                .options
                .dest_folder
                .join(&details.name)
                .join(details.relative_path(asset));
            if files::copy_if_outdated(asset, &target)? {
                written.push(target);
            }
        }
        Ok(written)
    }

    /// Runtime support file plus the optional jQuery copy
    pub(super) fn publish_shared(&self) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();

        let runtime = self.options.dest_folder.join(RUNTIME_FILE);
        let current = fs::read(&runtime).ok();
        if current.as_deref() != Some(RUNTIME_SOURCE.as_bytes()) {
            files::write_atomic(&runtime, RUNTIME_SOURCE.as_bytes())?;
            tracing::debug!(path = %runtime.display(), "wrote runtime support file");
            written.push(runtime);
        }

        if let (Some(source), Some(name)) = (
            self.options.jquery_source_path.as_ref(),
            self.options.jquery_file_name(),
        ) {
            let target = self.options.dest_folder.join(name);
            if files::copy_if_outdated(source, &target)? {
                written.push(target);
            }
        }

        Ok(written)
    }
}
