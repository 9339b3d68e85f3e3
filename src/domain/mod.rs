//! Domain models for Grindstone
//!
//! Plain data shared by discovery, resolution and publishing.

pub mod package;

pub use package::{
    DependencySet, MANIFEST_FILE, PackageDetails, PackageManifest, PackageRegistry,
};
