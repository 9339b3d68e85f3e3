//! Grindstone - incremental static bundler
//!
//! Discovers packages (directories holding a `package.json`) in a set of
//! source folders, resolves their dependency closures, and publishes
//! self-registering bundles, mirrored assets and HTML loaders into an output
//! folder. Only stale artifacts are regenerated.
//!
//! The [`runtime`] module is the matching loader: it fetches bundles lazily,
//! deduplicates concurrent loads, and instantiates modules inside isolated
//! application domains.

pub mod bundle;
pub mod config;
pub mod discovery;
pub mod domain;
pub mod error;
pub mod logging;
pub mod publisher;
pub mod resolver;
pub mod runtime;
pub mod staleness;
pub mod templates;

pub use config::Options;
pub use domain::{DependencySet, PackageDetails, PackageManifest, PackageRegistry};
pub use error::{GrindError, Result};
pub use publisher::{PublishReport, Publisher, ensure_output, make_all, make_package};
