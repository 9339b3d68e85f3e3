//! Dependency resolution for discovered packages
//!
//! Computes the transitive closure of one package against a registry.
//! Version strings are never evaluated: any declared name that exists in the
//! registry satisfies the dependency.

use crate::domain::{DependencySet, PackageRegistry};
use crate::error::{GrindError, Result};

/// Resolve `name` and everything it transitively depends on
///
/// A package already in the set is not visited again, which is also what
/// stops the recursion on circular dependencies.
///
/// # Errors
///
/// `MissingPackage` if `name`, or any name declared on the way, is absent
/// from the registry.
pub fn resolve<'a>(registry: &'a PackageRegistry, name: &str) -> Result<DependencySet<'a>> {
    let mut set = DependencySet::new();
    collect(registry, name, None, &mut set)?;
    Ok(set)
}

fn collect<'a>(
    registry: &'a PackageRegistry,
    name: &str,
    required_by: Option<&str>,
    set: &mut DependencySet<'a>,
) -> Result<()> {
    if set.contains(name) {
        return Ok(());
    }
    let details = registry
        .get(name)
        .ok_or_else(|| GrindError::missing_package(name, required_by))?;
    set.insert(details);

    for dependency in details.manifest.dependencies.iter().flat_map(|d| d.keys()) {
        collect(registry, dependency, Some(name), set)?;
    }
    Ok(())
}
