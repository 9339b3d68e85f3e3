//! Runtime module loader
//!
//! The native counterpart of the browser runtime written next to every
//! published tree. A [`Loader`] keeps the packages registered by evaluated
//! bundles, fetches missing bundles lazily through a [`BundleTransport`], and
//! instantiates modules inside [`ApplicationDomain`]s through [`Require`].
//!
//! Bundle bodies are JavaScript; a [`FactoryProvider`] maps every parsed
//! module to a native [`Factory`]. Loader state lives behind `Rc`/`RefCell`
//! and is single-threaded. No borrow is held while a factory, a transport or
//! a callback runs, so all of them may re-enter the loader.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::bundle::{self, ModuleSource};
use crate::error::{GrindError, Result};

mod load;
pub mod path;
mod require;

pub use load::{BundleTransport, FsTransport, LoadCallback, bundle_url};
pub use require::{ApplicationDomain, Module, Require};

/// A module's exports object, shared between its module record and the domain cache
pub type Exports = Rc<RefCell<Value>>;

/// Native implementation of one module
pub type Factory = Rc<dyn Fn(&Require, &Exports, &mut Module) -> Result<()>>;

/// Create a factory from a closure
pub fn factory<F>(f: F) -> Factory
where
    F: Fn(&Require, &Exports, &mut Module) -> Result<()> + 'static,
{
    Rc::new(f)
}

/// Fresh, empty exports object
pub fn new_exports() -> Exports {
    Rc::new(RefCell::new(Value::Object(serde_json::Map::new())))
}

/// Supplies native factories for modules found in fetched bundles
pub trait FactoryProvider {
    fn factory(&self, source: &ModuleSource) -> Option<Factory>;
}

impl<F> FactoryProvider for F
where
    F: Fn(&ModuleSource) -> Option<Factory>,
{
    fn factory(&self, source: &ModuleSource) -> Option<Factory> {
        self(source)
    }
}

/// Factories keyed by module path
#[derive(Default, Clone)]
pub struct NativeModules {
    factories: HashMap<String, Factory>,
}

impl NativeModules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, module_path: impl Into<String>, factory: Factory) -> Self {
        self.factories.insert(module_path.into(), factory);
        self
    }
}

impl FactoryProvider for NativeModules {
    fn factory(&self, source: &ModuleSource) -> Option<Factory> {
        self.factories.get(&source.module_path).cloned()
    }
}

#[derive(Default)]
enum LoadState {
    /// Modules registered outside of a load
    #[default]
    Registered,
    Loading(Vec<LoadCallback>),
    Loaded,
}

#[derive(Default)]
struct Package {
    files: IndexMap<String, Factory>,
    main_file: Option<String>,
    dependencies: Vec<String>,
    state: LoadState,
}

impl Package {
    /// First module whose first and last path segments are the package name
    fn infer_main(&self, name: &str) -> Option<String> {
        self.files
            .keys()
            .find(|id| {
                let mut segments = id.split('/');
                segments.next() == Some(name) && segments.next_back() == Some(name)
            })
            .cloned()
    }
}

struct Inner {
    packages: RefCell<HashMap<String, Package>>,
    transport: Box<dyn BundleTransport>,
    factories: Box<dyn FactoryProvider>,
}

/// Registry of runtime packages
///
/// Cloning a loader yields another handle to the same registry. Independent
/// loaders share nothing.
#[derive(Clone)]
pub struct Loader {
    inner: Rc<Inner>,
}

impl Loader {
    pub fn new(
        transport: impl BundleTransport + 'static,
        factories: impl FactoryProvider + 'static,
    ) -> Self {
        Self {
            inner: Rc::new(Inner {
                packages: RefCell::new(HashMap::new()),
                transport: Box::new(transport),
                factories: Box::new(factories),
            }),
        }
    }

    /// Register one module of a package, the call every bundle wrapper makes
    pub fn register_module(
        &self,
        package: &str,
        module_path: &str,
        dependencies: &[String],
        factory: Factory,
    ) {
        let mut packages = self.inner.packages.borrow_mut();
        let record = packages.entry(package.to_string()).or_default();
        record.files.insert(module_path.to_string(), factory);
        record.dependencies = dependencies.to_vec();
        if record.main_file.is_none() {
            record.main_file = record.infer_main(package);
        }
    }

    /// Declare a package's main module and dependencies, the call every bundle trailer makes
    pub fn define_package(&self, package: &str, main_module: Option<&str>, dependencies: &[String]) {
        let mut packages = self.inner.packages.borrow_mut();
        let record = packages.entry(package.to_string()).or_default();
        if let Some(main) = main_module {
            record.main_file = Some(main.to_string());
        }
        record.dependencies = dependencies.to_vec();
    }

    /// Parse bundle text and register everything it declares
    ///
    /// Modules without a native factory are still registered; requiring one
    /// fails with [`GrindError::Factory`].
    pub fn evaluate_bundle(&self, text: &str) -> Result<()> {
        let parsed = bundle::parse(text)?;
        for source in &parsed.modules {
            let factory = self
                .inner
                .factories
                .factory(source)
                .unwrap_or_else(|| missing_factory(&source.module_path));
            self.register_module(
                &source.package_name,
                &source.module_path,
                &source.dependencies,
                factory,
            );
        }
        if let Some(trailer) = &parsed.trailer {
            self.define_package(
                &trailer.package_name,
                trailer.main_module.as_deref(),
                &trailer.dependencies,
            );
        }
        Ok(())
    }

    /// A require function bound to `current_dir`, in a fresh application domain
    pub fn make_require(&self, current_dir: &str) -> Require {
        Require::new(self.clone(), current_dir)
    }

    /// Load `name` if needed, then require its main module in a fresh domain
    pub fn start(&self, name: &str, callback: impl FnOnce(Result<Exports>) + 'static) {
        let loader = self.clone();
        let package = name.to_string();
        self.load_package(name, move |result| {
            callback(result.and_then(|()| loader.make_require("").require(&package)));
        });
    }

    pub fn is_registered(&self, package: &str) -> bool {
        self.inner.packages.borrow().contains_key(package)
    }

    pub fn is_loaded(&self, package: &str) -> bool {
        matches!(
            self.inner.packages.borrow().get(package),
            Some(Package {
                state: LoadState::Loaded,
                ..
            })
        )
    }

    pub fn main_file(&self, package: &str) -> Option<String> {
        self.inner
            .packages
            .borrow()
            .get(package)
            .and_then(|p| p.main_file.clone())
    }

    pub fn dependencies(&self, package: &str) -> Vec<String> {
        self.inner
            .packages
            .borrow()
            .get(package)
            .map(|p| p.dependencies.clone())
            .unwrap_or_default()
    }

    fn factory_for(&self, id: &str) -> Result<Factory> {
        let package = path::package_of(id);
        let packages = self.inner.packages.borrow();
        let record = packages
            .get(package)
            .ok_or_else(|| GrindError::UnavailablePackage {
                name: package.to_string(),
            })?;
        record
            .files
            .get(id)
            .cloned()
            .ok_or_else(|| GrindError::UnavailableModule {
                package: package.to_string(),
                path: id.to_string(),
            })
    }
}

fn missing_factory(module_path: &str) -> Factory {
    let id = module_path.to_string();
    factory(move |_, _, _| {
        Err(GrindError::Factory {
            id: id.clone(),
            message: "no native implementation".to_string(),
        })
    })
}
