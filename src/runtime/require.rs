//! Module instantiation inside application domains

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::{Exports, Loader, new_exports, path};
use crate::error::Result;

/// Module instances of one top-level require tree
///
/// Every module is instantiated at most once per domain. Separate domains
/// get separate instances of the same module.
#[derive(Default)]
pub struct ApplicationDomain {
    modules: HashMap<String, Exports>,
    main: Option<String>,
}

impl ApplicationDomain {
    /// Id of the first module instantiated in this domain
    pub fn main(&self) -> Option<&str> {
        self.main.as_deref()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// The record handed to a factory
///
/// Assigning a new value to `exports` replaces what later requires receive.
pub struct Module {
    pub id: String,
    pub exports: Exports,
}

/// A require function bound to a domain and a directory
#[derive(Clone)]
pub struct Require {
    loader: Loader,
    domain: Rc<RefCell<ApplicationDomain>>,
    current_dir: String,
}

impl Require {
    pub(super) fn new(loader: Loader, current_dir: &str) -> Self {
        Self {
            loader,
            domain: Rc::new(RefCell::new(ApplicationDomain::default())),
            current_dir: current_dir.to_string(),
        }
    }

    pub fn current_dir(&self) -> &str {
        &self.current_dir
    }

    /// Id of the domain's entry point module
    pub fn main(&self) -> Option<String> {
        self.domain.borrow().main().map(str::to_string)
    }

    pub fn domain(&self) -> Rc<RefCell<ApplicationDomain>> {
        Rc::clone(&self.domain)
    }

    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    /// Instantiate (or fetch from the domain cache) the module named `name`.
    ///
    /// A bare package name stands for that package's main module. The module
    /// is cached before its factory runs, so a require cycle receives the
    /// partially filled exports instead of recursing.
    pub fn require(&self, name: &str) -> Result<Exports> {
        let target = if name.contains('/') {
            None
        } else {
            self.loader.main_file(name)
        };
        let id = path::resolve(target.as_deref().unwrap_or(name), &self.current_dir);

        if let Some(exports) = self.domain.borrow().modules.get(&id) {
            return Ok(Rc::clone(exports));
        }

        let factory = self.loader.factory_for(&id)?;
        let exports = new_exports();
        {
            let mut domain = self.domain.borrow_mut();
            domain.modules.insert(id.clone(), Rc::clone(&exports));
            if domain.main.is_none() {
                domain.main = Some(id.clone());
            }
        }

        let mut module = Module {
            id: id.clone(),
            exports: Rc::clone(&exports),
        };
        let nested = Require {
            loader: self.loader.clone(),
            domain: Rc::clone(&self.domain),
            current_dir: path::dirname(&id).to_string(),
        };
        tracing::trace!(module = %id, "instantiating");
        factory(&nested, &exports, &mut module)?;

        if !Rc::ptr_eq(&module.exports, &exports) {
            self.domain
                .borrow_mut()
                .modules
                .insert(id, Rc::clone(&module.exports));
        }
        Ok(module.exports)
    }
}
