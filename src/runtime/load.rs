//! Lazy bundle loading
//!
//! Loading a package fetches `<name>/<name>.js` once, evaluates it, then loads
//! every dependency the bundle declares before reporting success. Concurrent
//! requests for a package that is still loading subscribe to the pending load.
//! A package whose bundle was evaluated up front counts as loaded. A failed load is reported to every subscriber and evicts the package, so a
//! later request starts over.

use std::cell::Cell;
use std::fs;
use std::future::Future;
use std::mem;
use std::path::PathBuf;
use std::rc::Rc;

use futures::channel::oneshot;

use super::{LoadState, Loader, Package};
use crate::error::{GrindError, Result};

/// Completion callback of a package load
pub type LoadCallback = Box<dyn FnOnce(Result<()>)>;

/// Fetches bundle text by output-relative URL
///
/// `done` may run before `fetch` returns or at any later point.
pub trait BundleTransport {
    fn fetch(&self, url: &str, done: Box<dyn FnOnce(Result<String>)>);
}

/// Serves bundles from a published output folder
#[derive(Debug, Clone)]
pub struct FsTransport {
    root: PathBuf,
}

impl FsTransport {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl BundleTransport for FsTransport {
    fn fetch(&self, url: &str, done: Box<dyn FnOnce(Result<String>)>) {
        let path = self.root.join(url);
        done(fs::read_to_string(&path).map_err(|e| GrindError::read_failed(&path, e)));
    }
}

/// Output-relative URL of a package bundle
pub fn bundle_url(package: &str) -> String {
    format!("{package}/{package}.js")
}

enum Start {
    Ready(LoadCallback),
    Subscribed,
    Fetch,
}

impl Loader {
    /// Make `name` and everything it depends on available, then call `callback`
    pub fn load_package(&self, name: &str, callback: impl FnOnce(Result<()>) + 'static) {
        let start = {
            let mut packages = self.inner.packages.borrow_mut();
            match packages.get_mut(name) {
                Some(Package {
                    state: LoadState::Loading(subscribers),
                    ..
                }) => {
                    subscribers.push(Box::new(callback));
                    Start::Subscribed
                }
                Some(Package {
                    state: LoadState::Loaded,
                    ..
                }) => Start::Ready(Box::new(callback)),
                Some(record) => {
                    // bundle evaluated up front; its page already carries the
                    // dependency bundles
                    record.state = LoadState::Loaded;
                    Start::Ready(Box::new(callback))
                }
                None => {
                    let record = Package {
                        state: LoadState::Loading(vec![Box::new(callback)]),
                        ..Package::default()
                    };
                    packages.insert(name.to_string(), record);
                    Start::Fetch
                }
            }
        };

        match start {
            Start::Ready(callback) => callback(Ok(())),
            Start::Subscribed => tracing::trace!(package = name, "joined pending load"),
            Start::Fetch => self.fetch(name),
        }
    }

    /// Future flavour of [`Loader::load_package`]
    pub fn load_package_async(&self, name: &str) -> impl Future<Output = Result<()>> + 'static {
        let (tx, rx) = oneshot::channel();
        self.load_package(name, move |result| {
            let _ = tx.send(result);
        });
        let package = name.to_string();
        async move {
            rx.await
                .unwrap_or_else(|_| Err(GrindError::load(package, "loader dropped the request")))
        }
    }

    fn fetch(&self, name: &str) {
        let url = bundle_url(name);
        tracing::debug!(package = name, url = %url, "fetching bundle");

        let loader = self.clone();
        let package = name.to_string();
        self.inner.transport.fetch(
            &url,
            Box::new(move |result| {
                match result.and_then(|text| loader.evaluate_bundle(&text)) {
                    Ok(()) => loader.load_dependencies(&package),
                    Err(e) => {
                        let err = GrindError::load(&package, e);
                        loader.finish(&package, Err(err));
                    }
                }
            }),
        );
    }

    fn load_dependencies(&self, name: &str) {
        let dependencies = self.dependencies(name);
        if dependencies.is_empty() {
            return self.finish(name, Ok(()));
        }

        let pending = Rc::new(Cell::new(dependencies.len()));
        let failed = Rc::new(Cell::new(false));
        for dependency in dependencies {
            let loader = self.clone();
            let package = name.to_string();
            let pending = Rc::clone(&pending);
            let failed = Rc::clone(&failed);
            self.load_package(&dependency, move |result| {
                if failed.get() {
                    return;
                }
                match result {
                    Err(e) => {
                        failed.set(true);
                        loader.finish(&package, Err(e));
                    }
                    Ok(()) => {
                        pending.set(pending.get() - 1);
                        if pending.get() == 0 {
                            loader.finish(&package, Ok(()));
                        }
                    }
                }
            });
        }
    }

    /// Settle a pending load and notify its subscribers
    fn finish(&self, name: &str, result: Result<()>) {
        let subscribers = {
            let mut packages = self.inner.packages.borrow_mut();
            match &result {
                Ok(()) => packages
                    .get_mut(name)
                    .map(|record| mem::replace(&mut record.state, LoadState::Loaded)),
                Err(_) => packages.remove(name).map(|record| record.state),
            }
        };

        match &result {
            Ok(()) => tracing::debug!(package = name, "loaded"),
            Err(e) => tracing::warn!(package = name, error = %e, "load failed"),
        }

        if let Some(LoadState::Loading(subscribers)) = subscribers {
            for subscriber in subscribers {
                subscriber(result.clone());
            }
        }
    }
}
