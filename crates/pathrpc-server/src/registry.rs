//! Class registry: normalized path prefix to method table
//!
//! Registration happens during startup and is rare; lookups happen on every
//! request. The class map is stored behind an [`ArcSwap`] so readers load a
//! snapshot without locking, while writers serialize on a mutex and publish a
//! new map atomically.

use crate::method::{Method, MethodTable};
use crate::service::{Service, is_exported};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use pathrpc_core::normalize_path;
use pathrpc_transport::Codec;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors returned when registering a service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegisterError {
    #[error("register: type {0:?} is not exported")]
    NotExported(String),

    #[error("register: type {service} has no callable methods")]
    NoMethods { service: String },

    #[error("register: class already defined: {0}")]
    AlreadyDefined(String),
}

/// A registered receiver and its methods
pub struct Class<C> {
    path: String,
    service: &'static str,
    methods: HashMap<String, Method<C>>,
}

impl<C: Codec> Class<C> {
    /// Normalized path prefix
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Type name of the receiver
    pub fn service(&self) -> &'static str {
        self.service
    }

    /// Look up a method by exact, case-sensitive name
    pub fn method(&self, name: &str) -> Option<&Method<C>> {
        self.methods.get(name)
    }

    /// Names of all methods, sorted
    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Process-wide table of registered classes
pub struct Registry<C> {
    classes: ArcSwap<HashMap<String, Arc<Class<C>>>>,
    write_lock: Mutex<()>,
}

impl<C: Codec> Registry<C> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            classes: ArcSwap::from_pointee(HashMap::new()),
            write_lock: Mutex::new(()),
        }
    }

    /// Register `receiver` under `prefix`
    ///
    /// Fails if the service type name is not exported, if it exposes no
    /// methods, or if a class already occupies the normalized prefix.
    /// Returns the normalized path on success.
    pub fn register<S: Service>(
        &self,
        prefix: &str,
        receiver: Arc<S>,
    ) -> Result<String, RegisterError> {
        if !is_exported(S::NAME) {
            return Err(RegisterError::NotExported(S::NAME.to_string()));
        }

        let path = normalize_path(prefix);
        let table = MethodTable::<S, C>::build(receiver);
        if table.is_empty() {
            return Err(RegisterError::NoMethods {
                service: S::NAME.to_string(),
            });
        }

        let _guard = self.write_lock.lock();
        let current = self.classes.load();
        if current.contains_key(&path) {
            return Err(RegisterError::AlreadyDefined(path));
        }

        let class = Class {
            path: path.clone(),
            service: S::NAME,
            methods: table.into_methods(),
        };
        let method_count = class.methods.len();

        let mut next = HashMap::clone(&current);
        next.insert(path.clone(), Arc::new(class));
        self.classes.store(Arc::new(next));

        tracing::info!(
            service = S::NAME,
            path = %path,
            methods = method_count,
            "registered class"
        );
        Ok(path)
    }

    /// Look up a class by normalized path
    pub fn class(&self, path: &str) -> Option<Arc<Class<C>>> {
        self.classes.load().get(path).cloned()
    }

    /// All registered paths, sorted
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.classes.load().keys().cloned().collect();
        paths.sort_unstable();
        paths
    }

    /// Number of registered classes
    pub fn len(&self) -> usize {
        self.classes.load().len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.classes.load().is_empty()
    }
}

impl<C: Codec> Default for Registry<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "registry/registry_tests.rs"]
mod registry_tests;
