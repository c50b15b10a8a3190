//! Backend registry for managing available backends.
//!
//! The [`BackendRegistry`] keeps the backends a provider offers in
//! registration order and indexes them by name.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::backend::Backend;
use crate::error::{HalError, HalResult};

/// Ordered, name-keyed collection of backends.
pub struct BackendRegistry<B: Backend> {
    backends: Vec<B>,
    by_name: FxHashMap<String, usize>,
}

impl<B: Backend> BackendRegistry<B> {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            backends: Vec::new(),
            by_name: FxHashMap::default(),
        }
    }

    /// Build a registry from backends, in order.
    pub fn from_backends(backends: impl IntoIterator<Item = B>) -> Self {
        let mut registry = Self::new();
        for backend in backends {
            registry.register(backend);
        }
        registry
    }

    /// Register a backend. A backend with the same name is replaced in place.
    pub fn register(&mut self, backend: B) {
        let name = backend.name().to_string();
        debug!("Registering backend: {}", name);
        match self.by_name.get(&name) {
            Some(&idx) => self.backends[idx] = backend,
            None => {
                self.by_name.insert(name, self.backends.len());
                self.backends.push(backend);
            }
        }
    }

    /// Look up a backend by exact name.
    pub fn get(&self, name: &str) -> Option<&B> {
        self.by_name.get(name).map(|&idx| &self.backends[idx])
    }

    /// Look up a backend by name, failing when it is not registered.
    pub fn require(&self, name: &str) -> HalResult<&B> {
        self.get(name).ok_or_else(|| {
            HalError::BackendUnavailable(format!("No backend registered with name '{name}'"))
        })
    }

    /// All backends in registration order.
    pub fn backends(&self) -> &[B] {
        &self.backends
    }

    /// Backends matching an optional name and an optional predicate.
    pub fn filter(&self, name: Option<&str>, predicate: Option<&dyn Fn(&B) -> bool>) -> Vec<&B> {
        self.backends
            .iter()
            .filter(|b| name.is_none_or(|n| b.name() == n))
            .filter(|b| predicate.is_none_or(|p| p(b)))
            .collect()
    }

    /// Sorted list of registered names.
    pub fn available_backends(&self) -> Vec<String> {
        let mut names: Vec<_> = self.by_name.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a backend is registered under `name`.
    pub fn has_backend(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl<B: Backend> Default for BackendRegistry<B> {
    fn default() -> Self {
        Self::new()
    }
}
