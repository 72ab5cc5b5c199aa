//! Typed key→value side channel passed unchanged through builds.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Contextual values node factories may consult at build time.
///
/// The environment is not core-owned data — it carries host context such
/// as an instance identifier or subgraph hierarchy. It is cloned into each
/// built runtime and handed to every operator factory and reset call.
/// There is no global environment; hosts construct and inject one
/// explicitly.
#[derive(Clone, Default)]
pub struct Environment {
    values: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

impl Environment {
    /// Creates an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value under `key`, replacing any previous value.
    pub fn set<T: Send + Sync + 'static>(&mut self, key: impl Into<String>, value: T) {
        self.values.insert(key.into(), Arc::new(value));
    }

    /// Returns the value stored under `key` if it has type `T`.
    pub fn get<T: Send + Sync + 'static>(&self, key: &str) -> Option<&T> {
        self.values.get(key)?.as_ref().downcast_ref::<T>()
    }

    /// Returns true if a value is stored under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Removes the value stored under `key`. Returns true if one existed.
    pub fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }
}
