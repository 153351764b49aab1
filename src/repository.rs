//! Collaborator seams: where parameters come from and how functions are run.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::types::{Entry, FunctionError, Parameter, Value};

/// Source of parameter definitions. Implementations are called from many
/// threads at once.
pub trait ParamRepository: Send + Sync {
    /// Load a parameter, or `None` if this repository does not define it.
    fn load(&self, name: &str) -> Option<Parameter>;

    /// Entries of a non-cacheable parameter that may match `values`, one
    /// normalized value per input level.
    ///
    /// Returning extra entries is allowed: they are matched again before use.
    /// The default loads the parameter and returns all of its entries.
    fn find_entries(&self, name: &str, values: &[Option<String>]) -> Vec<Entry> {
        let _ = values;
        self.load(name)
            .map(|parameter| parameter.entries)
            .unwrap_or_default()
    }
}

/// Runs named functions for function entries and for
/// [`ParamEngine::call_function`](crate::ParamEngine::call_function).
pub trait FunctionProvider: Send + Sync {
    /// # Errors
    ///
    /// Returns [`FunctionError`] if the function is unknown or fails.
    fn invoke(&self, function: &str, args: &[Value]) -> Result<Value, FunctionError>;
}

impl<F> FunctionProvider for F
where
    F: Fn(&str, &[Value]) -> Result<Value, FunctionError> + Send + Sync,
{
    fn invoke(&self, function: &str, args: &[Value]) -> Result<Value, FunctionError> {
        self(function, args)
    }
}

/// An in-memory repository.
#[derive(Debug, Default)]
pub struct StaticRepository {
    parameters: RwLock<HashMap<String, Parameter>>,
}

impl StaticRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(self, parameter: Parameter) -> Self {
        self.insert(parameter);
        self
    }

    /// Add or replace a parameter, returning the previous definition.
    ///
    /// Cached preparations are not touched; invalidate the parameter on the
    /// engine afterwards.
    pub fn insert(&self, parameter: Parameter) -> Option<Parameter> {
        self.parameters
            .write()
            .insert(parameter.name.clone(), parameter)
    }

    pub fn remove(&self, name: &str) -> Option<Parameter> {
        self.parameters.write().remove(name)
    }

    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.parameters.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl ParamRepository for StaticRepository {
    fn load(&self, name: &str) -> Option<Parameter> {
        self.parameters.read().get(name).cloned()
    }
}
