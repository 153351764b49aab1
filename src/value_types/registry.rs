use std::collections::HashMap;
use std::sync::Arc;

use crate::ParamError;

use super::{BooleanType, DateType, DecimalType, IntegerType, ParamType, StringType};

/// Level types by code. Populated while the engine is being configured and
/// read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<String, Arc<dyn ParamType>>,
}

impl TypeRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding `string`, `integer`, `boolean`, `date` and `decimal`.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("string", StringType);
        registry.register("integer", IntegerType);
        registry.register("boolean", BooleanType);
        registry.register("date", DateType);
        registry.register("decimal", DecimalType);
        registry
    }

    /// Register a type, replacing any previous type under the same code.
    pub fn register(&mut self, code: impl Into<String>, ty: impl ParamType + 'static) {
        self.types.insert(code.into(), Arc::new(ty));
    }

    /// # Errors
    ///
    /// Returns [`ParamError::UnknownType`] if nothing is registered under `code`.
    pub fn get(&self, code: &str) -> Result<Arc<dyn ParamType>, ParamError> {
        self.types
            .get(code)
            .cloned()
            .ok_or_else(|| ParamError::UnknownType {
                code: code.to_owned(),
            })
    }

    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.types.contains_key(code)
    }

    /// Registered codes, sorted.
    #[must_use]
    pub fn codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.types.keys().cloned().collect();
        codes.sort();
        codes
    }
}
