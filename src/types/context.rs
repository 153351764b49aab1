use std::collections::HashMap;

use super::Value;

/// Query context: named items addressed by dot-separated paths, plus an
/// optional list of explicit level values.
///
/// Level creators read items such as `"policy.code"` to derive query values.
/// When explicit level values are present they are used as the query and
/// level creators are not consulted.
#[derive(Debug, Clone, Default)]
pub struct Context {
    data: HashMap<String, ContextValue>,
    level_values: Option<Vec<Value>>,
}

#[derive(Debug, Clone)]
enum ContextValue {
    Leaf(Value),
    Nested(HashMap<String, ContextValue>),
}

impl Context {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A context carrying explicit level values.
    #[must_use]
    pub fn from_level_values<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Self::new().with_level_values(values)
    }

    /// Set the explicit level values, one per input level.
    #[must_use]
    pub fn with_level_values<V: Into<Value>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.level_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn level_values(&self) -> Option<&[Value]> {
        self.level_values.as_deref()
    }

    /// Set an item at a dot-separated path. Creates intermediate nested maps as needed.
    #[must_use]
    pub fn set(mut self, path: &str, value: impl Into<Value>) -> Self {
        self.insert(path, value.into());
        self
    }

    /// Insert a value at a dot-separated path (mutable reference version).
    pub fn insert(&mut self, path: &str, value: Value) {
        let segments: Vec<&str> = path.split('.').collect();
        Self::insert_recursive(&mut self.data, &segments, value);
    }

    /// Look up an item by dot-separated path.
    /// Returns `None` if the path does not exist or points to a nested map.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Value> {
        let segments: Vec<&str> = path.split('.').collect();
        Self::get_recursive(&self.data, &segments)
    }

    fn insert_recursive(map: &mut HashMap<String, ContextValue>, segments: &[&str], value: Value) {
        match segments {
            [] => {}
            [last] => {
                map.insert((*last).to_owned(), ContextValue::Leaf(value));
            }
            [first, rest @ ..] => {
                let entry = map
                    .entry((*first).to_owned())
                    .or_insert_with(|| ContextValue::Nested(HashMap::new()));
                match entry {
                    ContextValue::Nested(nested) => {
                        Self::insert_recursive(nested, rest, value);
                    }
                    ContextValue::Leaf(_) => {
                        let mut nested = HashMap::new();
                        Self::insert_recursive(&mut nested, rest, value);
                        *entry = ContextValue::Nested(nested);
                    }
                }
            }
        }
    }

    fn get_recursive<'a>(
        map: &'a HashMap<String, ContextValue>,
        segments: &[&str],
    ) -> Option<&'a Value> {
        match segments {
            [] => None,
            [last] => match map.get(*last)? {
                ContextValue::Leaf(v) => Some(v),
                ContextValue::Nested(_) => None,
            },
            [first, rest @ ..] => match map.get(*first)? {
                ContextValue::Nested(nested) => Self::get_recursive(nested, rest),
                ContextValue::Leaf(_) => None,
            },
        }
    }
}
