use std::collections::HashMap;
use std::sync::Arc;

use crate::ParamError;

use super::{BetweenMatcher, Matcher, StrictMatcher};

/// Matchers by code, plus the matcher used by levels that name none.
#[derive(Debug, Clone)]
pub struct MatcherRegistry {
    matchers: HashMap<String, Arc<dyn Matcher>>,
    default: Arc<dyn Matcher>,
}

impl Default for MatcherRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl MatcherRegistry {
    /// No named matchers; levels without a code use [`StrictMatcher`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            matchers: HashMap::new(),
            default: Arc::new(StrictMatcher),
        }
    }

    /// `equals`, `between/ie`, `between/ei`, `between/ii`, `between/ee`, and
    /// `between` as an alias of `between/ie`.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("equals", StrictMatcher);
        registry.register("between", BetweenMatcher::new(true, false));
        registry.register("between/ie", BetweenMatcher::new(true, false));
        registry.register("between/ei", BetweenMatcher::new(false, true));
        registry.register("between/ii", BetweenMatcher::new(true, true));
        registry.register("between/ee", BetweenMatcher::new(false, false));
        registry
    }

    pub fn register(&mut self, code: impl Into<String>, matcher: impl Matcher + 'static) {
        self.matchers.insert(code.into(), Arc::new(matcher));
    }

    /// Replace the matcher used by levels without a matcher code.
    pub fn set_default(&mut self, matcher: impl Matcher + 'static) {
        self.default = Arc::new(matcher);
    }

    /// # Errors
    ///
    /// Returns [`ParamError::UnknownMatcher`] for an unregistered code.
    pub fn get(&self, code: &str) -> Result<Arc<dyn Matcher>, ParamError> {
        self.matchers
            .get(code)
            .cloned()
            .ok_or_else(|| ParamError::UnknownMatcher {
                code: code.to_owned(),
            })
    }

    /// Resolve a level's matcher code; `None` selects the default.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::UnknownMatcher`] for an unregistered code.
    pub fn resolve(&self, code: Option<&str>) -> Result<Arc<dyn Matcher>, ParamError> {
        match code {
            None => Ok(Arc::clone(&self.default)),
            Some(code) => self.get(code),
        }
    }

    #[must_use]
    pub fn codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.matchers.keys().cloned().collect();
        codes.sort();
        codes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IntegerType;

    #[test]
    fn builtin_codes() {
        assert_eq!(
            MatcherRegistry::with_builtins().codes(),
            vec![
                "between",
                "between/ee",
                "between/ei",
                "between/ie",
                "between/ii",
                "equals"
            ]
        );
    }

    #[test]
    fn missing_code_uses_default() {
        let matcher = MatcherRegistry::default().resolve(None).unwrap();
        assert!(matcher.exact());
    }

    #[test]
    fn between_alias_is_lower_inclusive() {
        let matcher = MatcherRegistry::default().resolve(Some("between")).unwrap();
        assert!(matcher.matches(Some("1"), "1 ~ 5", &IntegerType).unwrap());
        assert!(!matcher.matches(Some("5"), "1 ~ 5", &IntegerType).unwrap());
    }

    #[test]
    fn lookup_by_code() {
        let registry = MatcherRegistry::new();
        assert!(registry.get("equals").is_err());
        assert!(MatcherRegistry::with_builtins().get("equals").unwrap().exact());
    }

    #[test]
    fn unknown_code() {
        let err = MatcherRegistry::default().resolve(Some("regex")).unwrap_err();
        assert_eq!(err.to_string(), "unknown matcher 'regex'");
    }
}
