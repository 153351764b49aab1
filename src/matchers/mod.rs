//! Pattern predicates used when walking the level index.

mod between;
mod registry;
mod strict;

use std::fmt;

use crate::types::ConversionError;
use crate::ParamType;

pub use between::{BetweenMatcher, DEFAULT_SEPARATORS};
pub use registry::MatcherRegistry;
pub use strict::StrictMatcher;

/// Decides whether a query value satisfies a stored pattern.
///
/// The walker never passes the wildcard `*` to a matcher: wildcard branches
/// are always explored after the concrete ones.
pub trait Matcher: fmt::Debug + Send + Sync {
    /// `value` is the normalized query value, `None` for null. `ty` is the
    /// level's type, for matchers that compare decoded holders.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError`] if the pattern or the value cannot be
    /// decoded by `ty`.
    fn matches(
        &self,
        value: Option<&str>,
        pattern: &str,
        ty: &dyn ParamType,
    ) -> Result<bool, ConversionError>;

    /// `true` if the matcher accepts exactly the patterns equal to the
    /// normalized value. Such levels are matched through a hash lookup and
    /// never call [`matches`](Self::matches).
    fn exact(&self) -> bool {
        false
    }

    /// Check a stored pattern once, when the parameter is prepared.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError`] if the pattern can never be evaluated
    /// against `ty`.
    fn validate(&self, _pattern: &str, _ty: &dyn ParamType) -> Result<(), ConversionError> {
        Ok(())
    }
}
