use crate::types::{ConversionError, WILDCARD};
use crate::ParamType;

use super::Matcher;

/// Text equality. A blank value only matches the wildcard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StrictMatcher;

impl Matcher for StrictMatcher {
    fn matches(
        &self,
        value: Option<&str>,
        pattern: &str,
        _ty: &dyn ParamType,
    ) -> Result<bool, ConversionError> {
        Ok(match value {
            Some(v) if !v.trim().is_empty() => pattern == v,
            _ => pattern == WILDCARD,
        })
    }

    fn exact(&self) -> bool {
        true
    }
}
