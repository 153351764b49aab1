use std::cmp::Ordering;

use crate::types::{ConversionError, Holder, WILDCARD};
use crate::ParamType;

use super::Matcher;

/// Separators tried, in order, when splitting a range pattern.
pub const DEFAULT_SEPARATORS: [char; 4] = ['~', ':', '-', ','];

/// Range patterns `lower<sep>upper`, compared on decoded holders.
///
/// A blank or `*` bound is open. Pattern `"1 - 10"` with an integer level
/// and the default inclusivity matches `1` through `9`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BetweenMatcher {
    lower_inclusive: bool,
    upper_inclusive: bool,
    separators: Vec<char>,
}

impl Default for BetweenMatcher {
    /// Lower bound inclusive, upper bound exclusive.
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl BetweenMatcher {
    #[must_use]
    pub fn new(lower_inclusive: bool, upper_inclusive: bool) -> Self {
        Self {
            lower_inclusive,
            upper_inclusive,
            separators: DEFAULT_SEPARATORS.to_vec(),
        }
    }

    /// Replace the separator list. An empty list falls back to `~`.
    #[must_use]
    pub fn with_separators(mut self, separators: impl IntoIterator<Item = char>) -> Self {
        self.separators = separators.into_iter().collect();
        self
    }

    #[must_use]
    pub fn separators(&self) -> &[char] {
        &self.separators
    }

    fn separator_for(&self, pattern: &str) -> char {
        self.separators
            .iter()
            .copied()
            .find(|sep| pattern.contains(*sep))
            .unwrap_or('~')
    }

    fn split<'p>(&self, pattern: &'p str) -> (Option<&'p str>, Option<&'p str>) {
        let (lower, upper) = pattern
            .split_once(self.separator_for(pattern))
            .unwrap_or((pattern, ""));
        (Self::bound(lower), Self::bound(upper))
    }

    fn bound<'p>(text: &'p str) -> Option<&'p str> {
        let text = text.trim();
        (!text.is_empty() && text != WILDCARD).then_some(text)
    }

    fn within(
        &self,
        bound: Option<&str>,
        value: &Holder,
        ty: &dyn ParamType,
        lower: bool,
    ) -> Result<bool, ConversionError> {
        let Some(bound) = bound else {
            return Ok(true);
        };
        let bound = ty.decode(Some(bound))?;
        let (inclusive, wanted) = if lower {
            (self.lower_inclusive, Ordering::Less)
        } else {
            (self.upper_inclusive, Ordering::Greater)
        };
        Ok(match bound.partial_cmp(value) {
            Some(Ordering::Equal) => inclusive,
            Some(ordering) => ordering == wanted,
            None => false,
        })
    }
}

impl Matcher for BetweenMatcher {
    fn matches(
        &self,
        value: Option<&str>,
        pattern: &str,
        ty: &dyn ParamType,
    ) -> Result<bool, ConversionError> {
        let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
            return Ok(false);
        };
        let (lower, upper) = self.split(pattern);
        let value = ty.decode(Some(value))?;
        Ok(self.within(lower, &value, ty, true)? && self.within(upper, &value, ty, false)?)
    }

    fn validate(&self, pattern: &str, ty: &dyn ParamType) -> Result<(), ConversionError> {
        let (lower, upper) = self.split(pattern);
        for bound in [lower, upper].into_iter().flatten() {
            ty.decode(Some(bound))?;
        }
        Ok(())
    }
}
