use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::ParamError;

/// A typed value produced by a level type, either decoded from a stored
/// pattern or converted from a runtime [`Value`](crate::Value).
///
/// Holders of the same kind are totally ordered. `Null` orders before every
/// other holder. Holders of different kinds are not comparable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Holder {
    Null,
    String(String),
    Integer(i64),
    Boolean(bool),
    Date(NaiveDate),
    Decimal(Decimal),
}

impl Holder {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Holder::Null)
    }

    /// Short name of the holder kind, used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Holder::Null => "null",
            Holder::String(_) => "string",
            Holder::Integer(_) => "integer",
            Holder::Boolean(_) => "boolean",
            Holder::Date(_) => "date",
            Holder::Decimal(_) => "decimal",
        }
    }

    /// Text form of any non-null holder.
    #[must_use]
    pub fn string(&self) -> Option<String> {
        match self {
            Holder::Null => None,
            Holder::String(v) => Some(v.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Integer view. Decimals without a fractional part are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::WrongValueKind`] for any other kind.
    pub fn integer(&self) -> Result<Option<i64>, ParamError> {
        match self {
            Holder::Null => Ok(None),
            Holder::Integer(v) => Ok(Some(*v)),
            Holder::Decimal(v) if v.fract().is_zero() => v
                .to_i64()
                .map(Some)
                .ok_or_else(|| self.wrong_kind("integer")),
            _ => Err(self.wrong_kind("integer")),
        }
    }

    /// Decimal view. Integers widen losslessly.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::WrongValueKind`] for any other kind.
    pub fn decimal(&self) -> Result<Option<Decimal>, ParamError> {
        match self {
            Holder::Null => Ok(None),
            Holder::Decimal(v) => Ok(Some(*v)),
            Holder::Integer(v) => Ok(Some(Decimal::from(*v))),
            _ => Err(self.wrong_kind("decimal")),
        }
    }

    /// # Errors
    ///
    /// Returns [`ParamError::WrongValueKind`] unless the holder is a boolean or null.
    pub fn boolean(&self) -> Result<Option<bool>, ParamError> {
        match self {
            Holder::Null => Ok(None),
            Holder::Boolean(v) => Ok(Some(*v)),
            _ => Err(self.wrong_kind("boolean")),
        }
    }

    /// # Errors
    ///
    /// Returns [`ParamError::WrongValueKind`] unless the holder is a date or null.
    pub fn date(&self) -> Result<Option<NaiveDate>, ParamError> {
        match self {
            Holder::Null => Ok(None),
            Holder::Date(v) => Ok(Some(*v)),
            _ => Err(self.wrong_kind("date")),
        }
    }

    fn wrong_kind(&self, expected: &'static str) -> ParamError {
        ParamError::WrongValueKind {
            expected,
            found: self.kind(),
        }
    }
}

impl PartialOrd for Holder {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Holder::Null, Holder::Null) => Some(Ordering::Equal),
            (Holder::Null, _) => Some(Ordering::Less),
            (_, Holder::Null) => Some(Ordering::Greater),
            (Holder::String(a), Holder::String(b)) => Some(a.cmp(b)),
            (Holder::Integer(a), Holder::Integer(b)) => Some(a.cmp(b)),
            (Holder::Boolean(a), Holder::Boolean(b)) => Some(a.cmp(b)),
            (Holder::Date(a), Holder::Date(b)) => Some(a.cmp(b)),
            (Holder::Decimal(a), Holder::Decimal(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Holder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Holder::Null => write!(f, "null"),
            Holder::String(v) => write!(f, "{v}"),
            Holder::Integer(v) => write!(f, "{v}"),
            Holder::Boolean(v) => write!(f, "{v}"),
            Holder::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            Holder::Decimal(v) => write!(f, "{v}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_orders_first() {
        assert!(Holder::Null < Holder::Integer(i64::MIN));
        assert!(Holder::String(String::new()) > Holder::Null);
        assert_eq!(Holder::Null.partial_cmp(&Holder::Null), Some(Ordering::Equal));
    }

    #[test]
    fn same_kind_ordering() {
        assert!(Holder::Integer(3) < Holder::Integer(10));
        assert!(Holder::String("a".into()) < Holder::String("b".into()));
        let early = NaiveDate::from_ymd_opt(2013, 1, 1).unwrap();
        let late = NaiveDate::from_ymd_opt(2013, 1, 5).unwrap();
        assert!(Holder::Date(early) < Holder::Date(late));
    }

    #[test]
    fn mixed_kinds_are_incomparable() {
        assert_eq!(
            Holder::Integer(1).partial_cmp(&Holder::String("1".into())),
            None
        );
    }

    #[test]
    fn integer_from_whole_decimal() {
        assert_eq!(Holder::Decimal(Decimal::new(400, 2)).integer().unwrap(), Some(4));
        assert!(Holder::Decimal(Decimal::new(405, 2)).integer().is_err());
    }

    #[test]
    fn decimal_widens_integer() {
        assert_eq!(
            Holder::Integer(7).decimal().unwrap(),
            Some(Decimal::from(7))
        );
    }

    #[test]
    fn wrong_kind_reports_both_sides() {
        let err = Holder::String("x".into()).boolean().unwrap_err();
        assert_eq!(err.to_string(), "expected a boolean value, found string");
    }

    #[test]
    fn string_view() {
        assert_eq!(Holder::Integer(11).string().as_deref(), Some("11"));
        assert_eq!(Holder::Null.string(), None);
        let date = NaiveDate::from_ymd_opt(2013, 1, 27).unwrap();
        assert_eq!(Holder::Date(date).string().as_deref(), Some("2013-01-27"));
    }
}
