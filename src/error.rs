use thiserror::Error;

use crate::types::{ConversionError, FunctionError};

/// Unified error type for loading, preparing and querying parameters.
#[derive(Debug, Error)]
pub enum ParamError {
    #[error("parameter '{name}' not found in any repository")]
    UnknownParameter { name: String },

    #[error("parameter '{parameter}' expects {expected} level values, got {actual}")]
    InvalidQueryArity {
        parameter: String,
        expected: usize,
        actual: usize,
    },

    #[error("no value found for parameter '{parameter}' with levels [{}]", values.join(", "))]
    NoValueFound {
        parameter: String,
        values: Vec<String>,
    },

    #[error("parameter '{parameter}' does not identify its entries")]
    KeyNotSupported { parameter: String },

    #[error("column '{column}' {}", shape_hint(*array))]
    WrongColumnShape { column: String, array: bool },

    #[error("no level creator yields a value for level '{level}' of parameter '{parameter}'")]
    UnresolvableLevelValue { parameter: String, level: String },

    #[error(transparent)]
    TypeConversion(#[from] ConversionError),

    #[error("unknown level type '{code}'")]
    UnknownType { code: String },

    #[error("unknown matcher '{code}'")]
    UnknownMatcher { code: String },

    #[error("malformed parameter '{parameter}': {reason}")]
    MalformedEntry { parameter: String, reason: String },

    #[error("no output column '{column}'")]
    UnknownColumn { column: String },

    #[error("row {row} out of bounds for value with {len} rows")]
    RowOutOfBounds { row: usize, len: usize },

    #[error("expected a {expected} value, found {found}")]
    WrongValueKind {
        expected: &'static str,
        found: &'static str,
    },

    #[error(transparent)]
    Function(#[from] FunctionError),

    #[error("no function provider configured")]
    MissingFunctionProvider,

    #[error("parameter '{parameter}' does not evaluate to a function name")]
    InvalidFunctionToCall { parameter: String },
}

fn shape_hint(array: bool) -> &'static str {
    if array {
        "holds an array; use an array getter"
    } else {
        "holds a single value; use a scalar getter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_parameter_message() {
        let err = ParamError::UnknownParameter {
            name: "tariff".into(),
        };
        assert_eq!(
            err.to_string(),
            "parameter 'tariff' not found in any repository"
        );
    }

    #[test]
    fn arity_message() {
        let err = ParamError::InvalidQueryArity {
            parameter: "tariff".into(),
            expected: 2,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "parameter 'tariff' expects 2 level values, got 3"
        );
    }

    #[test]
    fn no_value_found_lists_levels() {
        let err = ParamError::NoValueFound {
            parameter: "tariff".into(),
            values: vec!["A".into(), "null".into()],
        };
        assert_eq!(
            err.to_string(),
            "no value found for parameter 'tariff' with levels [A, null]"
        );
    }

    #[test]
    fn column_shape_messages() {
        let err = ParamError::WrongColumnShape {
            column: "codes".into(),
            array: true,
        };
        assert_eq!(
            err.to_string(),
            "column 'codes' holds an array; use an array getter"
        );
        let err = ParamError::WrongColumnShape {
            column: "0".into(),
            array: false,
        };
        assert_eq!(
            err.to_string(),
            "column '0' holds a single value; use a scalar getter"
        );
    }

    #[test]
    fn conversion_is_transparent() {
        let err = ParamError::from(ConversionError::new("integer", "x", "invalid digit"));
        assert_eq!(err.to_string(), "cannot convert 'x' to integer: invalid digit");
    }

    #[test]
    fn function_is_transparent() {
        let err = ParamError::from(FunctionError::UnknownFunction { name: "f".into() });
        assert_eq!(err.to_string(), "unknown function 'f'");
    }
}
