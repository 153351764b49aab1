use thiserror::Error;

/// A level type rejected a value or a stored pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot convert '{input}' to {type_code}: {reason}")]
pub struct ConversionError {
    pub type_code: String,
    pub input: String,
    pub reason: String,
}

impl ConversionError {
    pub fn new(
        type_code: impl Into<String>,
        input: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            type_code: type_code.into(),
            input: input.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised by a [`FunctionProvider`](crate::FunctionProvider).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FunctionError {
    #[error("unknown function '{name}'")]
    UnknownFunction { name: String },

    #[error("function '{name}' failed: {reason}")]
    Failed { name: String, reason: String },
}
