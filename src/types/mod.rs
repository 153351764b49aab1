mod context;
mod error;
mod holder;
mod param_value;
mod parameter;
mod value;

pub use context::Context;
pub use error::{ConversionError, FunctionError};
pub use holder::Holder;
pub use param_value::{Cell, Column, DetailedEntry, DetailedParamValue, ParamValue, Row};
pub use parameter::{
    DEFAULT_ARRAY_SEPARATOR, Entry, IntoPattern, Level, Parameter, ParameterBuilder, WILDCARD,
};
pub use value::Value;
