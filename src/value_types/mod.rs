//! Level types: the codecs that turn stored pattern text and runtime values
//! into comparable [`Holder`]s and back.

mod boolean;
mod date;
mod decimal;
mod integer;
mod registry;
mod string;

use std::fmt;

use crate::types::{ConversionError, Holder, Value};

pub use boolean::BooleanType;
pub use date::DateType;
pub use decimal::DecimalType;
pub use integer::IntegerType;
pub use registry::TypeRegistry;
pub use string::StringType;

/// A level type. Implementations must be stateless or internally synchronized:
/// one instance is shared by every parameter and thread.
pub trait ParamType: fmt::Debug + Send + Sync {
    /// Name used in conversion errors.
    fn name(&self) -> &str;

    /// Decode stored text. `None` decodes to [`Holder::Null`].
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError`] if the text is not a valid literal.
    fn decode(&self, text: Option<&str>) -> Result<Holder, ConversionError>;

    /// Encode a holder as stored text. [`Holder::Null`] encodes to `None`.
    fn encode(&self, holder: &Holder) -> Option<String>;

    /// Convert a runtime value. Must accept [`Value::Null`], strings (decoded
    /// as by [`decode`](Self::decode)) and the values produced from this
    /// type's own holders.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError`] for unsupported values.
    fn convert(&self, value: &Value) -> Result<Holder, ConversionError>;

    /// Allocate storage for an array cell of `size` elements.
    fn new_array(&self, size: usize) -> Vec<Holder> {
        Vec::with_capacity(size)
    }
}

/// Text with only whitespace counts as blank, as does `None`.
pub(crate) fn non_blank(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}

pub(crate) fn unsupported(ty: &dyn ParamType, value: &Value) -> ConversionError {
    ConversionError::new(
        ty.name(),
        value.to_string(),
        format!("unsupported value kind {}", value.kind()),
    )
}
