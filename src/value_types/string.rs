use crate::types::{ConversionError, Holder, Value};

use super::ParamType;

/// Text, stored verbatim. Any non-null value converts through its text form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StringType;

impl ParamType for StringType {
    fn name(&self) -> &str {
        "string"
    }

    fn decode(&self, text: Option<&str>) -> Result<Holder, ConversionError> {
        Ok(text.map_or(Holder::Null, |t| Holder::String(t.to_owned())))
    }

    fn encode(&self, holder: &Holder) -> Option<String> {
        holder.string()
    }

    fn convert(&self, value: &Value) -> Result<Holder, ConversionError> {
        Ok(value.to_text().map_or(Holder::Null, Holder::String))
    }
}
