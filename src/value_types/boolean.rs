use crate::types::{ConversionError, Holder, Value};

use super::{non_blank, unsupported, ParamType};

/// Booleans. Accepts `true`/`false`, `t`/`f`, `yes`/`no`, `y`/`n` and `1`/`0`
/// in any case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BooleanType;

impl ParamType for BooleanType {
    fn name(&self) -> &str {
        "boolean"
    }

    fn decode(&self, text: Option<&str>) -> Result<Holder, ConversionError> {
        let Some(text) = non_blank(text) else {
            return Ok(Holder::Null);
        };
        match text.to_ascii_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "1" => Ok(Holder::Boolean(true)),
            "false" | "f" | "no" | "n" | "0" => Ok(Holder::Boolean(false)),
            _ => Err(ConversionError::new(
                self.name(),
                text,
                "not a boolean literal",
            )),
        }
    }

    fn encode(&self, holder: &Holder) -> Option<String> {
        holder.string()
    }

    fn convert(&self, value: &Value) -> Result<Holder, ConversionError> {
        match value {
            Value::Null => Ok(Holder::Null),
            Value::Bool(v) => Ok(Holder::Boolean(*v)),
            Value::String(v) => self.decode(Some(v)),
            other => Err(unsupported(self, other)),
        }
    }
}
