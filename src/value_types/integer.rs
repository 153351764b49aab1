use rust_decimal::prelude::ToPrimitive;

use crate::types::{ConversionError, Holder, Value};

use super::{non_blank, unsupported, ParamType};

/// 64-bit signed integers. Blank text decodes to null.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntegerType;

impl ParamType for IntegerType {
    fn name(&self) -> &str {
        "integer"
    }

    fn decode(&self, text: Option<&str>) -> Result<Holder, ConversionError> {
        let Some(text) = non_blank(text) else {
            return Ok(Holder::Null);
        };
        text.parse::<i64>()
            .map(Holder::Integer)
            .map_err(|e| ConversionError::new(self.name(), text, e.to_string()))
    }

    fn encode(&self, holder: &Holder) -> Option<String> {
        holder.string()
    }

    fn convert(&self, value: &Value) -> Result<Holder, ConversionError> {
        match value {
            Value::Null => Ok(Holder::Null),
            Value::Int(v) => Ok(Holder::Integer(*v)),
            Value::String(v) => self.decode(Some(v)),
            Value::Decimal(v) if v.fract().is_zero() => v.to_i64().map(Holder::Integer).ok_or_else(
                || ConversionError::new(self.name(), v.to_string(), "out of range"),
            ),
            other => Err(unsupported(self, other)),
        }
    }
}
