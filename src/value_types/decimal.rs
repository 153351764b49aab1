use std::str::FromStr;

use rust_decimal::Decimal;

use crate::types::{ConversionError, Holder, Value};

use super::{non_blank, unsupported, ParamType};

/// Exact decimal numbers. Finite floats convert; NaN and infinities do not.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecimalType;

impl ParamType for DecimalType {
    fn name(&self) -> &str {
        "decimal"
    }

    fn decode(&self, text: Option<&str>) -> Result<Holder, ConversionError> {
        let Some(text) = non_blank(text) else {
            return Ok(Holder::Null);
        };
        Decimal::from_str(text)
            .map(Holder::Decimal)
            .map_err(|e| ConversionError::new(self.name(), text, e.to_string()))
    }

    /// Trailing zeros are dropped, so `1.50` and `1.5` encode alike.
    fn encode(&self, holder: &Holder) -> Option<String> {
        match holder {
            Holder::Decimal(v) => Some(v.normalize().to_string()),
            other => other.string(),
        }
    }

    fn convert(&self, value: &Value) -> Result<Holder, ConversionError> {
        match value {
            Value::Null => Ok(Holder::Null),
            Value::Decimal(v) => Ok(Holder::Decimal(*v)),
            Value::Int(v) => Ok(Holder::Decimal(Decimal::from(*v))),
            Value::Float(v) => Decimal::try_from(*v)
                .map(Holder::Decimal)
                .map_err(|e| ConversionError::new(self.name(), v.to_string(), e.to_string())),
            Value::String(v) => self.decode(Some(v)),
            other => Err(unsupported(self, other)),
        }
    }
}
