use crate::parse::parse_date;
use crate::types::{ConversionError, Holder, Value};

use super::{non_blank, unsupported, ParamType};

/// Calendar dates. Decodes year-first and day-first layouts with `-`, `.` or
/// `/` separators; always encodes as `yyyy-mm-dd`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateType;

impl ParamType for DateType {
    fn name(&self) -> &str {
        "date"
    }

    fn decode(&self, text: Option<&str>) -> Result<Holder, ConversionError> {
        let Some(text) = non_blank(text) else {
            return Ok(Holder::Null);
        };
        parse_date(text)
            .map(Holder::Date)
            .map_err(|e| ConversionError::new(self.name(), text, e.to_string()))
    }

    fn encode(&self, holder: &Holder) -> Option<String> {
        holder.string()
    }

    fn convert(&self, value: &Value) -> Result<Holder, ConversionError> {
        match value {
            Value::Null => Ok(Holder::Null),
            Value::Date(v) => Ok(Holder::Date(*v)),
            Value::String(v) => self.decode(Some(v)),
            other => Err(unsupported(self, other)),
        }
    }
}
