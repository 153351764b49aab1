mod error;
mod grammar;

use chrono::NaiveDate;

pub use error::ParseError;

/// Read a calendar date in one of the accepted layouts.
///
/// Year-first (`2013-01-27`, `2013.01.27`, `2013/01/27`) and day-first
/// (`27-01-2013`, `27.01.2013`, `27/01/2013`) layouts are accepted. Surrounding
/// whitespace is ignored.
///
/// # Errors
///
/// Returns [`ParseError`] if the text matches no layout or names a day that
/// does not exist.
pub fn parse_date(input: &str) -> Result<NaiveDate, ParseError> {
    use winnow::Parser;
    let parts = grammar::date
        .parse(input.trim())
        .map_err(|e| ParseError::new(input, e.to_string()))?;
    NaiveDate::from_ymd_opt(parts.year, parts.month, parts.day)
        .ok_or_else(|| ParseError::new(input, "no such calendar day"))
}
