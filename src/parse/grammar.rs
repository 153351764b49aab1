use winnow::combinator::alt;
use winnow::error::ModalResult;
use winnow::prelude::*;
use winnow::token::{one_of, take_while};

/// Calendar fields as written, not yet validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct DateParts {
    pub(super) year: i32,
    pub(super) month: u32,
    pub(super) day: u32,
}

// -- Components -------------------------------------------------------------

fn separator(input: &mut &str) -> ModalResult<char> {
    one_of(['-', '.', '/']).parse_next(input)
}

/// The separator already chosen earlier in the same date.
fn repeated(mut sep: char) -> impl FnMut(&mut &str) -> ModalResult<char> {
    move |input: &mut &str| sep.parse_next(input)
}

fn year(input: &mut &str) -> ModalResult<i32> {
    take_while(4, |c: char| c.is_ascii_digit())
        .try_map(|s: &str| s.parse::<i32>())
        .parse_next(input)
}

fn day_or_month(input: &mut &str) -> ModalResult<u32> {
    take_while(1..=2, |c: char| c.is_ascii_digit())
        .try_map(|s: &str| s.parse::<u32>())
        .parse_next(input)
}

// -- Layouts ----------------------------------------------------------------

/// `yyyy-mm-dd`, `yyyy.mm.dd` or `yyyy/mm/dd`. Both separators must agree.
fn year_first(input: &mut &str) -> ModalResult<DateParts> {
    let year = year.parse_next(input)?;
    let sep = separator.parse_next(input)?;
    let month = day_or_month.parse_next(input)?;
    repeated(sep).parse_next(input)?;
    let day = day_or_month.parse_next(input)?;
    Ok(DateParts { year, month, day })
}

/// `dd-mm-yyyy`, `dd.mm.yyyy` or `dd/mm/yyyy`.
fn day_first(input: &mut &str) -> ModalResult<DateParts> {
    let day = day_or_month.parse_next(input)?;
    let sep = separator.parse_next(input)?;
    let month = day_or_month.parse_next(input)?;
    repeated(sep).parse_next(input)?;
    let year = year.parse_next(input)?;
    Ok(DateParts { year, month, day })
}

pub(super) fn date(input: &mut &str) -> ModalResult<DateParts> {
    alt((year_first, day_first)).parse_next(input)
}
