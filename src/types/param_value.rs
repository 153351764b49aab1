use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::holder::Holder;
use crate::ParamError;

/// Addresses an output column: by position (`0` is the first output level)
/// or by level name.
pub trait Column: Copy + fmt::Display {
    /// Position of this column among `names`, if it exists.
    fn position(self, names: &[Option<String>]) -> Option<usize>;
}

impl Column for usize {
    fn position(self, names: &[Option<String>]) -> Option<usize> {
        (self < names.len()).then_some(self)
    }
}

impl Column for &str {
    fn position(self, names: &[Option<String>]) -> Option<usize> {
        names.iter().position(|name| name.as_deref() == Some(self))
    }
}

/// One output cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Value(Holder),
    /// Cell of an array level, split on the parameter's array separator.
    Array(Vec<Holder>),
}

/// One matched entry, projected onto the output levels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    cells: Vec<Cell>,
    key: Option<String>,
    columns: Arc<[Option<String>]>,
}

impl Row {
    pub(crate) fn new(cells: Vec<Cell>, key: Option<String>, columns: Arc<[Option<String>]>) -> Self {
        Self {
            cells,
            key,
            columns,
        }
    }

    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Entry key, present only when the parameter identifies its entries.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// # Errors
    ///
    /// Returns [`ParamError::UnknownColumn`] if the column does not exist.
    pub fn cell<C: Column>(&self, column: C) -> Result<&Cell, ParamError> {
        column
            .position(&self.columns)
            .and_then(|at| self.cells.get(at))
            .ok_or_else(|| ParamError::UnknownColumn {
                column: column.to_string(),
            })
    }

    /// The single value held by a column.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::UnknownColumn`] for a missing column and
    /// [`ParamError::WrongColumnShape`] for an array column.
    pub fn get<C: Column>(&self, column: C) -> Result<&Holder, ParamError> {
        match self.cell(column)? {
            Cell::Value(holder) => Ok(holder),
            Cell::Array(_) => Err(ParamError::WrongColumnShape {
                column: column.to_string(),
                array: true,
            }),
        }
    }

    /// The values held by an array column.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::UnknownColumn`] for a missing column and
    /// [`ParamError::WrongColumnShape`] for a single-valued column.
    pub fn get_array<C: Column>(&self, column: C) -> Result<&[Holder], ParamError> {
        match self.cell(column)? {
            Cell::Array(values) => Ok(values),
            Cell::Value(_) => Err(ParamError::WrongColumnShape {
                column: column.to_string(),
                array: false,
            }),
        }
    }

    pub fn get_string<C: Column>(&self, column: C) -> Result<Option<String>, ParamError> {
        Ok(self.get(column)?.string())
    }

    pub fn get_integer<C: Column>(&self, column: C) -> Result<Option<i64>, ParamError> {
        self.get(column)?.integer()
    }

    pub fn get_decimal<C: Column>(&self, column: C) -> Result<Option<Decimal>, ParamError> {
        self.get(column)?.decimal()
    }

    pub fn get_boolean<C: Column>(&self, column: C) -> Result<Option<bool>, ParamError> {
        self.get(column)?.boolean()
    }

    pub fn get_date<C: Column>(&self, column: C) -> Result<Option<NaiveDate>, ParamError> {
        self.get(column)?.date()
    }

    /// Null elements are skipped by the typed array getters.
    pub fn get_string_array<C: Column>(&self, column: C) -> Result<Vec<String>, ParamError> {
        self.typed_array(column, |h| Ok(h.string()))
    }

    pub fn get_integer_array<C: Column>(&self, column: C) -> Result<Vec<i64>, ParamError> {
        self.typed_array(column, Holder::integer)
    }

    pub fn get_decimal_array<C: Column>(&self, column: C) -> Result<Vec<Decimal>, ParamError> {
        self.typed_array(column, Holder::decimal)
    }

    pub fn get_boolean_array<C: Column>(&self, column: C) -> Result<Vec<bool>, ParamError> {
        self.typed_array(column, Holder::boolean)
    }

    pub fn get_date_array<C: Column>(&self, column: C) -> Result<Vec<NaiveDate>, ParamError> {
        self.typed_array(column, Holder::date)
    }

    fn typed_array<C, T>(
        &self,
        column: C,
        read: impl Fn(&Holder) -> Result<Option<T>, ParamError>,
    ) -> Result<Vec<T>, ParamError>
    where
        C: Column,
    {
        let mut out = Vec::new();
        for holder in self.get_array(column)? {
            if let Some(value) = read(holder)? {
                out.push(value);
            }
        }
        Ok(out)
    }
}

/// Result of a parameter query: the matched rows in declaration order.
///
/// A query against a non-nullable parameter never produces an empty value;
/// it fails with [`ParamError::NoValueFound`] instead.
#[derive(Debug, Clone)]
pub struct ParamValue {
    parameter: String,
    source: String,
    identify_entries: bool,
    rows: Vec<Row>,
}

impl ParamValue {
    pub(crate) fn new(
        parameter: String,
        source: String,
        identify_entries: bool,
        rows: Vec<Row>,
    ) -> Self {
        Self {
            parameter,
            source,
            identify_entries,
            rows,
        }
    }

    #[must_use]
    pub fn parameter(&self) -> &str {
        &self.parameter
    }

    /// Name of the repository the parameter was loaded from.
    #[must_use]
    pub fn source_repository(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// # Errors
    ///
    /// Returns [`ParamError::RowOutOfBounds`] if there is no row `index`.
    pub fn row(&self, index: usize) -> Result<&Row, ParamError> {
        self.rows.get(index).ok_or(ParamError::RowOutOfBounds {
            row: index,
            len: self.rows.len(),
        })
    }

    /// The first row.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::RowOutOfBounds`] if the value is empty.
    pub fn first(&self) -> Result<&Row, ParamError> {
        self.row(0)
    }

    /// Key of the entry behind row `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::KeyNotSupported`] unless the parameter identifies
    /// its entries, and [`ParamError::RowOutOfBounds`] for a missing row.
    pub fn key(&self, index: usize) -> Result<Option<&str>, ParamError> {
        if !self.identify_entries {
            return Err(ParamError::KeyNotSupported {
                parameter: self.parameter.clone(),
            });
        }
        Ok(self.row(index)?.key())
    }

    /// Single value of `column` in the first row.
    pub fn get<C: Column>(&self, column: C) -> Result<&Holder, ParamError> {
        self.first()?.get(column)
    }

    pub fn get_array<C: Column>(&self, column: C) -> Result<&[Holder], ParamError> {
        self.first()?.get_array(column)
    }

    pub fn get_string<C: Column>(&self, column: C) -> Result<Option<String>, ParamError> {
        self.first()?.get_string(column)
    }

    pub fn get_integer<C: Column>(&self, column: C) -> Result<Option<i64>, ParamError> {
        self.first()?.get_integer(column)
    }

    pub fn get_decimal<C: Column>(&self, column: C) -> Result<Option<Decimal>, ParamError> {
        self.first()?.get_decimal(column)
    }

    pub fn get_boolean<C: Column>(&self, column: C) -> Result<Option<bool>, ParamError> {
        self.first()?.get_boolean(column)
    }

    pub fn get_date<C: Column>(&self, column: C) -> Result<Option<NaiveDate>, ParamError> {
        self.first()?.get_date(column)
    }

    pub fn get_string_array<C: Column>(&self, column: C) -> Result<Vec<String>, ParamError> {
        self.first()?.get_string_array(column)
    }

    pub fn get_integer_array<C: Column>(&self, column: C) -> Result<Vec<i64>, ParamError> {
        self.first()?.get_integer_array(column)
    }

    pub fn get_decimal_array<C: Column>(&self, column: C) -> Result<Vec<Decimal>, ParamError> {
        self.first()?.get_decimal_array(column)
    }

    pub fn get_boolean_array<C: Column>(&self, column: C) -> Result<Vec<bool>, ParamError> {
        self.first()?.get_boolean_array(column)
    }

    pub fn get_date_array<C: Column>(&self, column: C) -> Result<Vec<NaiveDate>, ParamError> {
        self.first()?.get_date_array(column)
    }
}

impl<'a> IntoIterator for &'a ParamValue {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Raw patterns of a matched entry, addressable by level position or name.
#[derive(Debug, Clone)]
pub struct DetailedEntry {
    patterns: Vec<Option<String>>,
    key: Option<String>,
    levels: Arc<[Option<String>]>,
}

impl DetailedEntry {
    pub(crate) fn new(
        patterns: Vec<Option<String>>,
        key: Option<String>,
        levels: Arc<[Option<String>]>,
    ) -> Self {
        Self {
            patterns,
            key,
            levels,
        }
    }

    /// Stored pattern of a level, `None` for a null pattern or missing level.
    #[must_use]
    pub fn pattern<C: Column>(&self, level: C) -> Option<&str> {
        level
            .position(&self.levels)
            .and_then(|at| self.patterns.get(at))
            .and_then(Option::as_deref)
    }

    #[must_use]
    pub fn patterns(&self) -> &[Option<String>] {
        &self.patterns
    }

    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }
}

/// A [`ParamValue`] together with the raw entries behind each row.
#[derive(Debug, Clone)]
pub struct DetailedParamValue {
    value: ParamValue,
    entries: Vec<DetailedEntry>,
}

impl DetailedParamValue {
    pub(crate) fn new(value: ParamValue, entries: Vec<DetailedEntry>) -> Self {
        Self { value, entries }
    }

    #[must_use]
    pub fn value(&self) -> &ParamValue {
        &self.value
    }

    #[must_use]
    pub fn into_value(self) -> ParamValue {
        self.value
    }

    /// One entry per row, in the same order.
    #[must_use]
    pub fn entries(&self) -> &[DetailedEntry] {
        &self.entries
    }

    /// # Errors
    ///
    /// Returns [`ParamError::RowOutOfBounds`] if there is no entry `index`.
    pub fn entry(&self, index: usize) -> Result<&DetailedEntry, ParamError> {
        self.entries.get(index).ok_or(ParamError::RowOutOfBounds {
            row: index,
            len: self.entries.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Arc<[Option<String>]> {
        Arc::from(vec![Some("rate".to_owned()), Some("codes".to_owned()), None])
    }

    fn row() -> Row {
        Row::new(
            vec![
                Cell::Value(Holder::Integer(11)),
                Cell::Array(vec![
                    Holder::String("B".into()),
                    Holder::Null,
                    Holder::String("C".into()),
                ]),
                Cell::Value(Holder::Null),
            ],
            Some("row-1".into()),
            columns(),
        )
    }

    #[test]
    fn access_by_index_and_name() {
        let row = row();
        assert_eq!(row.get_integer(0).unwrap(), Some(11));
        assert_eq!(row.get_integer("rate").unwrap(), Some(11));
        assert_eq!(row.get_string(2).unwrap(), None);
    }

    #[test]
    fn unknown_column() {
        let err = row().get("missing").unwrap_err();
        assert_eq!(err.to_string(), "no output column 'missing'");
        assert!(row().get(7).is_err());
    }

    #[test]
    fn array_shape_checks() {
        let row = row();
        assert_eq!(row.get_string_array("codes").unwrap(), vec!["B", "C"]);
        assert_eq!(row.get_array(1).unwrap().len(), 3);
        assert!(matches!(
            row.get(1),
            Err(ParamError::WrongColumnShape { array: true, .. })
        ));
        assert!(matches!(
            row.get_array(0),
            Err(ParamError::WrongColumnShape { array: false, .. })
        ));
    }

    #[test]
    fn keys_require_identified_entries() {
        let value = ParamValue::new("p".into(), "db".into(), false, vec![row()]);
        assert!(matches!(value.key(0), Err(ParamError::KeyNotSupported { .. })));

        let value = ParamValue::new("p".into(), "db".into(), true, vec![row()]);
        assert_eq!(value.key(0).unwrap(), Some("row-1"));
    }

    #[test]
    fn row_out_of_bounds() {
        let value = ParamValue::new("p".into(), "db".into(), false, Vec::new());
        assert!(value.is_empty());
        let err = value.first().unwrap_err();
        assert_eq!(err.to_string(), "row 0 out of bounds for value with 0 rows");
    }

    #[test]
    fn first_row_typed_arrays() {
        let day = NaiveDate::from_ymd_opt(2013, 1, 27).unwrap();
        let columns: Arc<[Option<String>]> = Arc::from(vec![
            Some("rates".to_owned()),
            Some("flags".to_owned()),
            Some("days".to_owned()),
        ]);
        let row = Row::new(
            vec![
                Cell::Array(vec![Holder::Decimal(Decimal::new(15, 1)), Holder::Null]),
                Cell::Array(vec![Holder::Boolean(true), Holder::Boolean(false)]),
                Cell::Array(vec![Holder::Date(day)]),
            ],
            None,
            columns,
        );
        let value = ParamValue::new("p".into(), "db".into(), false, vec![row]);

        assert_eq!(value.get_decimal_array("rates").unwrap(), vec![Decimal::new(15, 1)]);
        assert_eq!(value.get_boolean_array("flags").unwrap(), vec![true, false]);
        assert_eq!(value.get_date_array(2).unwrap(), vec![day]);
        assert!(value.get_date_array("rates").is_err());
    }

    #[test]
    fn iterates_rows() {
        let value = ParamValue::new("p".into(), "db".into(), false, vec![row(), row()]);
        assert_eq!(value.len(), 2);
        assert_eq!((&value).into_iter().count(), 2);
        assert_eq!(value.source_repository(), "db");
    }

    #[test]
    fn detailed_entry_patterns() {
        let levels: Arc<[Option<String>]> =
            Arc::from(vec![Some("code".to_owned()), None]);
        let entry = DetailedEntry::new(vec![Some("A".into()), None], None, levels);
        assert_eq!(entry.pattern("code"), Some("A"));
        assert_eq!(entry.pattern(1), None);
        assert_eq!(entry.pattern("other"), None);
    }
}
