//! Preparation of a loaded [`Parameter`] and the level index built from it.
//!
//! Preparation resolves every level's type and matcher, normalizes the input
//! patterns of exact-matcher levels and decodes output cells once. For
//! cacheable parameters the prepared entries are then partitioned into a
//! [`LevelIndex`]: one tree level per input level, concrete patterns first
//! (in declaration order), the wildcard branch last.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::matchers::{Matcher, MatcherRegistry};
use crate::types::{Cell, Entry, Holder, Level, Parameter, WILDCARD};
use crate::value_types::{ParamType, TypeRegistry};
use crate::ParamError;

/// A level with its type and matcher resolved.
#[derive(Debug, Clone)]
pub(crate) struct PreparedLevel {
    pub(crate) label: String,
    pub(crate) ty: Arc<dyn ParamType>,
    pub(crate) matcher: Arc<dyn Matcher>,
    pub(crate) array: bool,
    pub(crate) level_creator: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct PreparedEntry {
    /// Patterns as stored, one per level.
    pub(crate) raw: Vec<Option<String>>,
    /// Normalized input patterns.
    pub(crate) input: Vec<Option<String>>,
    /// Decoded output cells.
    pub(crate) cells: Vec<Cell>,
    pub(crate) key: Option<String>,
    pub(crate) function: Option<String>,
}

/// A parameter ready for querying. Immutable once built and shared through
/// the cache behind an `Arc`.
#[derive(Debug)]
pub struct PreparedParameter {
    name: String,
    source: String,
    input_levels: usize,
    nullable: bool,
    cacheable: bool,
    identify_entries: bool,
    array_separator: char,
    pub(crate) levels: Vec<PreparedLevel>,
    pub(crate) output_columns: Arc<[Option<String>]>,
    pub(crate) level_names: Arc<[Option<String>]>,
    pub(crate) index: Option<LevelIndex>,
}

impl PreparedParameter {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the repository the parameter was loaded from.
    #[must_use]
    pub fn source_repository(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn input_levels(&self) -> usize {
        self.input_levels
    }

    #[must_use]
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    #[must_use]
    pub fn is_cacheable(&self) -> bool {
        self.cacheable
    }

    #[must_use]
    pub fn identifies_entries(&self) -> bool {
        self.identify_entries
    }

    /// Number of indexed entries; `None` when the parameter is not cacheable
    /// and its entries are fetched per query.
    #[must_use]
    pub fn entry_count(&self) -> Option<usize> {
        self.index.as_ref().map(|index| index.entries.len())
    }

    pub(crate) fn input(&self) -> &[PreparedLevel] {
        &self.levels[..self.input_levels]
    }

    /// Type of the first output level, if the parameter has outputs.
    pub(crate) fn first_output(&self) -> Option<&PreparedLevel> {
        self.levels.get(self.input_levels)
    }

    /// Build a throwaway index over entries fetched for a single query.
    pub(crate) fn transient_index(&self, entries: &[Entry]) -> Result<LevelIndex, ParamError> {
        let prepared = self.prepare_entries(entries)?;
        Ok(LevelIndex::build(prepared, self.input_levels))
    }

    fn prepare_entries(&self, entries: &[Entry]) -> Result<Vec<PreparedEntry>, ParamError> {
        entries
            .iter()
            .enumerate()
            .map(|(at, entry)| self.prepare_entry(at, entry))
            .collect()
    }

    fn prepare_entry(&self, at: usize, entry: &Entry) -> Result<PreparedEntry, ParamError> {
        if entry.patterns.len() != self.levels.len() {
            return Err(self.malformed(format!(
                "entry {at} has {} patterns, expected {}",
                entry.patterns.len(),
                self.levels.len()
            )));
        }
        if entry.function.is_some() && self.first_output().is_none() {
            return Err(self.malformed(format!(
                "entry {at} names a function but the parameter has no output level"
            )));
        }

        let (input, output) = entry.patterns.split_at(self.input_levels);
        let input = self
            .input()
            .iter()
            .zip(input)
            .map(|(level, pattern)| normalize_pattern(level, pattern.as_deref()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut cells = Vec::with_capacity(output.len());
        for (depth, (level, pattern)) in self.levels[self.input_levels..]
            .iter()
            .zip(output)
            .enumerate()
        {
            if depth == 0 && entry.function.is_some() {
                cells.push(Cell::Value(Holder::Null));
                continue;
            }
            cells.push(decode_cell(level, pattern.as_deref(), self.array_separator)?);
        }

        Ok(PreparedEntry {
            raw: entry.patterns.clone(),
            input,
            cells,
            key: entry.key.clone(),
            function: entry.function.clone(),
        })
    }

    fn malformed(&self, reason: String) -> ParamError {
        ParamError::MalformedEntry {
            parameter: self.name.clone(),
            reason,
        }
    }
}

/// Resolve a loaded parameter against the registries and, when it is
/// cacheable, index its entries.
pub(crate) fn prepare(
    parameter: &Parameter,
    source: &str,
    types: &TypeRegistry,
    matchers: &MatcherRegistry,
) -> Result<PreparedParameter, ParamError> {
    if parameter.input_levels > parameter.levels.len() {
        return Err(ParamError::MalformedEntry {
            parameter: parameter.name.clone(),
            reason: format!(
                "{} input levels declared but only {} levels defined",
                parameter.input_levels,
                parameter.levels.len()
            ),
        });
    }

    let mut ordered: Vec<&Level> = parameter.levels.iter().collect();
    ordered.sort_by_key(|level| level.order_no);

    let levels = ordered
        .iter()
        .map(|level| {
            Ok(PreparedLevel {
                label: level.label(),
                ty: types.get(&level.type_code)?,
                matcher: matchers.resolve(level.matcher.as_deref())?,
                array: level.array,
                level_creator: level.level_creator.clone(),
            })
        })
        .collect::<Result<Vec<_>, ParamError>>()?;

    let names: Vec<Option<String>> = ordered.iter().map(|level| level.name.clone()).collect();

    let mut prepared = PreparedParameter {
        name: parameter.name.clone(),
        source: source.to_owned(),
        input_levels: parameter.input_levels,
        nullable: parameter.nullable,
        cacheable: parameter.cacheable,
        identify_entries: parameter.identify_entries,
        array_separator: parameter.array_separator,
        levels,
        output_columns: Arc::from(&names[parameter.input_levels..]),
        level_names: Arc::from(names),
        index: None,
    };

    if parameter.cacheable {
        let entries = prepared.prepare_entries(&parameter.entries)?;
        debug!(
            parameter = %parameter.name,
            entries = entries.len(),
            levels = prepared.input_levels,
            "level index built"
        );
        prepared.index = Some(LevelIndex::build(entries, prepared.input_levels));
    }
    Ok(prepared)
}

/// Patterns of exact-matcher levels are rewritten in the type's canonical
/// form so that lookups compare like with like. Wildcards and nulls are kept.
fn normalize_pattern(
    level: &PreparedLevel,
    pattern: Option<&str>,
) -> Result<Option<String>, ParamError> {
    match pattern {
        None => Ok(None),
        Some(WILDCARD) => Ok(Some(WILDCARD.to_owned())),
        Some(text) if level.matcher.exact() => {
            let holder = level.ty.decode(Some(text))?;
            Ok(level.ty.encode(&holder))
        }
        Some(text) => {
            level.matcher.validate(text, &*level.ty)?;
            Ok(Some(text.to_owned()))
        }
    }
}

fn decode_cell(
    level: &PreparedLevel,
    pattern: Option<&str>,
    separator: char,
) -> Result<Cell, ParamError> {
    if level.array {
        let text = match pattern {
            None | Some(WILDCARD) => return Ok(Cell::Array(Vec::new())),
            Some(text) if text.trim().is_empty() => return Ok(Cell::Array(Vec::new())),
            Some(text) => text,
        };
        let parts: Vec<&str> = text.split(separator).collect();
        let mut values = level.ty.new_array(parts.len());
        for part in parts {
            values.push(level.ty.decode(Some(part.trim()))?);
        }
        return Ok(Cell::Array(values));
    }
    match pattern {
        Some(WILDCARD) => Ok(Cell::Value(Holder::Null)),
        other => Ok(Cell::Value(level.ty.decode(other)?)),
    }
}

/// Prepared entries partitioned by input pattern, one tree level per input
/// level. Leaves hold entry positions in declaration order.
#[derive(Debug)]
pub(crate) struct LevelIndex {
    pub(crate) entries: Vec<PreparedEntry>,
    pub(crate) root: LevelNode,
}

#[derive(Debug, Default)]
pub(crate) struct LevelNode {
    /// Concrete patterns in first-declaration order.
    pub(crate) branches: IndexMap<String, LevelNode>,
    /// Entries with a null pattern at this level.
    pub(crate) null: Option<Box<LevelNode>>,
    /// Entries with the wildcard pattern at this level.
    pub(crate) default: Option<Box<LevelNode>>,
    pub(crate) leaves: Vec<usize>,
}

impl LevelIndex {
    pub(crate) fn build(entries: Vec<PreparedEntry>, input_levels: usize) -> Self {
        let members = (0..entries.len()).collect();
        let root = build_node(&entries, members, 0, input_levels);
        Self { entries, root }
    }
}

fn build_node(
    entries: &[PreparedEntry],
    members: Vec<usize>,
    depth: usize,
    input_levels: usize,
) -> LevelNode {
    if depth == input_levels {
        return LevelNode {
            leaves: members,
            ..LevelNode::default()
        };
    }

    let mut concrete: IndexMap<String, Vec<usize>> = IndexMap::new();
    let mut null = Vec::new();
    let mut wildcard = Vec::new();
    for at in members {
        match entries[at].input[depth].as_deref() {
            None => null.push(at),
            Some(WILDCARD) => wildcard.push(at),
            Some(pattern) => concrete.entry(pattern.to_owned()).or_default().push(at),
        }
    }

    let child = |members: Vec<usize>| build_node(entries, members, depth + 1, input_levels);
    LevelNode {
        branches: concrete
            .into_iter()
            .map(|(pattern, members)| (pattern, child(members)))
            .collect(),
        null: (!null.is_empty()).then(|| Box::new(child(null))),
        default: (!wildcard.is_empty()).then(|| Box::new(child(wildcard))),
        leaves: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Level;

    fn prepare_default(parameter: &Parameter) -> Result<PreparedParameter, ParamError> {
        prepare(
            parameter,
            "test",
            &TypeRegistry::with_builtins(),
            &MatcherRegistry::with_builtins(),
        )
    }

    fn two_level() -> Parameter {
        Parameter::builder("p")
            .level(Level::new("string").named("code"))
            .level(Level::new("integer").named("rate"))
            .input_levels(1)
            .entry(Entry::new(["A", "1"]))
            .entry(Entry::new(["*", "2"]))
            .entry(Entry::new(["B", "3"]))
            .entry(Entry::new(["A", "4"]))
            .entry(Entry::new([None, Some("5")]))
            .build()
    }

    #[test]
    fn partitions_by_pattern() {
        let prepared = prepare_default(&two_level()).unwrap();
        let index = prepared.index.as_ref().unwrap();
        let root = &index.root;
        assert_eq!(root.branches.keys().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(root.branches["A"].leaves, vec![0, 3]);
        assert_eq!(root.default.as_ref().unwrap().leaves, vec![1]);
        assert_eq!(root.null.as_ref().unwrap().leaves, vec![4]);
    }

    #[test]
    fn zero_input_levels_keeps_everything_at_root() {
        let param = Parameter::builder("p")
            .level(Level::new("integer"))
            .entry(Entry::new(["1"]))
            .entry(Entry::new(["2"]))
            .build();
        let prepared = prepare_default(&param).unwrap();
        assert_eq!(prepared.index.unwrap().root.leaves, vec![0, 1]);
    }

    #[test]
    fn exact_patterns_are_normalized() {
        let param = Parameter::builder("p")
            .level(Level::new("date"))
            .level(Level::new("integer"))
            .input_levels(1)
            .entry(Entry::new(["27/01/2013", "1"]))
            .build();
        let prepared = prepare_default(&param).unwrap();
        let entry = &prepared.index.unwrap().entries[0];
        assert_eq!(entry.input[0].as_deref(), Some("2013-01-27"));
        assert_eq!(entry.raw[0].as_deref(), Some("27/01/2013"));
    }

    #[test]
    fn range_patterns_are_kept_verbatim() {
        let param = Parameter::builder("p")
            .level(Level::new("integer").matcher("between/ie"))
            .level(Level::new("string"))
            .input_levels(1)
            .entry(Entry::new(["1 - 10", "x"]))
            .build();
        let prepared = prepare_default(&param).unwrap();
        assert_eq!(
            prepared.index.unwrap().entries[0].input[0].as_deref(),
            Some("1 - 10")
        );
    }

    #[test]
    fn undecodable_range_bound_rejected() {
        let param = Parameter::builder("p")
            .level(Level::new("integer").matcher("between/ie"))
            .level(Level::new("string"))
            .input_levels(1)
            .entry(Entry::new(["1 ~ 10", "x"]))
            .entry(Entry::new(["x ~ 20", "y"]))
            .build();
        let err = prepare_default(&param).unwrap_err();
        assert!(matches!(err, ParamError::TypeConversion(ref e) if e.input == "x"));
    }

    #[test]
    fn output_cells_are_decoded() {
        let param = Parameter::builder("p")
            .level(Level::new("string"))
            .level(Level::new("integer"))
            .level(Level::new("string").array())
            .level(Level::new("integer"))
            .input_levels(1)
            .entry(Entry::new(["A", "11", "B, C", "*"]))
            .build();
        let prepared = prepare_default(&param).unwrap();
        let cells = &prepared.index.unwrap().entries[0].cells;
        assert_eq!(cells[0], Cell::Value(Holder::Integer(11)));
        assert_eq!(
            cells[1],
            Cell::Array(vec![Holder::String("B".into()), Holder::String("C".into())])
        );
        assert_eq!(cells[2], Cell::Value(Holder::Null));
    }

    #[test]
    fn custom_array_separator() {
        let param = Parameter::builder("p")
            .level(Level::new("integer").array())
            .array_separator(';')
            .entry(Entry::new(["1;2;3"]))
            .build();
        let prepared = prepare_default(&param).unwrap();
        assert_eq!(
            prepared.index.unwrap().entries[0].cells[0],
            Cell::Array(vec![Holder::Integer(1), Holder::Integer(2), Holder::Integer(3)])
        );
    }

    #[test]
    fn arity_mismatch_is_malformed() {
        let param = Parameter::builder("p")
            .level(Level::new("string"))
            .level(Level::new("string"))
            .input_levels(1)
            .entry(Entry::new(["A"]))
            .build();
        let err = prepare_default(&param).unwrap_err();
        assert_eq!(
            err.to_string(),
            "malformed parameter 'p': entry 0 has 1 patterns, expected 2"
        );
    }

    #[test]
    fn too_many_input_levels() {
        let param = Parameter::builder("p")
            .level(Level::new("string"))
            .input_levels(2)
            .build();
        assert!(matches!(
            prepare_default(&param),
            Err(ParamError::MalformedEntry { .. })
        ));
    }

    #[test]
    fn unknown_type_and_matcher() {
        let param = Parameter::builder("p").level(Level::new("money")).build();
        assert!(matches!(
            prepare_default(&param),
            Err(ParamError::UnknownType { .. })
        ));

        let param = Parameter::builder("p")
            .level(Level::new("string").matcher("regex"))
            .build();
        assert!(matches!(
            prepare_default(&param),
            Err(ParamError::UnknownMatcher { .. })
        ));
    }

    #[test]
    fn undecodable_output_is_a_conversion_error() {
        let param = Parameter::builder("p")
            .level(Level::new("string"))
            .level(Level::new("integer"))
            .input_levels(1)
            .entry(Entry::new(["A", "eleven"]))
            .build();
        assert!(matches!(
            prepare_default(&param),
            Err(ParamError::TypeConversion(_))
        ));
    }

    #[test]
    fn noncacheable_is_not_indexed() {
        let mut param = two_level();
        param.cacheable = false;
        let prepared = prepare_default(&param).unwrap();
        assert_eq!(prepared.entry_count(), None);
        let index = prepared.transient_index(&param.entries).unwrap();
        assert_eq!(index.entries.len(), 5);
    }

    #[test]
    fn function_entries_skip_first_output_decoding() {
        let param = Parameter::builder("p")
            .level(Level::new("string"))
            .level(Level::new("integer"))
            .input_levels(1)
            .entry(Entry::new(["A", "not-a-number"]).with_function("calc"))
            .build();
        let prepared = prepare_default(&param).unwrap();
        assert_eq!(
            prepared.index.unwrap().entries[0].cells[0],
            Cell::Value(Holder::Null)
        );
    }
}
