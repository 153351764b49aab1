//! Depth-first search of a [`LevelIndex`] with backtracking.
//!
//! At every level the concrete branches accepted by the level's matcher are
//! tried first, in declaration order, and the wildcard branch last. The first
//! path that reaches a non-empty set of leaves wins, so an entry that is more
//! specific at an earlier level beats one that is more specific at a later
//! level. The walk keeps an explicit stack of frames and never recurses.

use tracing::trace;

use crate::index::{LevelIndex, LevelNode, PreparedLevel};
use crate::types::ConversionError;

/// Candidate children of one visited node, with a cursor to the next one.
struct Frame<'a> {
    candidates: Vec<&'a LevelNode>,
    next: usize,
}

/// Find the leaves reached by `query`, one normalized value per input level.
///
/// Returns `None` when every path is exhausted.
pub(crate) fn search<'a>(
    index: &'a LevelIndex,
    levels: &[PreparedLevel],
    query: &[Option<String>],
) -> Result<Option<&'a [usize]>, ConversionError> {
    debug_assert_eq!(levels.len(), query.len());

    if query.is_empty() {
        return Ok(non_empty(&index.root.leaves));
    }

    let mut stack = vec![Frame {
        candidates: candidates(&index.root, &levels[0], query[0].as_deref())?,
        next: 0,
    }];

    while let Some(frame) = stack.last_mut() {
        let Some(&node) = frame.candidates.get(frame.next) else {
            stack.pop();
            trace!(depth = stack.len(), "level exhausted, backtracking");
            continue;
        };
        frame.next += 1;

        let depth = stack.len();
        if depth == query.len() {
            if let Some(leaves) = non_empty(&node.leaves) {
                return Ok(Some(leaves));
            }
            continue;
        }

        let next = candidates(node, &levels[depth], query[depth].as_deref())?;
        stack.push(Frame {
            candidates: next,
            next: 0,
        });
    }
    Ok(None)
}

fn non_empty(leaves: &[usize]) -> Option<&[usize]> {
    (!leaves.is_empty()).then_some(leaves)
}

/// Children of `node` worth visiting for `value`: matching concrete branches,
/// then the wildcard branch.
fn candidates<'a>(
    node: &'a LevelNode,
    level: &PreparedLevel,
    value: Option<&str>,
) -> Result<Vec<&'a LevelNode>, ConversionError> {
    let mut out = Vec::new();
    match value {
        None => out.extend(node.null.as_deref()),
        Some(value) if level.matcher.exact() => {
            if !value.trim().is_empty() {
                out.extend(node.branches.get(value));
            }
        }
        Some(value) => {
            for (pattern, child) in &node.branches {
                if level.matcher.matches(Some(value), pattern, &*level.ty)? {
                    out.push(child);
                }
            }
        }
    }
    out.extend(node.default.as_deref());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::prepare;
    use crate::types::{Entry, Level, Parameter};
    use crate::{MatcherRegistry, TypeRegistry};

    fn matched_rows(parameter: &Parameter, query: &[Option<&str>]) -> Option<Vec<usize>> {
        let prepared = prepare(
            parameter,
            "test",
            &TypeRegistry::with_builtins(),
            &MatcherRegistry::with_builtins(),
        )
        .unwrap();
        let index = prepared.index.as_ref().unwrap();
        let query: Vec<Option<String>> = query.iter().map(|v| v.map(str::to_owned)).collect();
        search(index, prepared.input(), &query)
            .unwrap()
            .map(<[usize]>::to_vec)
    }

    fn three_level() -> Parameter {
        Parameter::builder("p")
            .level(Level::new("string"))
            .level(Level::new("string"))
            .level(Level::new("integer"))
            .input_levels(2)
            .entry(Entry::new(["A", "F", "11"]))
            .entry(Entry::new(["A", "*", "12"]))
            .entry(Entry::new(["*", "F", "13"]))
            .entry(Entry::new(["*", "*", "14"]))
            .build()
    }

    #[test]
    fn exact_path_wins() {
        assert_eq!(matched_rows(&three_level(), &[Some("A"), Some("F")]), Some(vec![0]));
    }

    #[test]
    fn earlier_level_specificity_wins() {
        // Both A/* and */F match; the concrete first level decides.
        let param = Parameter::builder("p")
            .level(Level::new("string"))
            .level(Level::new("string"))
            .level(Level::new("integer"))
            .input_levels(2)
            .entry(Entry::new(["*", "F", "13"]))
            .entry(Entry::new(["A", "*", "12"]))
            .build();
        assert_eq!(matched_rows(&param, &[Some("A"), Some("F")]), Some(vec![1]));
    }

    #[test]
    fn backtracks_to_wildcard() {
        assert_eq!(matched_rows(&three_level(), &[Some("A"), Some("X")]), Some(vec![1]));
        assert_eq!(matched_rows(&three_level(), &[Some("B"), Some("F")]), Some(vec![2]));
        assert_eq!(matched_rows(&three_level(), &[Some("B"), Some("X")]), Some(vec![3]));
    }

    #[test]
    fn dead_end_backtracks_past_first_level() {
        let param = Parameter::builder("p")
            .level(Level::new("string"))
            .level(Level::new("string"))
            .level(Level::new("integer"))
            .input_levels(2)
            .entry(Entry::new(["A", "F", "11"]))
            .entry(Entry::new(["*", "G", "12"]))
            .build();
        assert_eq!(matched_rows(&param, &[Some("A"), Some("G")]), Some(vec![1]));
        assert_eq!(matched_rows(&param, &[Some("A"), Some("H")]), None);
    }

    #[test]
    fn duplicates_are_returned_together() {
        let param = Parameter::builder("p")
            .level(Level::new("string"))
            .level(Level::new("integer"))
            .input_levels(1)
            .entry(Entry::new(["A", "1"]))
            .entry(Entry::new(["B", "2"]))
            .entry(Entry::new(["A", "3"]))
            .build();
        assert_eq!(matched_rows(&param, &[Some("A")]), Some(vec![0, 2]));
    }

    #[test]
    fn null_matches_null_or_wildcard_only() {
        let param = Parameter::builder("p")
            .level(Level::new("string"))
            .level(Level::new("integer"))
            .input_levels(1)
            .entry(Entry::new([Some("A"), Some("1")]))
            .entry(Entry::new([None, Some("2")]))
            .build();
        assert_eq!(matched_rows(&param, &[None]), Some(vec![1]));
        assert_eq!(matched_rows(&param, &[Some("B")]), None);
    }

    #[test]
    fn blank_value_takes_wildcard() {
        assert_eq!(matched_rows(&three_level(), &[Some(""), Some("F")]), Some(vec![2]));
    }

    #[test]
    fn range_levels_try_each_matching_branch() {
        let param = Parameter::builder("p")
            .level(Level::new("integer").matcher("between/ie"))
            .level(Level::new("string"))
            .level(Level::new("string"))
            .input_levels(2)
            .entry(Entry::new(["1 ~ 10", "X", "first"]))
            .entry(Entry::new(["5 ~ 20", "Y", "second"]))
            .build();
        // 7 is in both ranges; only the second has a Y child.
        assert_eq!(matched_rows(&param, &[Some("7"), Some("Y")]), Some(vec![1]));
        assert_eq!(matched_rows(&param, &[Some("15"), Some("X")]), None);
    }

    #[test]
    fn zero_input_levels() {
        let param = Parameter::builder("p")
            .level(Level::new("integer"))
            .entry(Entry::new(["1"]))
            .build();
        assert_eq!(matched_rows(&param, &[]), Some(vec![0]));
    }
}
