/// Pattern text that matches any query value at its level.
pub const WILDCARD: &str = "*";

/// Separator used to split array cells when a parameter names none.
pub const DEFAULT_ARRAY_SEPARATOR: char = ',';

/// A named decision table.
///
/// The first [`input_levels`](Self::input_levels) levels are matched against
/// the query; the remaining levels are output columns. Entries are kept in
/// declaration order, which decides between entries that match equally well.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Parameter {
    pub name: String,
    pub levels: Vec<Level>,
    pub input_levels: usize,
    pub entries: Vec<Entry>,
    /// An empty result is returned instead of an error when nothing matches.
    pub nullable: bool,
    /// Whether the level index is built once and kept in the cache.
    pub cacheable: bool,
    /// Whether entry keys are exposed in results.
    pub identify_entries: bool,
    pub array_separator: char,
}

impl Parameter {
    /// Start building a parameter. Defaults: not nullable, cacheable, entries
    /// not identified, `,` as array separator.
    #[must_use]
    pub fn builder(name: &str) -> ParameterBuilder {
        ParameterBuilder::new(name)
    }

    /// Number of output columns.
    #[must_use]
    pub fn output_levels(&self) -> usize {
        self.levels.len().saturating_sub(self.input_levels)
    }
}

/// Builder for [`Parameter`]. Levels receive their `order_no` from the order
/// in which they are added.
#[derive(Debug)]
pub struct ParameterBuilder {
    parameter: Parameter,
}

impl ParameterBuilder {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            parameter: Parameter {
                name: name.to_owned(),
                levels: Vec::new(),
                input_levels: 0,
                entries: Vec::new(),
                nullable: false,
                cacheable: true,
                identify_entries: false,
                array_separator: DEFAULT_ARRAY_SEPARATOR,
            },
        }
    }

    #[must_use]
    pub fn level(mut self, mut level: Level) -> Self {
        level.order_no = self.parameter.levels.len();
        self.parameter.levels.push(level);
        self
    }

    #[must_use]
    pub fn input_levels(mut self, count: usize) -> Self {
        self.parameter.input_levels = count;
        self
    }

    #[must_use]
    pub fn entry(mut self, entry: Entry) -> Self {
        self.parameter.entries.push(entry);
        self
    }

    #[must_use]
    pub fn entries(mut self, entries: impl IntoIterator<Item = Entry>) -> Self {
        self.parameter.entries.extend(entries);
        self
    }

    #[must_use]
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.parameter.nullable = nullable;
        self
    }

    #[must_use]
    pub fn cacheable(mut self, cacheable: bool) -> Self {
        self.parameter.cacheable = cacheable;
        self
    }

    #[must_use]
    pub fn identify_entries(mut self, identify: bool) -> Self {
        self.parameter.identify_entries = identify;
        self
    }

    #[must_use]
    pub fn array_separator(mut self, separator: char) -> Self {
        self.parameter.array_separator = separator;
        self
    }

    #[must_use]
    pub fn build(self) -> Parameter {
        self.parameter
    }
}

/// One column of a parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Level {
    pub order_no: usize,
    pub name: Option<String>,
    pub type_code: String,
    /// Matcher code; `None` selects the registry default.
    pub matcher: Option<String>,
    /// Output cells of an array level hold several values.
    pub array: bool,
    /// Name of the level creator that derives this level's query value from
    /// a context.
    pub level_creator: Option<String>,
}

impl Level {
    #[must_use]
    pub fn new(type_code: &str) -> Self {
        Self {
            order_no: 0,
            name: None,
            type_code: type_code.to_owned(),
            matcher: None,
            array: false,
            level_creator: None,
        }
    }

    #[must_use]
    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_owned());
        self
    }

    #[must_use]
    pub fn matcher(mut self, code: &str) -> Self {
        self.matcher = Some(code.to_owned());
        self
    }

    #[must_use]
    pub fn array(mut self) -> Self {
        self.array = true;
        self
    }

    #[must_use]
    pub fn level_creator(mut self, creator: &str) -> Self {
        self.level_creator = Some(creator.to_owned());
        self
    }

    /// The level's name, or `#<order_no>` when unnamed.
    #[must_use]
    pub fn label(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("#{}", self.order_no))
    }
}

/// Anything usable as a single stored pattern: text, or an explicit null.
pub trait IntoPattern {
    fn into_pattern(self) -> Option<String>;
}

impl IntoPattern for &str {
    fn into_pattern(self) -> Option<String> {
        Some(self.to_owned())
    }
}

impl IntoPattern for String {
    fn into_pattern(self) -> Option<String> {
        Some(self)
    }
}

impl IntoPattern for Option<&str> {
    fn into_pattern(self) -> Option<String> {
        self.map(str::to_owned)
    }
}

impl IntoPattern for Option<String> {
    fn into_pattern(self) -> Option<String> {
        self
    }
}

/// One row of a parameter: a pattern per level.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Entry {
    pub patterns: Vec<Option<String>>,
    pub key: Option<String>,
    /// Function invoked at match time; its result replaces the first output
    /// cell.
    pub function: Option<String>,
}

impl Entry {
    /// # Example
    ///
    /// ```
    /// use smartparam::Entry;
    ///
    /// let row = Entry::new([Some("A"), None, Some("11")]);
    /// assert_eq!(row.patterns[1], None);
    /// let row = Entry::new(["A", "*", "11"]).with_key("row-1");
    /// assert_eq!(row.key.as_deref(), Some("row-1"));
    /// ```
    #[must_use]
    pub fn new<P: IntoPattern>(patterns: impl IntoIterator<Item = P>) -> Self {
        Self {
            patterns: patterns.into_iter().map(IntoPattern::into_pattern).collect(),
            key: None,
            function: None,
        }
    }

    #[must_use]
    pub fn with_key(mut self, key: &str) -> Self {
        self.key = Some(key.to_owned());
        self
    }

    #[must_use]
    pub fn with_function(mut self, function: &str) -> Self {
        self.function = Some(function.to_owned());
        self
    }

    /// Pattern at `depth`, `None` for null or missing.
    #[must_use]
    pub fn pattern(&self, depth: usize) -> Option<&str> {
        self.patterns.get(depth).and_then(Option::as_deref)
    }
}
