use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::cache::PreparedParamCache;
use crate::index::{prepare, LevelIndex, PreparedEntry, PreparedParameter};
use crate::matchers::{Matcher, MatcherRegistry};
use crate::repository::{FunctionProvider, ParamRepository};
use crate::types::{
    Cell, Context, DetailedEntry, DetailedParamValue, Entry, Holder, Parameter, ParamValue, Row,
    Value,
};
use crate::value_types::{ParamType, TypeRegistry};
use crate::walker;
use crate::ParamError;

/// Derives one query value from a [`Context`].
pub type LevelCreator = Arc<dyn Fn(&Context) -> Value + Send + Sync>;

/// Builder for [`ParamEngine`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use smartparam::{Entry, Level, ParamEngine, Parameter, StaticRepository};
///
/// let repo = StaticRepository::new().with(
///     Parameter::builder("discount")
///         .level(Level::new("string").named("tier"))
///         .level(Level::new("integer").named("percent"))
///         .input_levels(1)
///         .entry(Entry::new(["gold", "15"]))
///         .entry(Entry::new(["*", "0"]))
///         .build(),
/// );
/// let engine = ParamEngine::builder().repository("memory", Arc::new(repo)).build();
///
/// let value = engine.get("discount", ["gold"]).unwrap();
/// assert_eq!(value.get_integer("percent").unwrap(), Some(15));
/// ```
pub struct ParamEngineBuilder {
    repositories: Vec<(String, Arc<dyn ParamRepository>)>,
    types: TypeRegistry,
    matchers: MatcherRegistry,
    function_provider: Option<Arc<dyn FunctionProvider>>,
    level_creators: HashMap<String, LevelCreator>,
    cache: Option<Arc<PreparedParamCache>>,
}

impl Default for ParamEngineBuilder {
    fn default() -> Self {
        Self {
            repositories: Vec::new(),
            types: TypeRegistry::with_builtins(),
            matchers: MatcherRegistry::with_builtins(),
            function_provider: None,
            level_creators: HashMap::new(),
            cache: None,
        }
    }
}

impl ParamEngineBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a repository. Repositories are searched in the order added and
    /// the first one that defines a parameter wins.
    #[must_use]
    pub fn repository<R: ParamRepository + 'static>(mut self, name: &str, repository: Arc<R>) -> Self {
        let repository: Arc<dyn ParamRepository> = repository;
        self.repositories.push((name.to_owned(), repository));
        self
    }

    /// Register a level type under `code`.
    #[must_use]
    pub fn param_type(mut self, code: &str, ty: impl ParamType + 'static) -> Self {
        self.types.register(code, ty);
        self
    }

    /// Register a matcher under `code`.
    #[must_use]
    pub fn matcher(mut self, code: &str, matcher: impl Matcher + 'static) -> Self {
        self.matchers.register(code, matcher);
        self
    }

    /// Matcher for levels that name none.
    #[must_use]
    pub fn default_matcher(mut self, matcher: impl Matcher + 'static) -> Self {
        self.matchers.set_default(matcher);
        self
    }

    #[must_use]
    pub fn function_provider<P: FunctionProvider + 'static>(mut self, provider: Arc<P>) -> Self {
        let provider: Arc<dyn FunctionProvider> = provider;
        self.function_provider = Some(provider);
        self
    }

    /// Register a level creator, referenced from [`Level::level_creator`](crate::Level::level_creator).
    #[must_use]
    pub fn level_creator(
        mut self,
        name: &str,
        creator: impl Fn(&Context) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.level_creators.insert(name.to_owned(), Arc::new(creator));
        self
    }

    /// Share a cache with other engines. Each engine gets its own otherwise.
    #[must_use]
    pub fn cache(mut self, cache: Arc<PreparedParamCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    #[must_use]
    pub fn build(self) -> ParamEngine {
        ParamEngine {
            repositories: self.repositories,
            types: self.types,
            matchers: self.matchers,
            function_provider: self.function_provider,
            level_creators: self.level_creators,
            cache: self.cache.unwrap_or_default(),
        }
    }
}

impl fmt::Debug for ParamEngineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamEngineBuilder")
            .field("repositories", &repository_names(&self.repositories))
            .field("types", &self.types.codes())
            .field("matchers", &self.matchers.codes())
            .field("level_creators", &sorted_keys(&self.level_creators))
            .finish_non_exhaustive()
    }
}

/// Snapshot of an engine's configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RuntimeConfig {
    pub repositories: Vec<String>,
    pub types: Vec<String>,
    pub matchers: Vec<String>,
    pub level_creators: Vec<String>,
    pub function_provider: bool,
    pub cached_parameters: Vec<String>,
}

/// Query facade. Thread-safe; share it behind an `Arc`.
pub struct ParamEngine {
    repositories: Vec<(String, Arc<dyn ParamRepository>)>,
    types: TypeRegistry,
    matchers: MatcherRegistry,
    function_provider: Option<Arc<dyn FunctionProvider>>,
    level_creators: HashMap<String, LevelCreator>,
    cache: Arc<PreparedParamCache>,
}

impl fmt::Debug for ParamEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamEngine")
            .field("repositories", &repository_names(&self.repositories))
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl ParamEngine {
    #[must_use]
    pub fn builder() -> ParamEngineBuilder {
        ParamEngineBuilder::new()
    }

    /// Query a parameter with one value per input level.
    ///
    /// # Errors
    ///
    /// - [`ParamError::UnknownParameter`] if no repository defines `name`
    /// - [`ParamError::InvalidQueryArity`] if the number of values is wrong
    /// - [`ParamError::TypeConversion`] if a value is rejected by its level type
    /// - [`ParamError::NoValueFound`] if nothing matches and the parameter is
    ///   not nullable
    pub fn get<I, V>(&self, name: &str, values: I) -> Result<ParamValue, ParamError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        let prepared = self.prepared(name)?;
        self.evaluate(&prepared, &values, false).map(|(value, _)| value)
    }

    /// Query a parameter with values taken from a context: its explicit level
    /// values if set, otherwise one value per input level from that level's
    /// creator.
    ///
    /// # Errors
    ///
    /// As [`get`](Self::get), plus [`ParamError::UnresolvableLevelValue`] if a
    /// level has no registered creator.
    pub fn get_with_context(&self, name: &str, ctx: &Context) -> Result<ParamValue, ParamError> {
        let prepared = self.prepared(name)?;
        let values = self.level_values(&prepared, ctx)?;
        self.evaluate(&prepared, &values, false).map(|(value, _)| value)
    }

    /// Like [`get`](Self::get), also returning the stored patterns of every
    /// matched entry.
    ///
    /// # Errors
    ///
    /// As [`get`](Self::get).
    pub fn get_detailed<I, V>(&self, name: &str, values: I) -> Result<DetailedParamValue, ParamError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        let prepared = self.prepared(name)?;
        let (value, entries) = self.evaluate(&prepared, &values, true)?;
        Ok(DetailedParamValue::new(value, entries))
    }

    /// Invoke a function through the configured provider.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::MissingFunctionProvider`] without a provider, or
    /// the provider's [`FunctionError`](crate::FunctionError).
    pub fn call_function(&self, function: &str, args: &[Value]) -> Result<Value, ParamError> {
        let provider = self
            .function_provider
            .as_ref()
            .ok_or(ParamError::MissingFunctionProvider)?;
        debug!(function, args = args.len(), "invoking function");
        Ok(provider.invoke(function, args)?)
    }

    /// Query a parameter whose first output cell names a function, then call
    /// that function with `args`.
    ///
    /// # Errors
    ///
    /// As [`get`](Self::get) and [`call_function`](Self::call_function), plus
    /// [`ParamError::InvalidFunctionToCall`] if the first cell is not a string.
    pub fn call_evaluated_function<I, V>(
        &self,
        name: &str,
        values: I,
        args: &[Value],
    ) -> Result<Value, ParamError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let value = self.get(name, values)?;
        let function = match value.first()?.cells().first() {
            Some(Cell::Value(Holder::String(function))) => function.clone(),
            _ => {
                return Err(ParamError::InvalidFunctionToCall {
                    parameter: name.to_owned(),
                })
            }
        };
        self.call_function(&function, args)
    }

    /// The prepared form of a parameter, loading and preparing it on a miss.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::UnknownParameter`] or any preparation error.
    pub fn prepared(&self, name: &str) -> Result<Arc<PreparedParameter>, ParamError> {
        self.cache.get_or_try_prepare(name, || {
            let (source, parameter) = self.load(name)?;
            prepare(&parameter, source, &self.types, &self.matchers)
        })
    }

    /// Drop a parameter from the cache after its definition changed.
    pub fn invalidate(&self, name: &str) -> bool {
        self.cache.invalidate(name)
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<PreparedParamCache> {
        &self.cache
    }

    #[must_use]
    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            repositories: repository_names(&self.repositories),
            types: self.types.codes(),
            matchers: self.matchers.codes(),
            level_creators: sorted_keys(&self.level_creators),
            function_provider: self.function_provider.is_some(),
            cached_parameters: self.cache.names(),
        }
    }

    fn load(&self, name: &str) -> Result<(&str, Parameter), ParamError> {
        for (source, repository) in &self.repositories {
            if let Some(parameter) = repository.load(name) {
                debug!(parameter = name, repository = %source, "parameter loaded");
                return Ok((source.as_str(), parameter));
            }
        }
        Err(ParamError::UnknownParameter {
            name: name.to_owned(),
        })
    }

    fn find_entries(&self, prepared: &PreparedParameter, query: &[Option<String>]) -> Vec<Entry> {
        self.repositories
            .iter()
            .find(|(source, _)| source == prepared.source_repository())
            .map(|(_, repository)| repository.find_entries(prepared.name(), query))
            .unwrap_or_default()
    }

    fn level_values(
        &self,
        prepared: &PreparedParameter,
        ctx: &Context,
    ) -> Result<Vec<Value>, ParamError> {
        if let Some(values) = ctx.level_values() {
            return Ok(values.to_vec());
        }
        prepared
            .input()
            .iter()
            .map(|level| {
                let creator = level
                    .level_creator
                    .as_deref()
                    .and_then(|creator| self.level_creators.get(creator))
                    .ok_or_else(|| ParamError::UnresolvableLevelValue {
                        parameter: prepared.name().to_owned(),
                        level: level.label.clone(),
                    })?;
                Ok(creator(ctx))
            })
            .collect()
    }

    fn evaluate(
        &self,
        prepared: &PreparedParameter,
        values: &[Value],
        detailed: bool,
    ) -> Result<(ParamValue, Vec<DetailedEntry>), ParamError> {
        if values.len() != prepared.input_levels() {
            return Err(ParamError::InvalidQueryArity {
                parameter: prepared.name().to_owned(),
                expected: prepared.input_levels(),
                actual: values.len(),
            });
        }
        let query = normalize(prepared, values)?;

        let transient: LevelIndex;
        let index = match &prepared.index {
            Some(index) => index,
            None => {
                let entries = self.find_entries(prepared, &query);
                transient = prepared.transient_index(&entries)?;
                &transient
            }
        };

        let leaves = walker::search(index, prepared.input(), &query)?.unwrap_or(&[]);
        if leaves.is_empty() && !prepared.is_nullable() {
            return Err(ParamError::NoValueFound {
                parameter: prepared.name().to_owned(),
                values: query
                    .iter()
                    .map(|value| value.clone().unwrap_or_else(|| "null".to_owned()))
                    .collect(),
            });
        }
        trace!(parameter = prepared.name(), rows = leaves.len(), "query matched");

        let mut rows = Vec::with_capacity(leaves.len());
        let mut entries = Vec::new();
        for &at in leaves {
            let entry = &index.entries[at];
            rows.push(self.project(prepared, entry, &query)?);
            if detailed {
                entries.push(DetailedEntry::new(
                    entry.raw.clone(),
                    entry.key.clone(),
                    Arc::clone(&prepared.level_names),
                ));
            }
        }
        let value = ParamValue::new(
            prepared.name().to_owned(),
            prepared.source_repository().to_owned(),
            prepared.identifies_entries(),
            rows,
        );
        Ok((value, entries))
    }

    /// Build the output row of a matched entry. A function entry is invoked
    /// with the normalized query values.
    fn project(
        &self,
        prepared: &PreparedParameter,
        entry: &PreparedEntry,
        query: &[Option<String>],
    ) -> Result<Row, ParamError> {
        let mut cells = entry.cells.clone();
        if let Some(function) = &entry.function {
            let args: Vec<Value> = query.iter().cloned().map(Value::from).collect();
            let result = self.call_function(function, &args)?;
            if let (Some(level), Some(cell)) = (prepared.first_output(), cells.first_mut()) {
                let holder = level.ty.convert(&result)?;
                *cell = if level.array {
                    Cell::Array(vec![holder])
                } else {
                    Cell::Value(holder)
                };
            }
        }
        let key = if prepared.identifies_entries() {
            entry.key.clone()
        } else {
            None
        };
        Ok(Row::new(cells, key, Arc::clone(&prepared.output_columns)))
    }
}

/// Turn query values into the canonical text the index was built with.
fn normalize(
    prepared: &PreparedParameter,
    values: &[Value],
) -> Result<Vec<Option<String>>, ParamError> {
    prepared
        .input()
        .iter()
        .zip(values)
        .map(|(level, value)| {
            // Blank text stays blank: it reaches only the wildcard, never null.
            if let Value::String(text) = value {
                if text.trim().is_empty() {
                    return Ok(Some(String::new()));
                }
            }
            let holder = level.ty.convert(value)?;
            Ok(level.ty.encode(&holder))
        })
        .collect()
}

fn repository_names(repositories: &[(String, Arc<dyn ParamRepository>)]) -> Vec<String> {
    repositories.iter().map(|(name, _)| name.clone()).collect()
}

fn sorted_keys<V>(map: &HashMap<String, V>) -> Vec<String> {
    let mut keys: Vec<String> = map.keys().cloned().collect();
    keys.sort();
    keys
}
