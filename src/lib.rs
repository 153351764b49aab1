mod cache;
mod engine;
mod error;
mod index;
mod matchers;
pub mod parse;
mod repository;
mod types;
mod value_types;
mod walker;

pub use cache::PreparedParamCache;
pub use engine::{LevelCreator, ParamEngine, ParamEngineBuilder, RuntimeConfig};
pub use error::ParamError;
pub use index::PreparedParameter;
pub use matchers::{BetweenMatcher, DEFAULT_SEPARATORS, Matcher, MatcherRegistry, StrictMatcher};
pub use repository::{FunctionProvider, ParamRepository, StaticRepository};
pub use types::{
    Cell, Column, Context, ConversionError, DEFAULT_ARRAY_SEPARATOR, DetailedEntry,
    DetailedParamValue, Entry, FunctionError, Holder, IntoPattern, Level, ParamValue, Parameter,
    ParameterBuilder, Row, Value, WILDCARD,
};
pub use value_types::{
    BooleanType, DateType, DecimalType, IntegerType, ParamType, StringType, TypeRegistry,
};
