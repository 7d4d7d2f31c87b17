//! Search criteria and the store-native expressions compiled from them.
//!
//! - [`param`]: untyped search parameters as received from callers
//! - [`filter`]: the typed filter model and its document form
//! - [`compile`]: parameter validation and filter compilation
//! - [`pipeline`]: aggregation pipelines (grouped sums)

pub mod compile;
pub mod filter;
pub mod param;
pub mod pipeline;

pub use compile::{compile, compile_category, compile_field_values, compile_params};
pub use filter::{Condition, Filter, FilterClause, Literal, Range};
pub use param::{INVENTORY_CATEGORY, ParamType, SearchByFieldValue, SearchCriteria, SearchParam};
pub use pipeline::{GROUP_KEY, GroupStage, Pipeline, Stage, SumField};
