//! Untyped search parameters as supplied by callers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Category key consulted for inventory search.
pub const INVENTORY_CATEGORY: &str = "inventory";

/// One filter clause request: `field` compared by `type` against either
/// `equal` or an exclusive `(lower_limit, upper_limit)` range.
///
/// Limits use `0` as "unset". Both the snake_case wire names and the
/// capitalised ones (`Field`, `Type`, `Equal`, `LowerLimit`, `UpperLimit`)
/// are accepted. Missing members default to empty so the compiler, not the
/// deserializer, reports what is wrong.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchParam {
    #[serde(default, alias = "Field")]
    pub field: String,

    #[serde(rename = "type", default, alias = "Type")]
    pub kind: String,

    #[serde(default, alias = "Equal")]
    pub equal: String,

    #[serde(default, alias = "LowerLimit", alias = "lowerlimit")]
    pub lower_limit: f64,

    #[serde(default, alias = "UpperLimit", alias = "upperlimit")]
    pub upper_limit: f64,
}

impl SearchParam {
    pub fn equal(field: impl Into<String>, kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind: kind.into(),
            equal: value.into(),
            ..Self::default()
        }
    }

    pub fn range(field: impl Into<String>, kind: impl Into<String>, lower: f64, upper: f64) -> Self {
        Self {
            field: field.into(),
            kind: kind.into(),
            lower_limit: lower,
            upper_limit: upper,
            ..Self::default()
        }
    }

    pub fn has_equal(&self) -> bool {
        !self.equal.is_empty()
    }

    pub fn has_limits(&self) -> bool {
        self.lower_limit != 0.0 || self.upper_limit != 0.0
    }
}

/// One pair of a field/value equality search against a single collection.
///
/// `search_val` is any JSON scalar and is compared as-is, without a declared
/// type. A pair is usable only when both members are set; `null` and the
/// empty string count as unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchByFieldValue {
    #[serde(default, alias = "SearchField")]
    pub search_field: String,

    #[serde(default, alias = "SearchVal")]
    pub search_val: Value,
}

impl SearchByFieldValue {
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            search_field: field.into(),
            search_val: value.into(),
        }
    }

    pub fn is_usable(&self) -> bool {
        let unset = match &self.search_val {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            _ => false,
        };
        !self.search_field.is_empty() && !unset
    }
}

/// Declared comparison type of a [`SearchParam`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ParamType {
    Text,
    Float,
    Int,
}

impl ParamType {
    /// `None` for anything but the exact names `string`, `float` and `int`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "string" => Some(ParamType::Text),
            "float" => Some(ParamType::Float),
            "int" => Some(ParamType::Int),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ParamType::Text => "string",
            ParamType::Float => "float",
            ParamType::Int => "int",
        }
    }
}

/// Search parameters grouped by entity category (`{"inventory": [...]}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchCriteria(BTreeMap<String, Vec<SearchParam>>);

impl SearchCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, category: impl Into<String>, params: Vec<SearchParam>) -> Self {
        self.insert(category, params);
        self
    }

    pub fn insert(&mut self, category: impl Into<String>, params: Vec<SearchParam>) {
        self.0.insert(category.into(), params);
    }

    /// Parameters of one category; empty when the category is absent.
    pub fn category(&self, name: &str) -> &[SearchParam] {
        self.0.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn inventory(&self) -> &[SearchParam] {
        self.category(INVENTORY_CATEGORY)
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl FromIterator<(String, Vec<SearchParam>)> for SearchCriteria {
    fn from_iter<I: IntoIterator<Item = (String, Vec<SearchParam>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
