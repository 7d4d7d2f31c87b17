//! Typed filter model.
//!
//! A [`Filter`] is an ordered list of single-field clauses, all of which must
//! hold. Its document form is the familiar operator notation:
//!
//! ```text
//! { "name": {"$eq": "Mango"},
//!   "total_weight": {"$gt": 10.0, "$lt": 20.0},
//!   "item_id": {"$in": ["...", "..."]} }
//! ```

use core::fmt;

use serde_json::{Map, Number, Value};

use aggreports_core::WireDocument;

/// Comparison operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Text(String),
    Float(f64),
    Int(i64),
}

impl Literal {
    /// Non-finite floats have no document form and become `null`.
    pub fn to_value(&self) -> Value {
        match self {
            Literal::Text(s) => Value::String(s.clone()),
            Literal::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
            Literal::Int(i) => Value::from(*i),
        }
    }

    /// Literal for a JSON scalar: text, integer or float. `None` for
    /// anything else (booleans, arrays, objects, `null`).
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Literal::Text(s.clone())),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Literal::Int(i)),
                None => n.as_f64().map(Literal::Float),
            },
            _ => None,
        }
    }

    /// Numeric view used for range comparisons; `None` for text.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Literal::Text(_) => None,
            Literal::Float(f) => Some(*f),
            Literal::Int(i) => Some(*i as f64),
        }
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::Text(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::Text(value)
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Float(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Int(value)
    }
}

/// Open interval: both bounds are exclusive, either may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Range {
    pub gt: Option<Literal>,
    pub lt: Option<Literal>,
}

impl Range {
    pub fn between(gt: impl Into<Literal>, lt: impl Into<Literal>) -> Self {
        Self {
            gt: Some(gt.into()),
            lt: Some(lt.into()),
        }
    }

    pub fn above(gt: impl Into<Literal>) -> Self {
        Self {
            gt: Some(gt.into()),
            lt: None,
        }
    }

    pub fn below(lt: impl Into<Literal>) -> Self {
        Self {
            gt: None,
            lt: Some(lt.into()),
        }
    }
}

/// What one field must satisfy.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(Literal),
    /// Multi-value equality; an empty list matches nothing.
    In(Vec<Literal>),
    Range(Range),
}

impl Condition {
    pub fn to_value(&self) -> Value {
        let mut ops = Map::new();
        match self {
            Condition::Eq(lit) => {
                ops.insert("$eq".to_string(), lit.to_value());
            }
            Condition::In(lits) => {
                ops.insert(
                    "$in".to_string(),
                    Value::Array(lits.iter().map(Literal::to_value).collect()),
                );
            }
            Condition::Range(range) => {
                if let Some(gt) = &range.gt {
                    ops.insert("$gt".to_string(), gt.to_value());
                }
                if let Some(lt) = &range.lt {
                    ops.insert("$lt".to_string(), lt.to_value());
                }
            }
        }
        Value::Object(ops)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterClause {
    pub field: String,
    pub condition: Condition,
}

/// Conjunction of single-field clauses, at most one per field.
///
/// An empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<FilterClause>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single equality clause.
    pub fn eq(field: impl Into<String>, value: impl Into<Literal>) -> Self {
        Self::new().with(field, Condition::Eq(value.into()))
    }

    pub fn with(mut self, field: impl Into<String>, condition: Condition) -> Self {
        self.insert(field, condition);
        self
    }

    /// Add a clause. A clause already present for `field` is replaced in
    /// place (keeping its position) and returned.
    pub fn insert(&mut self, field: impl Into<String>, condition: Condition) -> Option<Condition> {
        let field = field.into();
        match self.clauses.iter_mut().find(|c| c.field == field) {
            Some(existing) => Some(core::mem::replace(&mut existing.condition, condition)),
            None => {
                self.clauses.push(FilterClause { field, condition });
                None
            }
        }
    }

    pub fn get(&self, field: &str) -> Option<&Condition> {
        self.clauses
            .iter()
            .find(|c| c.field == field)
            .map(|c| &c.condition)
    }

    pub fn clauses(&self) -> &[FilterClause] {
        &self.clauses
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Document form; fields appear in clause order.
    pub fn to_document(&self) -> WireDocument {
        self.clauses
            .iter()
            .map(|c| (c.field.clone(), c.condition.to_value()))
            .collect()
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Value::Object(self.to_document()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_operator_documents() {
        let filter = Filter::new()
            .with("name", Condition::Eq("Mango".into()))
            .with("total_weight", Condition::Range(Range::between(10.0, 20.0)))
            .with("upc", Condition::Range(Range::above(5i64)))
            .with("item_id", Condition::In(vec!["a".into(), "b".into()]));

        assert_eq!(
            Value::Object(filter.to_document()),
            json!({
                "name": {"$eq": "Mango"},
                "total_weight": {"$gt": 10.0, "$lt": 20.0},
                "upc": {"$gt": 5},
                "item_id": {"$in": ["a", "b"]},
            })
        );
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut filter = Filter::eq("a", 1i64).with("b", Condition::Eq(2i64.into()));
        let previous = filter.insert("a", Condition::Eq(3i64.into()));

        assert_eq!(previous, Some(Condition::Eq(Literal::Int(1))));
        assert_eq!(filter.len(), 2);
        assert_eq!(filter.clauses()[0].field, "a");
        assert_eq!(filter.get("a"), Some(&Condition::Eq(Literal::Int(3))));
    }

    #[test]
    fn document_keeps_clause_order() {
        let filter = Filter::eq("zeta", "a")
            .with("alpha", Condition::Eq(1i64.into()))
            .with("mid", Condition::Range(Range::above(2.0)));

        let doc = filter.to_document();
        let keys: Vec<&str> = doc.keys().map(String::as_str).collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
        assert_eq!(
            filter.to_string(),
            r#"{"zeta":{"$eq":"a"},"alpha":{"$eq":1},"mid":{"$gt":2.0}}"#
        );
    }

    #[test]
    fn literals_from_json_scalars() {
        assert_eq!(Literal::from_value(&json!("Mango")), Some(Literal::Text("Mango".into())));
        assert_eq!(Literal::from_value(&json!(42)), Some(Literal::Int(42)));
        assert_eq!(Literal::from_value(&json!(12.5)), Some(Literal::Float(12.5)));
        assert_eq!(Literal::from_value(&json!(true)), None);
        assert_eq!(Literal::from_value(&json!(["a"])), None);
    }

    #[test]
    fn empty_filter_renders_empty_document() {
        assert!(Filter::new().is_empty());
        assert_eq!(Filter::new().to_string(), "{}");
    }

    #[test]
    fn non_finite_float_renders_null() {
        assert_eq!(Literal::Float(f64::INFINITY).to_value(), Value::Null);
        assert_eq!(Literal::Int(4).as_f64(), Some(4.0));
        assert_eq!(Literal::from("x").as_f64(), None);
    }
}
