use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::{Number, Value};

use aggreports_core::{DocumentKey, KEY_FIELD, WireDocument};
use aggreports_query::{Condition, Filter, GROUP_KEY, GroupStage, Literal, Pipeline, Range, Stage};

use super::{CallOptions, DocumentStore, StoreError, validate_collection};

/// In-memory document store.
///
/// Intended for tests/dev. Collections are created on first insert and keep
/// insertion order. Filters support `$eq`, `$in` and exclusive `$gt`/`$lt`;
/// pipelines support `$group` with `$sum`.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<String, Vec<WireDocument>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently held by `collection`.
    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .map(|map| map.get(collection).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    fn snapshot(&self, collection: &str) -> Result<Vec<WireDocument>, StoreError> {
        let map = self
            .collections
            .read()
            .map_err(|_| StoreError::Connection("in-memory store lock poisoned".to_string()))?;
        Ok(map.get(collection).cloned().unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &CallOptions,
    ) -> Result<Vec<WireDocument>, StoreError> {
        options.check("find")?;
        validate_collection(collection)?;

        let docs = self.snapshot(collection)?;
        Ok(docs.into_iter().filter(|doc| matches(filter, doc)).collect())
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: &Pipeline,
        options: &CallOptions,
    ) -> Result<Vec<WireDocument>, StoreError> {
        options.check("aggregate")?;
        validate_collection(collection)?;

        let mut docs = self.snapshot(collection)?;
        for stage in pipeline.stages() {
            docs = match stage {
                Stage::Group(group) => apply_group(group, &docs),
            };
        }
        Ok(docs)
    }

    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<WireDocument>,
        options: &CallOptions,
    ) -> Result<Vec<DocumentKey>, StoreError> {
        options.check("insert_many")?;
        validate_collection(collection)?;

        let mut keys = Vec::with_capacity(documents.len());
        let mut stored = Vec::with_capacity(documents.len());
        for mut doc in documents {
            let key = match doc.get(KEY_FIELD) {
                Some(Value::String(key)) => DocumentKey::new(key.clone()),
                Some(Value::Null) | None => {
                    let key = DocumentKey::generate();
                    doc.insert(KEY_FIELD.to_string(), Value::String(key.to_string()));
                    key
                }
                Some(other) => {
                    return Err(StoreError::Serialization(format!(
                        "insert_many: unsupported {KEY_FIELD} value {other}"
                    )));
                }
            };
            keys.push(key);
            stored.push(doc);
        }

        let mut map = self
            .collections
            .write()
            .map_err(|_| StoreError::Connection("in-memory store lock poisoned".to_string()))?;
        map.entry(collection.to_string()).or_default().extend(stored);
        Ok(keys)
    }
}

fn matches(filter: &Filter, doc: &WireDocument) -> bool {
    filter.clauses().iter().all(|clause| {
        let value = doc.get(&clause.field).unwrap_or(&Value::Null);
        match &clause.condition {
            Condition::Eq(literal) => literal_eq(literal, value),
            Condition::In(literals) => literals.iter().any(|l| literal_eq(l, value)),
            Condition::Range(range) => in_range(range, value),
        }
    })
}

fn literal_eq(literal: &Literal, value: &Value) -> bool {
    match (literal, value) {
        (Literal::Text(s), Value::String(v)) => s == v,
        (Literal::Int(i), Value::Number(n)) => {
            n.as_i64().map_or_else(|| n.as_f64() == Some(*i as f64), |v| v == *i)
        }
        (Literal::Float(f), Value::Number(n)) => n.as_f64() == Some(*f),
        _ => false,
    }
}

/// Ordering of `value` relative to `literal`; `None` when they are not
/// comparable (text against numbers, missing fields).
fn literal_cmp(literal: &Literal, value: &Value) -> Option<Ordering> {
    match (literal, value) {
        (Literal::Text(s), Value::String(v)) => Some(v.as_str().cmp(s.as_str())),
        (Literal::Text(_), _) => None,
        (numeric, Value::Number(n)) => n.as_f64()?.partial_cmp(&numeric.as_f64()?),
        _ => None,
    }
}

fn in_range(range: &Range, value: &Value) -> bool {
    let above = range
        .gt
        .as_ref()
        .is_none_or(|gt| literal_cmp(gt, value) == Some(Ordering::Greater));
    let below = range
        .lt
        .as_ref()
        .is_none_or(|lt| literal_cmp(lt, value) == Some(Ordering::Less));
    above && below
}

/// `$group`: one output per distinct key value, in first-seen order. `$sum`
/// adds numeric values as floats and ignores everything else.
fn apply_group(group: &GroupStage, docs: &[WireDocument]) -> Vec<WireDocument> {
    let mut order: Vec<Value> = Vec::new();
    let mut sums: Vec<Vec<f64>> = Vec::new();

    for doc in docs {
        let key = doc.get(&group.key).cloned().unwrap_or(Value::Null);
        let slot = match order.iter().position(|k| *k == key) {
            Some(slot) => slot,
            None => {
                order.push(key);
                sums.push(vec![0.0; group.sums.len()]);
                order.len() - 1
            }
        };
        for (total, field) in sums[slot].iter_mut().zip(&group.sums) {
            if let Some(n) = doc.get(&field.source).and_then(Value::as_f64) {
                *total += n;
            }
        }
    }

    order
        .into_iter()
        .zip(sums)
        .map(|(key, totals)| {
            let mut out = WireDocument::new();
            out.insert(GROUP_KEY.to_string(), key);
            for (field, total) in group.sums.iter().zip(totals) {
                let total = Number::from_f64(total).map_or(Value::Null, Value::Number);
                out.insert(field.output.clone(), total);
            }
            out
        })
        .collect()
}
