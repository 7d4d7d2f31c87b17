//! Wire documents: the JSON-shaped records exchanged with the document store
//! and with API callers.
//!
//! Decoding is typed per field. Each entity schema picks `id`, `int`, `float`
//! or `text` for every field it owns, and the reader normalises whatever
//! runtime representation the store handed back:
//!
//! - identifiers travel as text; a missing field is the nil identifier
//! - integers may arrive as an integer, a float or a numeric string
//! - floats may arrive as any JSON number or a numeric string
//! - a missing field (or JSON `null`) decodes to the zero value
//!
//! A missing numeric field and an explicit zero decode to the same value.

use serde_json::{Map, Number, Value};

use crate::error::{CodecError, CodecResult};
use crate::id::{DocumentKey, EntityId};

/// Raw document as stored or transmitted.
pub type WireDocument = Map<String, Value>;

/// Field holding the store-assigned document key.
pub const KEY_FIELD: &str = "_id";

/// Typed field access over a borrowed wire document.
#[derive(Debug, Clone, Copy)]
pub struct DocumentReader<'a> {
    doc: &'a WireDocument,
}

impl<'a> DocumentReader<'a> {
    pub fn new(doc: &'a WireDocument) -> Self {
        Self { doc }
    }

    fn present(&self, field: &str) -> Option<&'a Value> {
        match self.doc.get(field) {
            None | Some(Value::Null) => None,
            Some(value) => Some(value),
        }
    }

    /// Identifier field; absent decodes to nil.
    pub fn id(&self, field: &str) -> CodecResult<EntityId> {
        let Some(value) = self.present(field) else {
            return Ok(EntityId::nil());
        };
        let Value::String(text) = value else {
            return Err(coercion(field, "identifier text", value));
        };
        text.parse::<EntityId>()
            .map_err(|e| CodecError::MalformedIdentifier {
                field: field.to_string(),
                value: text.clone(),
                reason: e.to_string(),
            })
    }

    /// Store key (`_id`). Accepts plain text or extended JSON `{"$oid": "..."}`.
    pub fn key(&self) -> CodecResult<Option<DocumentKey>> {
        let Some(value) = self.present(KEY_FIELD) else {
            return Ok(None);
        };
        match value {
            Value::String(text) => Ok(Some(DocumentKey::new(text.clone()))),
            Value::Object(ext) => match ext.get("$oid") {
                Some(Value::String(oid)) => Ok(Some(DocumentKey::new(oid.clone()))),
                _ => Err(coercion(KEY_FIELD, "document key", value)),
            },
            other => Err(coercion(KEY_FIELD, "document key", other)),
        }
    }

    /// Integer field. Integral floats convert exactly; fractional floats
    /// truncate toward zero.
    pub fn int(&self, field: &str) -> CodecResult<i64> {
        let Some(value) = self.present(field) else {
            return Ok(0);
        };
        let parsed = match value {
            Value::Number(n) => number_to_i64(n),
            Value::String(s) => parse_i64(s),
            _ => None,
        };
        parsed.ok_or_else(|| coercion(field, "integer", value))
    }

    pub fn float(&self, field: &str) -> CodecResult<f64> {
        let Some(value) = self.present(field) else {
            return Ok(0.0);
        };
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            _ => None,
        };
        parsed.ok_or_else(|| coercion(field, "float", value))
    }

    pub fn text(&self, field: &str) -> CodecResult<String> {
        match self.present(field) {
            None => Ok(String::new()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Err(coercion(field, "text", other)),
        }
    }
}

/// Builds a wire document field by field.
///
/// Nil identifiers and a missing key are left out; every other field is
/// always written, zeros included.
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    doc: WireDocument,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(mut self, key: Option<&DocumentKey>) -> Self {
        if let Some(key) = key {
            self.doc
                .insert(KEY_FIELD.to_string(), Value::String(key.as_str().to_string()));
        }
        self
    }

    pub fn id(mut self, field: &str, id: EntityId) -> Self {
        if !id.is_nil() {
            self.doc.insert(field.to_string(), Value::String(id.to_string()));
        }
        self
    }

    pub fn int(mut self, field: &str, value: i64) -> Self {
        self.doc.insert(field.to_string(), Value::from(value));
        self
    }

    /// Non-finite floats have no JSON form and are written as `null`.
    pub fn float(mut self, field: &str, value: f64) -> Self {
        let value = Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null);
        self.doc.insert(field.to_string(), value);
        self
    }

    pub fn text(mut self, field: &str, value: &str) -> Self {
        self.doc.insert(field.to_string(), Value::String(value.to_string()));
        self
    }

    pub fn finish(self) -> WireDocument {
        self.doc
    }
}

/// Short description of a JSON value's runtime type, for error messages.
pub fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) if n.is_f64() => format!("float {n}"),
        Value::Number(n) => format!("integer {n}"),
        Value::String(s) => format!("string {s:?}"),
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
    }
}

fn coercion(field: &str, expected: &'static str, found: &Value) -> CodecError {
    CodecError::Coercion {
        field: field.to_string(),
        expected,
        found: describe(found),
    }
}

fn number_to_i64(n: &Number) -> Option<i64> {
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    // u64 values above i64::MAX land here and fail the range check.
    n.as_f64().and_then(float_to_i64)
}

fn float_to_i64(f: f64) -> Option<i64> {
    if !f.is_finite() {
        return None;
    }
    let t = f.trunc();
    // i64::MIN is exactly -2^63; 2^63 itself is already out of range.
    if t < i64::MIN as f64 || t >= -(i64::MIN as f64) {
        return None;
    }
    Some(t as i64)
}

fn parse_i64(s: &str) -> Option<i64> {
    let s = s.trim();
    s.parse::<i64>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().and_then(float_to_i64))
}
