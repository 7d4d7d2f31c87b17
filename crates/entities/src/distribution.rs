//! Weight distribution rows produced by the inventory rollup.

use serde_json::Value;

use aggreports_core::wire::describe;
use aggreports_core::{
    CodecError, CodecResult, Document, DocumentBuilder, DocumentReader, WireDocument,
    impl_wire_serde,
};

/// Per-product totals. Derived on demand and never persisted.
///
/// The rollup fills `prod_name` and the three summed weights; `prod_weight`
/// and `prod_sold` stay zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvenReport {
    pub prod_name: String,
    pub prod_weight: f64,
    pub total_weight: f64,
    pub sold_weight: f64,
    pub waste_weight: f64,
    pub prod_sold: i64,
}

impl InvenReport {
    /// Group key field of a `$group` output document.
    pub const GROUP_KEY: &'static str = "_id";

    /// Decode one grouped output document (`{_id, total_weight, waste_weight, sold_weight}`).
    ///
    /// Unlike [`Document::from_document`] this is strict: the key must be text
    /// and every sum must be a number. Anything else is
    /// [`CodecError::AggregateShapeMismatch`].
    pub fn from_group(doc: &WireDocument) -> CodecResult<Self> {
        let prod_name = match doc.get(Self::GROUP_KEY) {
            Some(Value::String(name)) => name.clone(),
            other => return Err(shape_mismatch(Self::GROUP_KEY, "text", other)),
        };
        Ok(Self {
            prod_name,
            total_weight: group_sum(doc, "total_weight")?,
            waste_weight: group_sum(doc, "waste_weight")?,
            sold_weight: group_sum(doc, "sold_weight")?,
            ..Self::default()
        })
    }
}

fn group_sum(doc: &WireDocument, field: &str) -> CodecResult<f64> {
    match doc.get(field) {
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| shape_mismatch(field, "float", doc.get(field))),
        other => Err(shape_mismatch(field, "float", other)),
    }
}

fn shape_mismatch(field: &str, expected: &'static str, found: Option<&Value>) -> CodecError {
    CodecError::AggregateShapeMismatch {
        field: field.to_string(),
        expected,
        found: found.map(describe).unwrap_or_else(|| "nothing".to_string()),
    }
}

impl Document for InvenReport {
    fn to_document(&self) -> WireDocument {
        DocumentBuilder::new()
            .text("prod_name", &self.prod_name)
            .float("prod_weight", self.prod_weight)
            .float("total_weight", self.total_weight)
            .float("sold_weight", self.sold_weight)
            .float("waste_weight", self.waste_weight)
            .int("prod_sold", self.prod_sold)
            .finish()
    }

    fn from_document(doc: &WireDocument) -> CodecResult<Self> {
        let r = DocumentReader::new(doc);
        Ok(Self {
            prod_name: r.text("prod_name")?,
            prod_weight: r.float("prod_weight")?,
            total_weight: r.float("total_weight")?,
            sold_weight: r.float("sold_weight")?,
            waste_weight: r.float("waste_weight")?,
            prod_sold: r.int("prod_sold")?,
        })
    }
}

impl_wire_serde!(InvenReport);
