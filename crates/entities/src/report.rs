//! Persisted summary reports.

use aggreports_core::{
    CodecResult, Document, DocumentBuilder, DocumentKey, DocumentReader, EntityId, WireDocument,
    impl_wire_serde,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    pub id: Option<DocumentKey>,
    pub report_id: EntityId,
    pub report_type: String,
    pub name: String,
    pub timestamp: i64,
    pub total_weight: f64,
    pub sold_weight: f64,
    pub waste_weight: f64,
    pub donate_weight: f64,
}

impl Document for Report {
    fn to_document(&self) -> WireDocument {
        DocumentBuilder::new()
            .key(self.id.as_ref())
            .id("report_id", self.report_id)
            .text("report_type", &self.report_type)
            .text("name", &self.name)
            .int("timestamp", self.timestamp)
            .float("total_weight", self.total_weight)
            .float("sold_weight", self.sold_weight)
            .float("waste_weight", self.waste_weight)
            .float("donate_weight", self.donate_weight)
            .finish()
    }

    fn from_document(doc: &WireDocument) -> CodecResult<Self> {
        let r = DocumentReader::new(doc);
        Ok(Self {
            id: r.key()?,
            report_id: r.id("report_id")?,
            report_type: r.text("report_type")?,
            name: r.text("name")?,
            timestamp: r.int("timestamp")?,
            total_weight: r.float("total_weight")?,
            sold_weight: r.float("sold_weight")?,
            waste_weight: r.float("waste_weight")?,
            donate_weight: r.float("donate_weight")?,
        })
    }
}

impl_wire_serde!(Report);
