//! Sensor readings taken against an inventory lot.

use aggreports_core::{
    CodecResult, Document, DocumentBuilder, DocumentKey, DocumentReader, EntityId, WireDocument,
    impl_wire_serde,
};

/// Sensor metric; `item_id` references [`Inventory::item_id`](crate::Inventory).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metric {
    pub id: Option<DocumentKey>,
    pub item_id: EntityId,
    pub device_id: EntityId,
    pub timestamp: i64,
    pub temp_in: f64,
    pub humidity: f64,
    pub ethylene: f64,
    pub carbon_di: f64,
    pub name: String,
    pub sku: String,
    pub lot: String,
}

impl Metric {
    pub const ITEM_ID: &'static str = "item_id";
}

impl Document for Metric {
    fn to_document(&self) -> WireDocument {
        DocumentBuilder::new()
            .key(self.id.as_ref())
            .id(Self::ITEM_ID, self.item_id)
            .id("device_id", self.device_id)
            .int("timestamp", self.timestamp)
            .float("temp_in", self.temp_in)
            .float("humidity", self.humidity)
            .float("ethylene", self.ethylene)
            .float("carbon_di", self.carbon_di)
            .text("name", &self.name)
            .text("sku", &self.sku)
            .text("lot", &self.lot)
            .finish()
    }

    fn from_document(doc: &WireDocument) -> CodecResult<Self> {
        let r = DocumentReader::new(doc);
        Ok(Self {
            id: r.key()?,
            item_id: r.id(Self::ITEM_ID)?,
            device_id: r.id("device_id")?,
            timestamp: r.int("timestamp")?,
            temp_in: r.float("temp_in")?,
            humidity: r.float("humidity")?,
            ethylene: r.float("ethylene")?,
            carbon_di: r.float("carbon_di")?,
            name: r.text("name")?,
            sku: r.text("sku")?,
            lot: r.text("lot")?,
        })
    }
}

impl_wire_serde!(Metric);
