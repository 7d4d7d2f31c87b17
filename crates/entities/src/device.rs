//! Installed monitoring devices.

use aggreports_core::{
    CodecResult, Document, DocumentBuilder, DocumentKey, DocumentReader, EntityId, WireDocument,
    impl_wire_serde,
};

/// Device record; `device_id` references [`Inventory::device_id`](crate::Inventory).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Device {
    pub id: Option<DocumentKey>,
    pub device_id: EntityId,
    pub rs_customer_id: EntityId,
    pub install_date: i64,
    pub maintenance_date: i64,
    pub status: String,
    pub num_replacement: i64,
    pub cost_saved: f64,
    pub version: i64,
}

impl Device {
    pub const DEVICE_ID: &'static str = "device_id";
}

impl Document for Device {
    fn to_document(&self) -> WireDocument {
        DocumentBuilder::new()
            .key(self.id.as_ref())
            .id(Self::DEVICE_ID, self.device_id)
            .id("rs_customer_id", self.rs_customer_id)
            .int("install_date", self.install_date)
            .int("maintenance_date", self.maintenance_date)
            .text("status", &self.status)
            .int("num_replacement", self.num_replacement)
            .float("cost_saved", self.cost_saved)
            .int("version", self.version)
            .finish()
    }

    fn from_document(doc: &WireDocument) -> CodecResult<Self> {
        let r = DocumentReader::new(doc);
        Ok(Self {
            id: r.key()?,
            device_id: r.id(Self::DEVICE_ID)?,
            rs_customer_id: r.id("rs_customer_id")?,
            install_date: r.int("install_date")?,
            maintenance_date: r.int("maintenance_date")?,
            status: r.text("status")?,
            num_replacement: r.int("num_replacement")?,
            cost_saved: r.float("cost_saved")?,
            version: r.int("version")?,
        })
    }
}

impl_wire_serde!(Device);
