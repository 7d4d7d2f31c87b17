//! Inventory items: the base entity every report starts from.

use aggreports_core::{
    CodecResult, Document, DocumentBuilder, DocumentKey, DocumentReader, EntityId, WireDocument,
    impl_wire_serde,
};

/// One inventory lot as stored in the inventory collection.
///
/// `item_id` is joined against [`Metric::item_id`](crate::Metric) and
/// `device_id` against [`Device::device_id`](crate::Device).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inventory {
    pub id: Option<DocumentKey>,
    pub item_id: EntityId,
    pub device_id: EntityId,
    pub rs_customer_id: EntityId,
    pub name: String,
    pub origin: String,
    pub lot: String,
    pub sku: String,
    pub upc: i64,
    pub date_arrived: i64,
    pub expiry_date: i64,
    pub date_sold: i64,
    pub timestamp: i64,
    pub price: f64,
    pub sale_price: f64,
    pub total_weight: f64,
    pub sold_weight: f64,
    pub waste_weight: f64,
    pub donate_weight: f64,
    pub prod_quantity: i64,
}

impl Inventory {
    pub const ITEM_ID: &'static str = "item_id";
    pub const DEVICE_ID: &'static str = "device_id";
    pub const NAME: &'static str = "name";
    pub const TOTAL_WEIGHT: &'static str = "total_weight";
    pub const SOLD_WEIGHT: &'static str = "sold_weight";
    pub const WASTE_WEIGHT: &'static str = "waste_weight";
}

impl Document for Inventory {
    fn to_document(&self) -> WireDocument {
        DocumentBuilder::new()
            .key(self.id.as_ref())
            .id(Self::ITEM_ID, self.item_id)
            .id(Self::DEVICE_ID, self.device_id)
            .id("rs_customer_id", self.rs_customer_id)
            .text(Self::NAME, &self.name)
            .text("origin", &self.origin)
            .text("lot", &self.lot)
            .text("sku", &self.sku)
            .int("upc", self.upc)
            .int("date_arrived", self.date_arrived)
            .int("expiry_date", self.expiry_date)
            .int("date_sold", self.date_sold)
            .int("timestamp", self.timestamp)
            .float("price", self.price)
            .float("sale_price", self.sale_price)
            .float(Self::TOTAL_WEIGHT, self.total_weight)
            .float(Self::SOLD_WEIGHT, self.sold_weight)
            .float(Self::WASTE_WEIGHT, self.waste_weight)
            .float("donate_weight", self.donate_weight)
            .int("prod_quantity", self.prod_quantity)
            .finish()
    }

    fn from_document(doc: &WireDocument) -> CodecResult<Self> {
        let r = DocumentReader::new(doc);
        Ok(Self {
            id: r.key()?,
            item_id: r.id(Self::ITEM_ID)?,
            device_id: r.id(Self::DEVICE_ID)?,
            rs_customer_id: r.id("rs_customer_id")?,
            name: r.text(Self::NAME)?,
            origin: r.text("origin")?,
            lot: r.text("lot")?,
            sku: r.text("sku")?,
            upc: r.int("upc")?,
            date_arrived: r.int("date_arrived")?,
            expiry_date: r.int("expiry_date")?,
            date_sold: r.int("date_sold")?,
            timestamp: r.int("timestamp")?,
            price: r.float("price")?,
            sale_price: r.float("sale_price")?,
            total_weight: r.float(Self::TOTAL_WEIGHT)?,
            sold_weight: r.float(Self::SOLD_WEIGHT)?,
            waste_weight: r.float(Self::WASTE_WEIGHT)?,
            donate_weight: r.float("donate_weight")?,
            prod_quantity: r.int("prod_quantity")?,
        })
    }
}

impl_wire_serde!(Inventory);
