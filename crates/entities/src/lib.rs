//! Reporting entities and their wire codecs.
//!
//! Each entity is a value snapshot read from (or bulk-written to) one store
//! collection. Encoding and decoding go through [`aggreports_core::Document`];
//! serde support reuses the same wire shape.

pub mod device;
pub mod distribution;
pub mod inventory;
pub mod metric;
pub mod report;

pub use device::Device;
pub use distribution::InvenReport;
pub use inventory::Inventory;
pub use metric::Metric;
pub use report::Report;
