//! Infrastructure layer: document store gateway, configuration and the
//! reporting service built on top of them.

pub mod config;
pub mod reports;
pub mod store;

mod integration_tests;

pub use config::{Collections, StoreConfig};
pub use reports::{ForeignKeyJoin, ReportError, ReportResponse, ReportService};
pub use store::{
    CallOptions, DocumentStore, InMemoryDocumentStore, PostgresDocumentStore, StoreError,
};
