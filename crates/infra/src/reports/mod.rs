//! Reporting service: inventory search, foreign-key joins to metrics and
//! devices, combined reports, field/value lookups, weight distribution and
//! bulk ingest over a [`DocumentStore`].
//!
//! The service holds no state besides the store handle and its settings, so
//! it can be shared freely (`Arc<ReportService<S>>`) when `S` is
//! `Send + Sync`.

pub mod combined;
pub mod distribution;
pub mod error;
pub mod ingest;
pub mod search;

pub use combined::ReportResponse;
pub use distribution::weight_distribution_pipeline;
pub use error::ReportError;
pub use search::ForeignKeyJoin;

use crate::config::{Collections, StoreConfig};
use crate::store::DocumentStore;

#[derive(Debug, Clone)]
pub struct ReportService<S> {
    store: S,
    collections: Collections,
    join: ForeignKeyJoin,
}

impl<S> ReportService<S>
where
    S: DocumentStore,
{
    /// Service over the default collection names with the `$in` join.
    pub fn new(store: S) -> Self {
        Self {
            store,
            collections: Collections::default(),
            join: ForeignKeyJoin::default(),
        }
    }

    pub fn from_config(store: S, config: &StoreConfig) -> Self {
        Self::new(store)
            .with_collections(config.collections.clone())
            .with_join(config.join)
    }

    pub fn with_collections(mut self, collections: Collections) -> Self {
        self.collections = collections;
        self
    }

    pub fn with_join(mut self, join: ForeignKeyJoin) -> Self {
        self.join = join;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn collections(&self) -> &Collections {
        &self.collections
    }

    pub fn join(&self) -> ForeignKeyJoin {
        self.join
    }
}

/// Turn an empty result into [`ReportError::NoResults`].
fn non_empty<T>(operation: &'static str, items: Vec<T>) -> Result<Vec<T>, ReportError> {
    if items.is_empty() {
        return Err(ReportError::NoResults { operation });
    }
    Ok(items)
}
