//! Document store gateway.
//!
//! Reporting reads and writes whole documents in named collections. The
//! [`DocumentStore`] trait is the only suspension point of the service; the
//! adapters decide how filters and pipelines are evaluated.

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryDocumentStore;
pub use postgres::PostgresDocumentStore;

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

use aggreports_core::{DocumentKey, WireDocument};
use aggreports_query::{Filter, Pipeline};

/// Store failures, always tagged with the adapter operation that raised them.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store connection failed: {0}")]
    Connection(String),

    #[error("store query failed: {0}")]
    Query(String),

    #[error("deadline exceeded during {0}")]
    DeadlineExceeded(String),

    #[error("invalid collection name {0:?}")]
    InvalidCollection(String),

    #[error("stored document could not be converted: {0}")]
    Serialization(String),
}

/// Per-call options passed through to the store unmodified.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct CallOptions {
    /// Absolute point after which the call fails with
    /// [`StoreError::DeadlineExceeded`]. `None` waits indefinitely.
    pub deadline: Option<Instant>,
}

impl CallOptions {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Fail fast when the deadline has already passed.
    pub fn check(&self, operation: &str) -> Result<(), StoreError> {
        if self.is_expired() {
            return Err(StoreError::DeadlineExceeded(operation.to_string()));
        }
        Ok(())
    }

    /// Drive `call` to completion, abandoning it once the deadline passes.
    pub async fn run<T, F>(&self, operation: &str, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        self.check(operation)?;
        match self.deadline {
            None => call.await,
            Some(deadline) => tokio::time::timeout_at(deadline.into(), call)
                .await
                .map_err(|_| StoreError::DeadlineExceeded(operation.to_string()))?,
        }
    }
}

/// Collection-oriented document store.
///
/// Results of `find` keep the store's natural (insertion) order. `aggregate`
/// returns one document per group, each carrying the group value under `_id`.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &CallOptions,
    ) -> Result<Vec<WireDocument>, StoreError>;

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: &Pipeline,
        options: &CallOptions,
    ) -> Result<Vec<WireDocument>, StoreError>;

    /// Insert documents in order and return their keys. Documents without a
    /// `_id` get one assigned.
    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<WireDocument>,
        options: &CallOptions,
    ) -> Result<Vec<DocumentKey>, StoreError>;
}

#[async_trait::async_trait]
impl<S> DocumentStore for Arc<S>
where
    S: DocumentStore + ?Sized,
{
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &CallOptions,
    ) -> Result<Vec<WireDocument>, StoreError> {
        (**self).find(collection, filter, options).await
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: &Pipeline,
        options: &CallOptions,
    ) -> Result<Vec<WireDocument>, StoreError> {
        (**self).aggregate(collection, pipeline, options).await
    }

    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<WireDocument>,
        options: &CallOptions,
    ) -> Result<Vec<DocumentKey>, StoreError> {
        (**self).insert_many(collection, documents, options).await
    }
}

const MAX_COLLECTION_NAME: usize = 63;

/// Collection names double as SQL identifiers: ASCII letter or underscore
/// first, then letters, digits or underscores, at most 63 bytes.
pub fn validate_collection(name: &str) -> Result<&str, StoreError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid_start && valid_rest && name.len() <= MAX_COLLECTION_NAME {
        Ok(name)
    } else {
        Err(StoreError::InvalidCollection(name.to_string()))
    }
}
