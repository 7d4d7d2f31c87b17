use tracing::{info, instrument};

use aggreports_core::{Document, DocumentKey, encode_all};
use aggreports_entities::{Device, Inventory, Metric, Report};

use super::{ReportError, ReportService};
use crate::store::{CallOptions, DocumentStore};

impl<S> ReportService<S>
where
    S: DocumentStore,
{
    #[instrument(skip(self, items, options), fields(count = items.len()), err)]
    pub async fn insert_inventory(
        &self,
        items: &[Inventory],
        options: &CallOptions,
    ) -> Result<Vec<DocumentKey>, ReportError> {
        self.insert("insert_inventory", &self.collections.inventory, items, options)
            .await
    }

    #[instrument(skip(self, metrics, options), fields(count = metrics.len()), err)]
    pub async fn insert_metrics(
        &self,
        metrics: &[Metric],
        options: &CallOptions,
    ) -> Result<Vec<DocumentKey>, ReportError> {
        self.insert("insert_metrics", &self.collections.metric, metrics, options)
            .await
    }

    #[instrument(skip(self, devices, options), fields(count = devices.len()), err)]
    pub async fn insert_devices(
        &self,
        devices: &[Device],
        options: &CallOptions,
    ) -> Result<Vec<DocumentKey>, ReportError> {
        self.insert("insert_devices", &self.collections.device, devices, options)
            .await
    }

    #[instrument(skip(self, reports, options), fields(count = reports.len()), err)]
    pub async fn insert_reports(
        &self,
        reports: &[Report],
        options: &CallOptions,
    ) -> Result<Vec<DocumentKey>, ReportError> {
        self.insert("insert_reports", &self.collections.report, reports, options)
            .await
    }

    /// Encode and bulk-insert; an empty batch never reaches the store.
    async fn insert<T: Document>(
        &self,
        operation: &'static str,
        collection: &str,
        items: &[T],
        options: &CallOptions,
    ) -> Result<Vec<DocumentKey>, ReportError> {
        if items.is_empty() {
            return Ok(vec![]);
        }
        let keys = self
            .store
            .insert_many(collection, encode_all(items), options)
            .await
            .map_err(ReportError::store(operation))?;

        info!(operation, collection, inserted = keys.len(), "bulk insert complete");
        Ok(keys)
    }
}
