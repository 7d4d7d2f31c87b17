use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use aggreports_entities::{Device, Inventory, Metric};
use aggreports_query::SearchCriteria;

use super::{ReportError, ReportService};
use crate::store::{CallOptions, DocumentStore};

/// Inventory search result together with the records joined to it.
///
/// Serialized with all three keys; the side that was not requested is
/// `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportResponse {
    #[serde(default, alias = "Inventory")]
    pub inventory: Vec<Inventory>,

    #[serde(default, alias = "Metric")]
    pub metric: Option<Vec<Metric>>,

    #[serde(default, alias = "Device")]
    pub device: Option<Vec<Device>>,
}

impl<S> ReportService<S>
where
    S: DocumentStore,
{
    /// Inventory matching `criteria` plus the metrics joined to it.
    ///
    /// Both steps share `options`, so a deadline bounds the whole report.
    /// A failure of either step fails the report.
    #[instrument(skip(self, criteria, options), err)]
    pub async fn metric_report(
        &self,
        criteria: &SearchCriteria,
        options: &CallOptions,
    ) -> Result<ReportResponse, ReportError> {
        let inventory = self.search_inventory(criteria, options).await?;
        let metric = self.search_metrics_for_inventory(&inventory, options).await?;

        info!(inventory = inventory.len(), metrics = metric.len(), "metric report complete");
        Ok(ReportResponse {
            inventory,
            metric: Some(metric),
            device: None,
        })
    }

    /// Inventory matching `criteria` plus the devices joined to it.
    #[instrument(skip(self, criteria, options), err)]
    pub async fn device_report(
        &self,
        criteria: &SearchCriteria,
        options: &CallOptions,
    ) -> Result<ReportResponse, ReportError> {
        let inventory = self.search_inventory(criteria, options).await?;
        let device = self.search_devices_for_inventory(&inventory, options).await?;

        info!(inventory = inventory.len(), devices = device.len(), "device report complete");
        Ok(ReportResponse {
            inventory,
            metric: None,
            device: Some(device),
        })
    }
}
