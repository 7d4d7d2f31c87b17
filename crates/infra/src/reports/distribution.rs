use tracing::{info, instrument};

use aggreports_entities::{InvenReport, Inventory};
use aggreports_query::{GroupStage, Pipeline};

use super::{ReportError, ReportService};
use crate::store::{CallOptions, DocumentStore};

/// Inventory grouped by product name with summed total, waste and sold weight.
pub fn weight_distribution_pipeline() -> Pipeline {
    Pipeline::group(
        GroupStage::by(Inventory::NAME)
            .sum(Inventory::TOTAL_WEIGHT, Inventory::TOTAL_WEIGHT)
            .sum(Inventory::WASTE_WEIGHT, Inventory::WASTE_WEIGHT)
            .sum(Inventory::SOLD_WEIGHT, Inventory::SOLD_WEIGHT),
    )
}

impl<S> ReportService<S>
where
    S: DocumentStore,
{
    /// Per-product weight totals over the whole inventory collection.
    ///
    /// An empty collection yields an empty distribution. Every group must
    /// come back with a text key and numeric sums, otherwise the call fails
    /// with a codec error.
    #[instrument(skip(self, options), err)]
    pub async fn weight_distribution(
        &self,
        options: &CallOptions,
    ) -> Result<Vec<InvenReport>, ReportError> {
        const OPERATION: &str = "weight_distribution";

        let pipeline = weight_distribution_pipeline();
        let groups = self
            .store
            .aggregate(&self.collections.inventory, &pipeline, options)
            .await
            .map_err(ReportError::store(OPERATION))?;
        let rows = groups
            .iter()
            .map(InvenReport::from_group)
            .collect::<Result<Vec<_>, _>>()?;

        info!(products = rows.len(), "weight distribution complete");
        Ok(rows)
    }
}
