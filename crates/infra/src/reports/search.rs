use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use aggreports_core::{EntityId, WireDocument, decode_all};
use aggreports_entities::{Device, Inventory, Metric};
use aggreports_query::{
    Condition, Filter, Literal, SearchByFieldValue, SearchCriteria, compile, compile_field_values,
};

use super::{ReportError, ReportService, non_empty};
use crate::store::{CallOptions, DocumentStore};

/// How inventory records select related metrics and devices.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForeignKeyJoin {
    /// Match any key present in the inventory set (`$in` over the distinct
    /// non-nil keys).
    #[default]
    AllRecords,
    /// Match only the key of the last inventory record, nil included. With no
    /// inventory records the filter is empty and matches everything.
    LastRecord,
}

impl ForeignKeyJoin {
    /// Accepts `all` / `all_records` and `last` / `last_record`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "all" | "all_records" => Some(ForeignKeyJoin::AllRecords),
            "last" | "last_record" => Some(ForeignKeyJoin::LastRecord),
            _ => None,
        }
    }

    /// Filter selecting documents whose `field` matches the given keys.
    pub fn filter<I>(self, field: &str, keys: I) -> Filter
    where
        I: IntoIterator<Item = EntityId>,
    {
        match self {
            ForeignKeyJoin::AllRecords => {
                let mut seen = HashSet::new();
                let mut distinct: Vec<EntityId> = Vec::new();
                for key in keys {
                    if !key.is_nil() && seen.insert(key) {
                        distinct.push(key);
                    }
                }
                let literals = distinct
                    .into_iter()
                    .map(|id| Literal::Text(id.to_string()))
                    .collect();
                Filter::new().with(field, Condition::In(literals))
            }
            ForeignKeyJoin::LastRecord => match keys.into_iter().last() {
                Some(id) => Filter::eq(field, id.to_string()),
                None => Filter::new(),
            },
        }
    }
}

impl<S> ReportService<S>
where
    S: DocumentStore,
{
    /// Inventory records matching the `"inventory"` category of `criteria`.
    ///
    /// Parameters are validated before the store is contacted.
    #[instrument(skip(self, criteria, options), err)]
    pub async fn search_inventory(
        &self,
        criteria: &SearchCriteria,
        options: &CallOptions,
    ) -> Result<Vec<Inventory>, ReportError> {
        const OPERATION: &str = "search_inventory";

        let filter = compile(criteria)?;
        let docs = self
            .store
            .find(&self.collections.inventory, &filter, options)
            .await
            .map_err(ReportError::store(OPERATION))?;
        let items = decode_all::<Inventory>(&docs)?;

        info!(count = items.len(), "inventory search complete");
        non_empty(OPERATION, items)
    }

    /// Metrics whose `item_id` matches the inventory records.
    #[instrument(skip(self, inventory, options), fields(inventory_count = inventory.len()), err)]
    pub async fn search_metrics_for_inventory(
        &self,
        inventory: &[Inventory],
        options: &CallOptions,
    ) -> Result<Vec<Metric>, ReportError> {
        const OPERATION: &str = "search_metrics_for_inventory";

        let filter = self
            .join
            .filter(Metric::ITEM_ID, inventory.iter().map(|i| i.item_id));
        let docs = self
            .store
            .find(&self.collections.metric, &filter, options)
            .await
            .map_err(ReportError::store(OPERATION))?;
        let metrics = decode_all::<Metric>(&docs)?;

        info!(count = metrics.len(), join = ?self.join, "metric search complete");
        non_empty(OPERATION, metrics)
    }

    /// Devices whose `device_id` matches the inventory records.
    #[instrument(skip(self, inventory, options), fields(inventory_count = inventory.len()), err)]
    pub async fn search_devices_for_inventory(
        &self,
        inventory: &[Inventory],
        options: &CallOptions,
    ) -> Result<Vec<Device>, ReportError> {
        const OPERATION: &str = "search_devices_for_inventory";

        let filter = self
            .join
            .filter(Device::DEVICE_ID, inventory.iter().map(|i| i.device_id));
        let docs = self
            .store
            .find(&self.collections.device, &filter, options)
            .await
            .map_err(ReportError::store(OPERATION))?;
        let devices = decode_all::<Device>(&docs)?;

        info!(count = devices.len(), join = ?self.join, "device search complete");
        non_empty(OPERATION, devices)
    }

    /// Raw documents of `collection` whose field equals the given value.
    ///
    /// Only the last usable pair of `pairs` is applied. With no usable pair
    /// the store is not contacted and the result is `NoResults`.
    #[instrument(skip(self, pairs, options), fields(pairs = pairs.len()), err)]
    pub async fn search_by_field_value(
        &self,
        collection: &str,
        pairs: &[SearchByFieldValue],
        options: &CallOptions,
    ) -> Result<Vec<WireDocument>, ReportError> {
        const OPERATION: &str = "search_by_field_value";

        let Some(filter) = compile_field_values(pairs)? else {
            return Err(ReportError::NoResults { operation: OPERATION });
        };
        let docs = self
            .store
            .find(collection, &filter, options)
            .await
            .map_err(ReportError::store(OPERATION))?;

        info!(count = docs.len(), filter = %filter, "field/value search complete");
        non_empty(OPERATION, docs)
    }
}
