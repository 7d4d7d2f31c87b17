//! Integration tests for the reporting service.
//!
//! Tests: SearchCriteria → Filter → DocumentStore → decoded entities
//!
//! Verifies:
//! - Search parameters are validated before any store call
//! - Foreign-key joins select metrics/devices for every inventory record
//! - Combined reports chain the inventory search into its join
//! - Field/value lookups apply only the last usable pair
//! - Weight distribution sums per product and rejects malformed groups
//! - Store failures and deadlines surface as operation-tagged errors

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    use serde_json::json;

    use aggreports_core::{CodecError, DocumentKey, EntityId, ValidationError, WireDocument};
    use aggreports_entities::{Device, Inventory, Metric, Report};
    use aggreports_query::{Filter, Pipeline, SearchByFieldValue, SearchCriteria, SearchParam};

    use crate::config::{Collections, StoreConfig};
    use crate::reports::{ForeignKeyJoin, ReportError, ReportResponse, ReportService};
    use crate::store::{CallOptions, DocumentStore, InMemoryDocumentStore, StoreError};

    /// Counts every call before delegating to an in-memory store.
    #[derive(Default)]
    struct RecordingStore {
        inner: InMemoryDocumentStore,
        calls: AtomicUsize,
    }

    impl RecordingStore {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl DocumentStore for RecordingStore {
        async fn find(
            &self,
            collection: &str,
            filter: &Filter,
            options: &CallOptions,
        ) -> Result<Vec<WireDocument>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.find(collection, filter, options).await
        }

        async fn aggregate(
            &self,
            collection: &str,
            pipeline: &Pipeline,
            options: &CallOptions,
        ) -> Result<Vec<WireDocument>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.aggregate(collection, pipeline, options).await
        }

        async fn insert_many(
            &self,
            collection: &str,
            documents: Vec<WireDocument>,
            options: &CallOptions,
        ) -> Result<Vec<DocumentKey>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.insert_many(collection, documents, options).await
        }
    }

    /// Fails every call as if the server were unreachable.
    struct UnreachableStore;

    #[async_trait::async_trait]
    impl DocumentStore for UnreachableStore {
        async fn find(
            &self,
            _collection: &str,
            _filter: &Filter,
            _options: &CallOptions,
        ) -> Result<Vec<WireDocument>, StoreError> {
            Err(StoreError::Connection("connection refused".to_string()))
        }

        async fn aggregate(
            &self,
            _collection: &str,
            _pipeline: &Pipeline,
            _options: &CallOptions,
        ) -> Result<Vec<WireDocument>, StoreError> {
            Err(StoreError::Connection("connection refused".to_string()))
        }

        async fn insert_many(
            &self,
            _collection: &str,
            _documents: Vec<WireDocument>,
            _options: &CallOptions,
        ) -> Result<Vec<DocumentKey>, StoreError> {
            Err(StoreError::Connection("connection refused".to_string()))
        }
    }

    /// Answers every aggregation with a fixed set of groups.
    struct FixedGroupsStore(Vec<WireDocument>);

    #[async_trait::async_trait]
    impl DocumentStore for FixedGroupsStore {
        async fn find(
            &self,
            _collection: &str,
            _filter: &Filter,
            _options: &CallOptions,
        ) -> Result<Vec<WireDocument>, StoreError> {
            Ok(vec![])
        }

        async fn aggregate(
            &self,
            _collection: &str,
            _pipeline: &Pipeline,
            _options: &CallOptions,
        ) -> Result<Vec<WireDocument>, StoreError> {
            Ok(self.0.clone())
        }

        async fn insert_many(
            &self,
            _collection: &str,
            _documents: Vec<WireDocument>,
            _options: &CallOptions,
        ) -> Result<Vec<DocumentKey>, StoreError> {
            Ok(vec![])
        }
    }

    fn opts() -> CallOptions {
        CallOptions::none()
    }

    fn item(n: u128, name: &str, total: f64, waste: f64, sold: f64) -> Inventory {
        Inventory {
            item_id: EntityId::from_u128(n),
            device_id: EntityId::from_u128(1000 + n),
            name: name.to_string(),
            total_weight: total,
            waste_weight: waste,
            sold_weight: sold,
            ..Inventory::default()
        }
    }

    fn metric(item: u128, temp_in: f64) -> Metric {
        Metric {
            item_id: EntityId::from_u128(item),
            temp_in,
            ..Metric::default()
        }
    }

    fn device(n: u128, status: &str) -> Device {
        Device {
            device_id: EntityId::from_u128(1000 + n),
            status: status.to_string(),
            ..Device::default()
        }
    }

    fn name_is(name: &str) -> SearchCriteria {
        SearchCriteria::new().with("inventory", vec![SearchParam::equal("name", "string", name)])
    }

    async fn seeded<S: DocumentStore>(service: &ReportService<S>) {
        service
            .insert_inventory(
                &[
                    item(1, "Mango", 10.0, 1.0, 8.0),
                    item(2, "Mango", 5.0, 2.0, 4.0),
                    item(3, "Kiwi", 20.0, 0.0, 20.0),
                ],
                &opts(),
            )
            .await
            .unwrap();
        service
            .insert_metrics(&[metric(1, 4.5), metric(2, 5.5), metric(3, 6.5)], &opts())
            .await
            .unwrap();
        service
            .insert_devices(&[device(1, "active"), device(2, "idle")], &opts())
            .await
            .unwrap();
    }

    fn service() -> ReportService<Arc<InMemoryDocumentStore>> {
        aggreports_observability::init_for_tests();
        ReportService::new(Arc::new(InMemoryDocumentStore::new()))
    }

    #[tokio::test]
    async fn search_returns_matching_inventory() {
        let service = service();
        seeded(&service).await;

        let found = service.search_inventory(&name_is("Mango"), &opts()).await.unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|i| i.name == "Mango"));
        assert!(found.iter().all(|i| i.id.is_some()));
    }

    #[tokio::test]
    async fn float_range_excludes_its_bounds() {
        let service = service();
        seeded(&service).await;

        let criteria = SearchCriteria::new().with(
            "inventory",
            vec![SearchParam::range("total_weight", "float", 5.0, 20.0)],
        );
        let found = service.search_inventory(&criteria, &opts()).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].total_weight, 10.0);
    }

    #[tokio::test]
    async fn empty_search_is_no_results() {
        let service = service();
        seeded(&service).await;

        let err = service
            .search_inventory(&name_is("Durian"), &opts())
            .await
            .unwrap_err();
        assert!(err.is_no_results());
        assert_eq!(err.operation(), Some("search_inventory"));
    }

    #[tokio::test]
    async fn invalid_parameters_never_reach_the_store() {
        let store = Arc::new(RecordingStore::default());
        let service = ReportService::new(store.clone());

        let criteria = SearchCriteria::new().with(
            "inventory",
            vec![
                SearchParam::equal("name", "string", "Mango"),
                SearchParam::range("total_weight", "float", 0.0, 0.0),
            ],
        );
        let err = service.search_inventory(&criteria, &opts()).await.unwrap_err();

        assert!(matches!(
            err,
            ReportError::Validation(ValidationError::MissingBound { index: 1, .. })
        ));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn metrics_join_covers_every_inventory_record() {
        let service = service();
        seeded(&service).await;

        let mangos = service.search_inventory(&name_is("Mango"), &opts()).await.unwrap();
        let metrics = service
            .search_metrics_for_inventory(&mangos, &opts())
            .await
            .unwrap();

        let mut temps: Vec<f64> = metrics.iter().map(|m| m.temp_in).collect();
        temps.sort_by(f64::total_cmp);
        assert_eq!(temps, vec![4.5, 5.5]);
    }

    #[tokio::test]
    async fn last_record_join_only_uses_the_final_record() {
        let service = service().with_join(ForeignKeyJoin::LastRecord);
        seeded(&service).await;

        let mangos = service.search_inventory(&name_is("Mango"), &opts()).await.unwrap();
        let metrics = service
            .search_metrics_for_inventory(&mangos, &opts())
            .await
            .unwrap();

        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].item_id, mangos[1].item_id);
    }

    #[tokio::test]
    async fn last_record_join_without_inventory_matches_everything() {
        let service = service().with_join(ForeignKeyJoin::LastRecord);
        seeded(&service).await;

        let metrics = service.search_metrics_for_inventory(&[], &opts()).await.unwrap();
        assert_eq!(metrics.len(), 3);
    }

    #[tokio::test]
    async fn devices_join_on_device_id() {
        let service = service();
        seeded(&service).await;

        let all = service
            .search_inventory(&SearchCriteria::new(), &opts())
            .await
            .unwrap();
        let devices = service
            .search_devices_for_inventory(&all, &opts())
            .await
            .unwrap();
        assert_eq!(devices.len(), 2);

        let kiwi = service.search_inventory(&name_is("Kiwi"), &opts()).await.unwrap();
        let err = service
            .search_devices_for_inventory(&kiwi, &opts())
            .await
            .unwrap_err();
        assert!(err.is_no_results());
    }

    #[tokio::test]
    async fn metric_report_combines_inventory_and_metrics() {
        let service = service();
        seeded(&service).await;

        let report = service.metric_report(&name_is("Mango"), &opts()).await.unwrap();
        assert_eq!(report.inventory.len(), 2);
        assert!(report.device.is_none());
        let mut temps: Vec<f64> = report.metric.as_deref().unwrap().iter().map(|m| m.temp_in).collect();
        temps.sort_by(f64::total_cmp);
        assert_eq!(temps, vec![4.5, 5.5]);

        let value = serde_json::to_value(&report).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, ["inventory", "metric", "device"]);
        assert_eq!(value["device"], json!(null));
        assert_eq!(value["metric"].as_array().unwrap().len(), 2);

        let back: ReportResponse = serde_json::from_value(value).unwrap();
        assert_eq!(back, report);
    }

    #[tokio::test]
    async fn device_report_combines_inventory_and_devices() {
        let service = service();
        seeded(&service).await;

        let report = service
            .device_report(&SearchCriteria::new(), &opts())
            .await
            .unwrap();
        assert_eq!(report.inventory.len(), 3);
        assert!(report.metric.is_none());
        assert_eq!(report.device.map(|d| d.len()), Some(2));
    }

    #[tokio::test]
    async fn reports_stop_when_inventory_search_finds_nothing() {
        let store = Arc::new(RecordingStore::default());
        let service = ReportService::new(store.clone());
        seeded(&service).await;
        let before = store.calls();

        let err = service
            .metric_report(&name_is("Durian"), &opts())
            .await
            .unwrap_err();
        assert!(err.is_no_results());
        assert_eq!(err.operation(), Some("search_inventory"));
        assert_eq!(store.calls(), before + 1);

        let err = service
            .device_report(&name_is("Durian"), &opts())
            .await
            .unwrap_err();
        assert_eq!(err.operation(), Some("search_inventory"));
        assert_eq!(store.calls(), before + 2);
    }

    #[tokio::test]
    async fn device_report_fails_when_join_finds_nothing() {
        let service = service();
        seeded(&service).await;

        let err = service.device_report(&name_is("Kiwi"), &opts()).await.unwrap_err();
        assert!(err.is_no_results());
        assert_eq!(err.operation(), Some("search_devices_for_inventory"));
    }

    #[tokio::test]
    async fn field_value_search_uses_last_usable_pair() {
        let service = service();
        seeded(&service).await;

        let pairs = [
            SearchByFieldValue::new("name", "Kiwi"),
            SearchByFieldValue::new("name", "Mango"),
            SearchByFieldValue::new("lot", ""),
        ];
        let docs = service
            .search_by_field_value("inventory", &pairs, &opts())
            .await
            .unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs.iter().all(|d| d["name"] == json!("Mango")));

        let metrics = service
            .search_by_field_value("metric", &[SearchByFieldValue::new("temp_in", 5.5)], &opts())
            .await
            .unwrap();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0]["item_id"], json!(EntityId::from_u128(2).to_string()));
    }

    #[tokio::test]
    async fn field_value_search_without_match_is_no_results() {
        let store = Arc::new(RecordingStore::default());
        let service = ReportService::new(store.clone());
        seeded(&service).await;
        let before = store.calls();

        let err = service
            .search_by_field_value("inventory", &[SearchByFieldValue::new("name", "")], &opts())
            .await
            .unwrap_err();
        assert!(err.is_no_results());
        assert_eq!(store.calls(), before);

        let err = service
            .search_by_field_value("inventory", &[SearchByFieldValue::new("name", "Durian")], &opts())
            .await
            .unwrap_err();
        assert_eq!(err.operation(), Some("search_by_field_value"));
        assert_eq!(store.calls(), before + 1);

        let err = service
            .search_by_field_value("inventory", &[SearchByFieldValue::new("name", json!(["a"]))], &opts())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ReportError::Validation(ValidationError::UnsupportedValue { index: 0, .. })
        ));
        assert_eq!(store.calls(), before + 1);
    }

    #[tokio::test]
    async fn weight_distribution_sums_per_product() {
        let service = service();
        seeded(&service).await;

        let mut rows = service.weight_distribution(&opts()).await.unwrap();
        rows.sort_by(|a, b| a.prod_name.cmp(&b.prod_name));

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].prod_name, "Mango");
        assert_eq!(rows[1].total_weight, 15.0);
        assert_eq!(rows[1].waste_weight, 3.0);
        assert_eq!(rows[1].sold_weight, 12.0);
        assert_eq!(rows[0].prod_name, "Kiwi");
        assert_eq!(rows[0].total_weight, 20.0);
    }

    #[tokio::test]
    async fn weight_distribution_of_empty_inventory_is_empty() {
        let rows = service().weight_distribution(&opts()).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn malformed_group_is_a_codec_error() {
        let groups = vec![
            json!({"_id": "Mango", "total_weight": 1.0, "waste_weight": 0.0, "sold_weight": 1.0}),
            json!({"_id": null, "total_weight": 1.0, "waste_weight": 0.0, "sold_weight": 1.0}),
        ]
        .into_iter()
        .filter_map(|v| v.as_object().cloned())
        .collect();
        let service = ReportService::new(FixedGroupsStore(groups));

        let err = service.weight_distribution(&opts()).await.unwrap_err();
        assert!(matches!(
            err,
            ReportError::Codec(CodecError::AggregateShapeMismatch { ref field, .. }) if field == "_id"
        ));
    }

    #[tokio::test]
    async fn undecodable_document_discards_the_batch() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let docs = vec![
            json!({"name": "Mango", "item_id": EntityId::from_u128(1).to_string()}),
            json!({"name": "Mango", "item_id": "not-an-id"}),
        ]
        .into_iter()
        .filter_map(|v| v.as_object().cloned())
        .collect();
        store.insert_many("inventory", docs, &opts()).await.unwrap();

        let err = ReportService::new(store)
            .search_inventory(&name_is("Mango"), &opts())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ReportError::Codec(CodecError::MalformedIdentifier { ref field, .. }) if field == "item_id"
        ));
    }

    #[tokio::test]
    async fn store_failures_carry_the_operation() {
        let service = ReportService::new(UnreachableStore);

        let err = service.search_inventory(&name_is("Mango"), &opts()).await.unwrap_err();
        assert!(!err.is_no_results());
        assert!(matches!(
            err,
            ReportError::Store { operation: "search_inventory", source: StoreError::Connection(_) }
        ));

        let err = service.weight_distribution(&opts()).await.unwrap_err();
        assert_eq!(err.operation(), Some("weight_distribution"));

        let err = service
            .insert_reports(&[Report::default()], &opts())
            .await
            .unwrap_err();
        assert_eq!(err.operation(), Some("insert_reports"));
    }

    #[tokio::test]
    async fn expired_deadline_is_reported_by_the_store() {
        let service = service();
        let expired = CallOptions::with_deadline(Instant::now());

        let err = service
            .search_inventory(&name_is("Mango"), &expired)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ReportError::Store { source: StoreError::DeadlineExceeded(_), .. }
        ));
    }

    #[tokio::test]
    async fn ingest_round_trips_and_skips_empty_batches() {
        let store = Arc::new(RecordingStore::default());
        let service = ReportService::new(store.clone());

        let keys = service.insert_inventory(&[], &opts()).await.unwrap();
        assert!(keys.is_empty());
        assert_eq!(store.calls(), 0);

        let original = item(7, "Papaya", 3.5, 0.5, 3.0);
        let keys = service
            .insert_inventory(std::slice::from_ref(&original), &opts())
            .await
            .unwrap();
        assert_eq!(keys.len(), 1);

        let found = service.search_inventory(&name_is("Papaya"), &opts()).await.unwrap();
        assert_eq!(found[0].id.as_ref(), Some(&keys[0]));
        assert_eq!(Inventory { id: None, ..found[0].clone() }, original);

        let report = Report {
            report_id: EntityId::from_u128(9),
            report_type: "weekly".to_string(),
            total_weight: 3.5,
            ..Report::default()
        };
        let keys = service.insert_reports(&[report], &opts()).await.unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(store.inner.count("report"), 1);
    }

    #[tokio::test]
    async fn configured_collection_names_are_used() {
        let config = StoreConfig {
            collections: Collections {
                inventory: "inv_2024".to_string(),
                ..Collections::default()
            },
            join: ForeignKeyJoin::LastRecord,
            ..StoreConfig::default()
        };
        let store = Arc::new(InMemoryDocumentStore::new());
        let service = ReportService::from_config(store.clone(), &config);
        assert_eq!(service.join(), ForeignKeyJoin::LastRecord);

        service
            .insert_inventory(&[item(1, "Mango", 1.0, 0.0, 1.0)], &config.call_options())
            .await
            .unwrap();
        assert_eq!(store.count("inv_2024"), 1);
        assert_eq!(store.count("inventory"), 0);
    }

    #[test]
    fn entities_serialize_in_wire_shape() {
        let value = serde_json::to_value(item(1, "Mango", 10.0, 1.0, 8.0)).unwrap();
        assert_eq!(value["name"], json!("Mango"));
        assert_eq!(value["item_id"], json!(EntityId::from_u128(1).to_string()));
        assert!(value.get("_id").is_none());
    }
}
