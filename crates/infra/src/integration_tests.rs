//! Integration tests for the full transformation pipeline.
//!
//! Tests: request → engine → store → audit sink → event bus
//!
//! Verifies:
//! - The documented kg/gram scenarios end in the expected stock levels
//! - Rejected requests leave every stock level untouched
//! - Committed records reach the audit log and bus subscribers
//! - Partial writes are compensated and racing writers never oversell

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use proptest::prelude::*;

    use koperasi_core::{Entity, ExpectedVersion, ItemCode};
    use koperasi_events::{Event, EventBus, EventEnvelope, InMemoryEventBus};
    use koperasi_inventory::{
        ConversionRegistry, ErrorKind, InventoryItem, TransformationError, TransformationEvent, Unit,
    };

    use crate::audit::{InMemoryAuditLog, JsonLinesAuditLog, read_records};
    use crate::config::EngineConfig;
    use crate::engine::TransformationEngine;
    use crate::notify::BusNotifier;
    use crate::store::{InMemoryInventoryStore, InventoryStore, StoreError};

    type Engine = TransformationEngine<Arc<InMemoryInventoryStore>, Arc<InMemoryAuditLog>>;

    fn item(code: &str, unit: &str, base: &str, stock: f64) -> InventoryItem {
        InventoryItem::new(
            ItemCode::new(code).unwrap(),
            format!("Item {code}"),
            Unit::new(unit).unwrap(),
            base,
            stock,
        )
        .unwrap()
    }

    fn unit(s: &str) -> Unit {
        Unit::new(s).unwrap()
    }

    /// BRG001 (kg, 100) and BRG002 (gram, 50000), both base product BRG001,
    /// with kg -> gram = 1000 registered explicitly.
    fn setup_with(extra: Vec<InventoryItem>) -> (Engine, Arc<InMemoryInventoryStore>, Arc<InMemoryAuditLog>) {
        koperasi_observability::init_for_tests();

        let mut items = vec![
            item("BRG001", "kg", "BRG001", 100.0),
            item("BRG002", "gram", "BRG001", 50_000.0),
        ];
        items.extend(extra);

        let store = Arc::new(InMemoryInventoryStore::with_items(items));
        let audit = Arc::new(InMemoryAuditLog::new());

        let mut registry = ConversionRegistry::new();
        registry.set_ratio("BRG001", &unit("kg"), &unit("gram"), 1000.0).unwrap();

        let engine = TransformationEngine::new(store.clone(), registry, audit.clone());
        (engine, store, audit)
    }

    fn setup() -> (Engine, Arc<InMemoryInventoryStore>, Arc<InMemoryAuditLog>) {
        setup_with(vec![])
    }

    fn stock_of(store: &InMemoryInventoryStore, code: &str) -> f64 {
        store
            .get(&ItemCode::new(code).unwrap())
            .unwrap()
            .unwrap()
            .stock()
    }

    fn snapshot(store: &InMemoryInventoryStore) -> Vec<(String, f64, u64)> {
        store
            .list()
            .unwrap()
            .into_iter()
            .map(|i| (i.code().to_string(), i.stock(), i.version()))
            .collect()
    }

    #[test]
    fn basic_conversion_moves_stock_between_units() {
        let (engine, store, audit) = setup();

        let preview = engine.preview("BRG001", "BRG002", 5.0).unwrap();
        assert_eq!(preview.converted_quantity, 5000.0);

        let record = engine.execute("BRG001", "BRG002", 5.0, "admin").unwrap();

        assert_eq!(stock_of(&store, "BRG001"), 95.0);
        assert_eq!(stock_of(&store, "BRG002"), 55_000.0);
        assert_eq!(record.target_item.quantity_added, 5000.0);
        assert_eq!(record.source_item.stock_before, 100.0);
        assert_eq!(record.target_item.stock_before, 50_000.0);
        assert_eq!(record.conversion_ratio, 1000.0);
        assert_eq!(audit.entries(), vec![record]);
    }

    #[test]
    fn insufficient_stock_changes_nothing() {
        let (engine, store, audit) = setup();
        let before = snapshot(&store);

        let err = engine.execute("BRG001", "BRG002", 150.0, "admin").unwrap_err();

        assert_eq!(
            err,
            TransformationError::InsufficientStock {
                code: ItemCode::new("BRG001").unwrap(),
                available: 100.0,
                requested: 150.0,
            }
        );
        assert_eq!(snapshot(&store), before);
        assert!(audit.is_empty());
    }

    #[test]
    fn incompatible_products_change_nothing() {
        let (engine, store, audit) = setup_with(vec![item("GLA001", "gram", "BRG002", 10.0)]);
        let before = snapshot(&store);

        let err = engine.execute("BRG001", "GLA001", 1.0, "admin").unwrap_err();

        assert_eq!(err.kind(), ErrorKind::IncompatibleProducts);
        assert_eq!(snapshot(&store), before);
        assert!(audit.is_empty());
    }

    #[test]
    fn same_unit_changes_nothing() {
        let (engine, store, _audit) = setup_with(vec![
            item("SBN001", "pcs", "SBN", 10.0),
            item("SBN002", "pcs", "SBN", 3.0),
        ]);
        let before = snapshot(&store);

        let err = engine.execute("SBN001", "SBN002", 1.0, "admin").unwrap_err();

        assert_eq!(err.kind(), ErrorKind::SameUnit);
        assert_eq!(snapshot(&store), before);
    }

    #[test]
    fn transforming_an_item_into_itself_changes_nothing() {
        let (engine, store, audit) = setup();
        let before = snapshot(&store);

        let err = engine.execute("BRG001", "BRG001", 5.0, "admin").unwrap_err();

        assert_eq!(err, TransformationError::SameUnit { unit: unit("kg") });
        assert_eq!(snapshot(&store), before);
        assert!(audit.is_empty());
    }

    #[test]
    fn unknown_item_is_rejected() {
        let (engine, _store, _audit) = setup();
        let err = engine.preview("BRG001", "BRG999", 1.0).unwrap_err();
        assert_eq!(err, TransformationError::ItemNotFound { code: "BRG999".into() });
    }

    #[test]
    fn stale_preview_cannot_be_committed() {
        let (engine, store, _audit) = setup();

        let preview = engine.preview("BRG001", "BRG002", 80.0).unwrap();
        assert!(preview.is_valid);

        // Stock sold elsewhere between preview and confirmation.
        store
            .update_stock(&ItemCode::new("BRG001").unwrap(), 50.0, ExpectedVersion::Any)
            .unwrap();

        let err = engine.execute("BRG001", "BRG002", 80.0, "admin").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientStock);
        assert_eq!(stock_of(&store, "BRG002"), 50_000.0);
    }

    #[test]
    fn committed_transformations_are_published_on_the_bus() {
        let (engine, _store, _audit) = setup();
        let bus: Arc<InMemoryEventBus<EventEnvelope<TransformationEvent>>> = Arc::new(InMemoryEventBus::new());
        let subscription = bus.subscribe();
        let notifier = BusNotifier::new(bus.clone());

        let record = engine.execute_with("BRG001", "BRG002", 2.0, "admin", &notifier).unwrap();
        let _ = engine.execute_with("BRG001", "BRG002", 2_000.0, "admin", &notifier);

        let delivered = subscription.drain();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].event_type(), "inventory.stock.transformed");
        assert_eq!(delivered[0].payload().record(), &record);
        assert_eq!(delivered[0].occurred_at(), delivered[0].payload().occurred_at());
    }

    #[test]
    fn json_lines_audit_log_round_trips_records() {
        koperasi_observability::init_for_tests();
        let store = InMemoryInventoryStore::with_items([
            item("MIE001", "dus", "MIE", 10.0),
            item("MIE002", "pcs", "MIE", 0.0),
        ]);
        let mut registry = ConversionRegistry::new();
        registry.set_ratio_pair("MIE", &unit("dus"), &unit("pcs"), 40.0).unwrap();
        let audit = Arc::new(JsonLinesAuditLog::new(Vec::new()));
        let engine = TransformationEngine::new(store, registry, audit.clone());

        let first = engine.execute("MIE001", "MIE002", 2.0, "gudang").unwrap();
        let second = engine.execute("MIE002", "MIE001", 40.0, "gudang").unwrap();
        drop(engine);

        let written = Arc::try_unwrap(audit).unwrap().into_inner().unwrap();
        let records = read_records(written.as_slice()).unwrap();

        assert_eq!(records, vec![first, second]);
        assert_eq!(records[1].target_item.stock_after, 9.0);
    }

    #[test]
    fn engine_from_config_uses_configured_ratios() {
        koperasi_observability::init_for_tests();
        let config = EngineConfig::from_json_str(
            r#"{ "ratios": [ { "base_product": "MIE", "from_unit": "dus", "to_unit": "pcs", "ratio": 40 } ] }"#,
        )
        .unwrap();
        let store = InMemoryInventoryStore::with_items([
            item("MIE001", "dus", "MIE", 3.0),
            item("MIE002", "pcs", "MIE", 5.0),
        ]);
        let engine = TransformationEngine::from_config(store, InMemoryAuditLog::new(), &config).unwrap();

        engine.execute("MIE001", "MIE002", 1.0, "admin").unwrap();
        assert_eq!(stock_of(engine.store(), "MIE002"), 45.0);

        // The reverse direction was never registered.
        let err = engine.preview("MIE002", "MIE001", 40.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoConversionPath);
    }

    #[test]
    fn audit_log_can_be_filtered_by_item() {
        let (engine, _store, audit) = setup_with(vec![
            item("GLA001", "kg", "GLA", 10.0),
            item("GLA002", "gram", "GLA", 0.0),
        ]);
        // Generic kg -> gram is not registered in `setup`; GLA needs its own.
        let err = engine.execute("GLA001", "GLA002", 1.0, "admin").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoConversionPath);

        engine.execute("BRG001", "BRG002", 1.0, "admin").unwrap();
        engine.execute("BRG001", "BRG002", 1.0, "admin").unwrap();

        assert_eq!(audit.for_item(&ItemCode::new("BRG002").unwrap()).len(), 2);
        assert!(audit.for_item(&ItemCode::new("GLA001").unwrap()).is_empty());
    }

    /// Store whose writes to one item are refused.
    struct ReadOnlyItem {
        inner: Arc<InMemoryInventoryStore>,
        frozen: ItemCode,
    }

    impl InventoryStore for ReadOnlyItem {
        fn get(&self, code: &ItemCode) -> Result<Option<InventoryItem>, StoreError> {
            self.inner.get(code)
        }

        fn update_stock(
            &self,
            code: &ItemCode,
            stock: f64,
            expected: ExpectedVersion,
        ) -> Result<InventoryItem, StoreError> {
            if code == &self.frozen {
                return Err(StoreError::Unavailable(format!("{code} is locked for stock take")));
            }
            self.inner.update_stock(code, stock, expected)
        }

        fn upsert(&self, item: InventoryItem) -> Result<(), StoreError> {
            self.inner.upsert(item)
        }

        fn list(&self) -> Result<Vec<InventoryItem>, StoreError> {
            self.inner.list()
        }
    }

    #[test]
    fn failed_target_write_is_compensated() {
        koperasi_observability::init_for_tests();
        let inner = Arc::new(InMemoryInventoryStore::with_items([
            item("BRG001", "kg", "BRG001", 100.0),
            item("BRG002", "gram", "BRG001", 50_000.0),
        ]));
        let store = ReadOnlyItem {
            inner: inner.clone(),
            frozen: ItemCode::new("BRG002").unwrap(),
        };
        let audit = Arc::new(InMemoryAuditLog::new());
        let engine = TransformationEngine::new(store, ConversionRegistry::with_defaults(), audit.clone());
        let seen = std::sync::Mutex::new(0);
        let observer = |_: &koperasi_inventory::TransformationRecord| *seen.lock().unwrap() += 1;

        let err = engine.execute_with("BRG001", "BRG002", 5.0, "admin", &observer).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Persistence);
        assert_eq!(stock_of(&inner, "BRG001"), 100.0);
        assert_eq!(stock_of(&inner, "BRG002"), 50_000.0);
        assert!(audit.is_empty());
        assert_eq!(*seen.lock().unwrap(), 0);
    }

    #[test]
    fn racing_executions_never_oversell() {
        let (engine, store, audit) = setup();

        let results: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..2)
                .map(|_| scope.spawn(|| engine.execute("BRG001", "BRG002", 60.0, "kasir")))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let committed = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(committed, 1);
        for result in &results {
            if let Err(err) = result {
                assert_eq!(err.kind(), ErrorKind::InsufficientStock);
            }
        }
        assert_eq!(stock_of(&store, "BRG001"), 40.0);
        assert_eq!(stock_of(&store, "BRG002"), 110_000.0);
        assert_eq!(audit.len(), 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            ..ProptestConfig::default()
        })]

        /// Property: executions either apply exactly the documented stock
        /// shape or leave the store untouched with `InsufficientStock`.
        #[test]
        fn execution_conserves_stock_shape(
            source_stock in 0.0f64..500.0,
            target_stock in 0.0f64..500.0,
            quantity in 0.001f64..600.0,
            ratio in 0.01f64..100.0,
        ) {
            let store = InMemoryInventoryStore::with_items([
                item("S", "dus", "P", source_stock),
                item("T", "pcs", "P", target_stock),
            ]);
            let mut registry = ConversionRegistry::new();
            registry.set_ratio("P", &unit("dus"), &unit("pcs"), ratio).unwrap();
            let engine = TransformationEngine::new(store, registry, InMemoryAuditLog::new());

            match engine.execute("S", "T", quantity, "prop") {
                Ok(record) => {
                    prop_assert!(quantity <= source_stock);
                    prop_assert_eq!(stock_of(engine.store(), "S"), source_stock - quantity);
                    prop_assert_eq!(stock_of(engine.store(), "T"), target_stock + quantity * ratio);
                    prop_assert!(record.source_item.stock_after >= 0.0);
                    prop_assert_eq!(engine.audit().len(), 1);
                }
                Err(err) => {
                    prop_assert!(quantity > source_stock);
                    prop_assert_eq!(err.kind(), ErrorKind::InsufficientStock);
                    prop_assert_eq!(stock_of(engine.store(), "S"), source_stock);
                    prop_assert_eq!(stock_of(engine.store(), "T"), target_stock);
                    prop_assert!(engine.audit().is_empty());
                }
            }
        }
    }
}
