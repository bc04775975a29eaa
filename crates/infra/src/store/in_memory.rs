use std::collections::HashMap;
use std::sync::RwLock;

use koperasi_core::{Entity, ExpectedVersion, ItemCode};
use koperasi_inventory::InventoryItem;

use super::{InventoryStore, StoreError};

/// In-memory inventory store for tests/dev and single-process deployments.
#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    items: RwLock<HashMap<ItemCode, InventoryItem>>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: impl IntoIterator<Item = InventoryItem>) -> Self {
        let map = items
            .into_iter()
            .map(|item| (item.code().clone(), item))
            .collect();
        Self {
            items: RwLock::new(map),
        }
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("lock poisoned".to_string())
}

impl InventoryStore for InMemoryInventoryStore {
    fn get(&self, code: &ItemCode) -> Result<Option<InventoryItem>, StoreError> {
        let items = self.items.read().map_err(|_| poisoned())?;
        Ok(items.get(code).cloned())
    }

    fn update_stock(
        &self,
        code: &ItemCode,
        stock: f64,
        expected: ExpectedVersion,
    ) -> Result<InventoryItem, StoreError> {
        let mut items = self.items.write().map_err(|_| poisoned())?;
        let item = items
            .get_mut(code)
            .ok_or_else(|| StoreError::NotFound(code.clone()))?;

        let current = item.version();
        if !expected.matches(current) {
            return Err(StoreError::Concurrency(format!(
                "{code}: expected {expected:?}, found {current}"
            )));
        }

        item.set_stock(stock).map_err(StoreError::Rejected)?;
        Ok(item.clone())
    }

    fn upsert(&self, item: InventoryItem) -> Result<(), StoreError> {
        let mut items = self.items.write().map_err(|_| poisoned())?;

        // Replacing a record still counts as a write for concurrency purposes.
        let item = match items.get(item.code()) {
            Some(existing) => {
                let next = existing.version().max(item.version()) + 1;
                item.with_version(next)
            }
            None => item,
        };
        items.insert(item.code().clone(), item);
        Ok(())
    }

    fn list(&self) -> Result<Vec<InventoryItem>, StoreError> {
        let items = self.items.read().map_err(|_| poisoned())?;
        let mut all: Vec<_> = items.values().cloned().collect();
        all.sort_by(|a, b| a.code().cmp(b.code()));
        Ok(all)
    }
}
