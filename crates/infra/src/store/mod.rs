//! Inventory store boundary.
//!
//! The transformation engine reads items and writes stock levels through
//! [`InventoryStore`]. Writes carry an [`ExpectedVersion`] so a stale
//! read-modify-write is rejected instead of silently overwriting a concurrent
//! change.

pub mod in_memory;

pub use in_memory::InMemoryInventoryStore;

use std::sync::Arc;

use thiserror::Error;

use koperasi_core::{DomainError, ExpectedVersion, ItemCode};
use koperasi_inventory::InventoryItem;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("item not found: {0}")]
    NotFound(ItemCode),

    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("stock value rejected: {0}")]
    Rejected(DomainError),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Keyed item storage with versioned stock updates.
///
/// Implementations must:
/// - return `Ok(None)` (not an error) for unknown codes from `get`
/// - apply `update_stock` only when `expected` matches the stored version
/// - advance the stored version on every successful write
pub trait InventoryStore: Send + Sync {
    fn get(&self, code: &ItemCode) -> Result<Option<InventoryItem>, StoreError>;

    /// Set the stock of `code`, returning the item as written.
    fn update_stock(
        &self,
        code: &ItemCode,
        stock: f64,
        expected: ExpectedVersion,
    ) -> Result<InventoryItem, StoreError>;

    /// Insert or replace an item (inventory management, seeding).
    fn upsert(&self, item: InventoryItem) -> Result<(), StoreError>;

    fn list(&self) -> Result<Vec<InventoryItem>, StoreError>;
}

impl<S> InventoryStore for Arc<S>
where
    S: InventoryStore + ?Sized,
{
    fn get(&self, code: &ItemCode) -> Result<Option<InventoryItem>, StoreError> {
        (**self).get(code)
    }

    fn update_stock(
        &self,
        code: &ItemCode,
        stock: f64,
        expected: ExpectedVersion,
    ) -> Result<InventoryItem, StoreError> {
        (**self).update_stock(code, stock, expected)
    }

    fn upsert(&self, item: InventoryItem) -> Result<(), StoreError> {
        (**self).upsert(item)
    }

    fn list(&self) -> Result<Vec<InventoryItem>, StoreError> {
        (**self).list()
    }
}
