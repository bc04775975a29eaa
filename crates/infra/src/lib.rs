//! Infrastructure layer: stores, audit sinks, notification, config, and the
//! transformation engine that orchestrates them.

pub mod audit;
pub mod config;
pub mod engine;
pub mod notify;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use audit::{AuditError, AuditSink, InMemoryAuditLog, JsonLinesAuditLog};
pub use config::{EngineConfig, RatioEntry};
pub use engine::{TransformationEngine, TransformationRequest};
pub use notify::{BusNotifier, TransformationObserver};
pub use store::{InMemoryInventoryStore, InventoryStore, StoreError};
