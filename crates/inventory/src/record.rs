use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use koperasi_core::{ItemCode, TransformationId};
use koperasi_events::Event;

use crate::unit::Unit;

/// Source side of a committed transformation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMovement {
    pub code: ItemCode,
    pub unit: Unit,
    pub quantity_removed: f64,
    pub stock_before: f64,
    pub stock_after: f64,
}

/// Target side of a committed transformation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetMovement {
    pub code: ItemCode,
    pub unit: Unit,
    pub quantity_added: f64,
    pub stock_before: f64,
    pub stock_after: f64,
}

/// Audit record of one committed transformation.
///
/// Created once per successful execution and treated as a fact afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformationRecord {
    pub id: TransformationId,
    pub timestamp: DateTime<Utc>,
    pub base_product: String,
    pub source_item: SourceMovement,
    pub target_item: TargetMovement,
    pub conversion_ratio: f64,
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl TransformationRecord {
    /// Whether `code` is either side of this transformation.
    pub fn involves(&self, code: &ItemCode) -> bool {
        &self.source_item.code == code || &self.target_item.code == code
    }
}

/// Event: notification payload for committed transformations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum TransformationEvent {
    StockTransformed(TransformationRecord),
}

impl TransformationEvent {
    pub fn record(&self) -> &TransformationRecord {
        match self {
            TransformationEvent::StockTransformed(r) => r,
        }
    }
}

impl Event for TransformationEvent {
    fn event_type(&self) -> &'static str {
        match self {
            TransformationEvent::StockTransformed(_) => "inventory.stock.transformed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.record().timestamp
    }
}
