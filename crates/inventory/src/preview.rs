//! Non-mutating projection of a transformation, for confirmation screens.

use serde::{Deserialize, Serialize};

use koperasi_core::ItemCode;

use crate::item::InventoryItem;
use crate::unit::Unit;
use crate::validator::ValidatedTransformation;

/// Before/after stock of one side of a transformation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockProjection {
    pub code: ItemCode,
    pub name: String,
    pub unit: Unit,
    pub stock_before: f64,
    pub stock_after: f64,
    /// Signed change (negative for the source side).
    pub change: f64,
}

impl StockProjection {
    fn of(item: &InventoryItem, stock_after: f64) -> Self {
        Self {
            code: item.code().clone(),
            name: item.name().to_string(),
            unit: item.unit().clone(),
            stock_before: item.stock(),
            stock_after,
            change: stock_after - item.stock(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformationPreview {
    pub base_product: String,
    pub source: StockProjection,
    pub target: StockProjection,
    pub quantity: f64,
    pub converted_quantity: f64,
    pub ratio: f64,
    pub is_valid: bool,
}

/// Project the effect of `validated` without touching any store.
///
/// Safe to call on every keystroke of a quantity field.
pub fn preview(validated: &ValidatedTransformation) -> TransformationPreview {
    let source_after = validated.source_stock_after();
    let target_after = validated.target_stock_after();

    TransformationPreview {
        base_product: validated.source().base_product().to_string(),
        source: StockProjection::of(validated.source(), source_after),
        target: StockProjection::of(validated.target(), target_after),
        quantity: validated.quantity(),
        converted_quantity: validated.converted_quantity(),
        ratio: validated.ratio().value(),
        is_valid: source_after >= 0.0,
    }
}
