//! Transformation validation.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. both items resolved            -> `ItemNotFound`
//! 2. quantity positive and finite   -> `InvalidQuantity`
//! 3. same base product              -> `IncompatibleProducts`
//! 4. different units                -> `SameUnit`
//! 5. ratio registered               -> `NoConversionPath`
//! 6. source stock covers quantity   -> `InsufficientStock`
//! 7. converted stock stays finite    -> `InvalidQuantity`

use chrono::{DateTime, Utc};

use koperasi_core::TransformationId;

use crate::conversion::{ConversionRatio, ConversionRegistry};
use crate::error::TransformationError;
use crate::item::InventoryItem;
use crate::preview::{TransformationPreview, preview};
use crate::record::{SourceMovement, TargetMovement, TransformationRecord};

/// A transformation request with its items already looked up.
///
/// `source`/`target` are `None` when the code did not resolve.
#[derive(Debug, Clone, Copy)]
pub struct TransformationInput<'a> {
    pub source_code: &'a str,
    pub source: Option<&'a InventoryItem>,
    pub target_code: &'a str,
    pub target: Option<&'a InventoryItem>,
    pub quantity: f64,
}

/// Output of a successful validation: item snapshots plus the computed
/// conversion. Only [`validate`] constructs it.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedTransformation {
    source: InventoryItem,
    target: InventoryItem,
    quantity: f64,
    ratio: ConversionRatio,
    converted_quantity: f64,
}

impl ValidatedTransformation {
    pub fn source(&self) -> &InventoryItem {
        &self.source
    }

    pub fn target(&self) -> &InventoryItem {
        &self.target
    }

    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    pub fn ratio(&self) -> ConversionRatio {
        self.ratio
    }

    pub fn converted_quantity(&self) -> f64 {
        self.converted_quantity
    }

    pub fn source_stock_after(&self) -> f64 {
        self.source.stock() - self.quantity
    }

    pub fn target_stock_after(&self) -> f64 {
        self.target.stock() + self.converted_quantity
    }

    pub fn preview(&self) -> TransformationPreview {
        preview(self)
    }

    /// Build the audit record for this transformation as committed.
    pub fn to_record(
        &self,
        id: TransformationId,
        timestamp: DateTime<Utc>,
        user: impl Into<String>,
        notes: Option<String>,
    ) -> TransformationRecord {
        TransformationRecord {
            id,
            timestamp,
            base_product: self.source.base_product().to_string(),
            source_item: SourceMovement {
                code: self.source.code().clone(),
                unit: self.source.unit().clone(),
                quantity_removed: self.quantity,
                stock_before: self.source.stock(),
                stock_after: self.source_stock_after(),
            },
            target_item: TargetMovement {
                code: self.target.code().clone(),
                unit: self.target.unit().clone(),
                quantity_added: self.converted_quantity,
                stock_before: self.target.stock(),
                stock_after: self.target_stock_after(),
            },
            conversion_ratio: self.ratio.value(),
            user: user.into(),
            notes,
        }
    }
}

/// Validate a transformation request. Pure: no side effects.
pub fn validate(
    input: &TransformationInput<'_>,
    registry: &ConversionRegistry,
) -> Result<ValidatedTransformation, TransformationError> {
    let source = input.source.ok_or_else(|| TransformationError::ItemNotFound {
        code: input.source_code.to_string(),
    })?;
    let target = input.target.ok_or_else(|| TransformationError::ItemNotFound {
        code: input.target_code.to_string(),
    })?;

    let quantity = input.quantity;
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(TransformationError::InvalidQuantity { quantity });
    }

    if source.base_product() != target.base_product() {
        return Err(TransformationError::IncompatibleProducts {
            source_product: source.base_product().to_string(),
            target_product: target.base_product().to_string(),
        });
    }

    if source.unit() == target.unit() {
        return Err(TransformationError::SameUnit {
            unit: source.unit().clone(),
        });
    }

    let ratio = registry
        .get_ratio(source.base_product(), source.unit(), target.unit())
        .ok_or_else(|| TransformationError::NoConversionPath {
            base_product: source.base_product().to_string(),
            from: source.unit().clone(),
            to: target.unit().clone(),
        })?;

    if source.stock() < quantity {
        return Err(TransformationError::InsufficientStock {
            code: source.code().clone(),
            available: source.stock(),
            requested: quantity,
        });
    }

    let converted_quantity = ratio.apply(quantity);
    if !converted_quantity.is_finite() || !(target.stock() + converted_quantity).is_finite() {
        return Err(TransformationError::InvalidQuantity { quantity });
    }

    Ok(ValidatedTransformation {
        source: source.clone(),
        target: target.clone(),
        quantity,
        ratio,
        converted_quantity,
    })
}
