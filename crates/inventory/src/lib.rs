//! Inventory stock transformation domain.
//!
//! This crate contains the business rules for converting stock between
//! packaging units of the same base product (e.g. kg into gram, dus into pcs),
//! implemented purely as deterministic domain logic (no IO, no storage).
//!
//! The flow is: [`validate`] a request against the [`ConversionRegistry`],
//! [`preview`] its effect, then hand the [`ValidatedTransformation`] to an
//! executor that persists both stock levels and emits a
//! [`TransformationRecord`].

pub mod attempt;
pub mod conversion;
pub mod error;
pub mod item;
pub mod preview;
pub mod record;
pub mod unit;
pub mod validator;

pub use attempt::{TransformationAttempt, TransformationStage};
pub use conversion::{
    ConversionKey, ConversionRatio, ConversionRegistry, ProductScope, RatioError,
    RatioInconsistency,
};
pub use error::{ErrorKind, TransformationError};
pub use item::InventoryItem;
pub use preview::{StockProjection, TransformationPreview, preview};
pub use record::{SourceMovement, TargetMovement, TransformationEvent, TransformationRecord};
pub use unit::Unit;
pub use validator::{TransformationInput, ValidatedTransformation, validate};
