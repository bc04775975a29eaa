//! Transformation error taxonomy.

use thiserror::Error;

use koperasi_core::ItemCode;

use crate::unit::Unit;

/// Why a transformation was rejected or failed.
///
/// Every variant except [`TransformationError::Persistence`] is a validation
/// failure: the request was bad and nothing was mutated. `Persistence` is an
/// execution-time fault of the store and may be worth retrying.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransformationError {
    #[error("item not found: '{code}'")]
    ItemNotFound { code: String },

    #[error("invalid quantity {quantity}: must be a positive, finite number")]
    InvalidQuantity { quantity: f64 },

    #[error("items belong to different base products ('{source_product}' vs '{target_product}')")]
    IncompatibleProducts {
        source_product: String,
        target_product: String,
    },

    #[error("source and target are both measured in '{unit}'")]
    SameUnit { unit: Unit },

    #[error("no conversion ratio registered for '{base_product}' from '{from}' to '{to}'")]
    NoConversionPath {
        base_product: String,
        from: Unit,
        to: Unit,
    },

    #[error("insufficient stock for {code}: available {available}, requested {requested}")]
    InsufficientStock {
        code: ItemCode,
        available: f64,
        requested: f64,
    },

    #[error("persistence failure: {0}")]
    Persistence(String),
}

/// Fieldless discriminant of [`TransformationError`], for message lookup
/// tables and metrics labels.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ItemNotFound,
    InvalidQuantity,
    IncompatibleProducts,
    SameUnit,
    NoConversionPath,
    InsufficientStock,
    Persistence,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::ItemNotFound => "item_not_found",
            ErrorKind::InvalidQuantity => "invalid_quantity",
            ErrorKind::IncompatibleProducts => "incompatible_products",
            ErrorKind::SameUnit => "same_unit",
            ErrorKind::NoConversionPath => "no_conversion_path",
            ErrorKind::InsufficientStock => "insufficient_stock",
            ErrorKind::Persistence => "persistence_error",
        }
    }
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TransformationError {
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TransformationError::ItemNotFound { .. } => ErrorKind::ItemNotFound,
            TransformationError::InvalidQuantity { .. } => ErrorKind::InvalidQuantity,
            TransformationError::IncompatibleProducts { .. } => ErrorKind::IncompatibleProducts,
            TransformationError::SameUnit { .. } => ErrorKind::SameUnit,
            TransformationError::NoConversionPath { .. } => ErrorKind::NoConversionPath,
            TransformationError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            TransformationError::Persistence(_) => ErrorKind::Persistence,
        }
    }

    /// True for request-level rejections (no mutation was attempted).
    pub fn is_validation(&self) -> bool {
        self.kind() != ErrorKind::Persistence
    }
}
