//! Conversion ratio registry.
//!
//! Ratios are keyed by `(scope, from_unit, to_unit)` and satisfy
//! `quantity_in_to = quantity_in_from * ratio`. Lookups use direct entries
//! only: a product-specific entry wins over a product-independent one, and no
//! ratio is ever composed from other entries or inverted implicitly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use koperasi_core::ValueObject;

use crate::unit::Unit;

/// Product-independent unit ratios seeded by [`ConversionRegistry::with_defaults`].
///
/// Packaging units whose size varies per product (dus, pak, karung) are
/// deliberately absent; those must be registered per base product.
pub const DEFAULT_UNIT_RATIOS: &[(&str, &str, f64)] = &[
    ("kg", "gram", 1000.0),
    ("ton", "kg", 1000.0),
    ("liter", "ml", 1000.0),
    ("lusin", "pcs", 12.0),
    ("kodi", "pcs", 20.0),
    ("gross", "pcs", 144.0),
    ("rim", "lembar", 500.0),
];

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RatioError {
    #[error("invalid conversion ratio {ratio}: must be a positive, finite number")]
    InvalidRatio { ratio: f64 },

    #[error("cannot register a ratio from unit '{unit}' to itself")]
    SameUnit { unit: Unit },

    #[error("base product cannot be empty")]
    EmptyBaseProduct,
}

/// Multiplier converting a quantity from one unit to another.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct ConversionRatio(f64);

impl ConversionRatio {
    pub fn new(ratio: f64) -> Result<Self, RatioError> {
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(RatioError::InvalidRatio { ratio });
        }
        Ok(Self(ratio))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Convert `quantity` expressed in the `from` unit into the `to` unit.
    pub fn apply(self, quantity: f64) -> f64 {
        quantity * self.0
    }

    /// Reciprocal ratio (for the opposite direction).
    pub fn inverse(self) -> Self {
        Self(1.0 / self.0)
    }
}

impl ValueObject for ConversionRatio {}

impl TryFrom<f64> for ConversionRatio {
    type Error = RatioError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ConversionRatio> for f64 {
    fn from(value: ConversionRatio) -> Self {
        value.0
    }
}

/// Which base products a ratio applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductScope {
    /// Applies to every base product (physical unit conversions).
    Any,
    /// Applies to a single base product.
    Product(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConversionKey {
    pub scope: ProductScope,
    pub from: Unit,
    pub to: Unit,
}

/// A registered pair whose reverse entry is not its reciprocal.
#[derive(Debug, Clone, PartialEq)]
pub struct RatioInconsistency {
    pub key: ConversionKey,
    pub ratio: ConversionRatio,
    pub reverse_ratio: ConversionRatio,
}

/// Table of conversion ratios.
///
/// Read-only while transformations run; callers own any mutation (seeding,
/// configuration, maintenance screens).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionRegistry {
    ratios: BTreeMap<ConversionKey, ConversionRatio>,
}

impl ConversionRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with [`DEFAULT_UNIT_RATIOS`], both directions.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for (from, to, ratio) in DEFAULT_UNIT_RATIOS {
            // Static table; covered by `defaults_are_consistent`.
            if let (Ok(from), Ok(to), Ok(ratio)) = (Unit::new(from), Unit::new(to), ConversionRatio::new(*ratio)) {
                registry.insert(ProductScope::Any, from.clone(), to.clone(), ratio);
                registry.insert(ProductScope::Any, to, from, ratio.inverse());
            }
        }
        registry
    }

    /// Resolve the ratio for converting `from` into `to` for `base_product`.
    pub fn get_ratio(&self, base_product: &str, from: &Unit, to: &Unit) -> Option<ConversionRatio> {
        let product_key = ConversionKey {
            scope: ProductScope::Product(base_product.trim().to_string()),
            from: from.clone(),
            to: to.clone(),
        };
        if let Some(ratio) = self.ratios.get(&product_key) {
            return Some(*ratio);
        }

        let generic_key = ConversionKey {
            scope: ProductScope::Any,
            ..product_key
        };
        self.ratios.get(&generic_key).copied()
    }

    /// Insert or overwrite the ratio for `(base_product, from, to)`.
    ///
    /// Returns the previously registered ratio, if any. The reverse direction
    /// is left untouched.
    pub fn set_ratio(
        &mut self,
        base_product: &str,
        from: &Unit,
        to: &Unit,
        ratio: f64,
    ) -> Result<Option<ConversionRatio>, RatioError> {
        let scope = product_scope(base_product)?;
        let ratio = checked(from, to, ratio)?;
        Ok(self.insert(scope, from.clone(), to.clone(), ratio))
    }

    /// Insert or overwrite a product-independent ratio.
    pub fn set_generic_ratio(
        &mut self,
        from: &Unit,
        to: &Unit,
        ratio: f64,
    ) -> Result<Option<ConversionRatio>, RatioError> {
        let ratio = checked(from, to, ratio)?;
        Ok(self.insert(ProductScope::Any, from.clone(), to.clone(), ratio))
    }

    /// Register `a -> b` with `ratio` and `b -> a` with its reciprocal.
    ///
    /// Nothing is written unless both entries are valid.
    pub fn set_ratio_pair(
        &mut self,
        base_product: &str,
        a: &Unit,
        b: &Unit,
        ratio: f64,
    ) -> Result<(), RatioError> {
        let scope = product_scope(base_product)?;
        let forward = checked(a, b, ratio)?;
        self.insert(scope.clone(), a.clone(), b.clone(), forward);
        self.insert(scope, b.clone(), a.clone(), forward.inverse());
        Ok(())
    }

    /// Remove the product-specific ratio for `(base_product, from, to)`.
    pub fn remove_ratio(&mut self, base_product: &str, from: &Unit, to: &Unit) -> Option<ConversionRatio> {
        let key = ConversionKey {
            scope: ProductScope::Product(base_product.trim().to_string()),
            from: from.clone(),
            to: to.clone(),
        };
        self.ratios.remove(&key)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&ConversionKey, ConversionRatio)> {
        self.ratios.iter().map(|(k, v)| (k, *v))
    }

    pub fn len(&self) -> usize {
        self.ratios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratios.is_empty()
    }

    /// Pairs registered in both directions whose ratios are not reciprocal
    /// within `tolerance` (relative). Each offending pair is reported once.
    pub fn inconsistent_pairs(&self, tolerance: f64) -> Vec<RatioInconsistency> {
        let mut found = Vec::new();
        for (key, ratio) in &self.ratios {
            if key.from > key.to {
                continue;
            }
            let reverse_key = ConversionKey {
                scope: key.scope.clone(),
                from: key.to.clone(),
                to: key.from.clone(),
            };
            let Some(reverse) = self.ratios.get(&reverse_key) else {
                continue;
            };
            let product = ratio.value() * reverse.value();
            if (product - 1.0).abs() > tolerance {
                found.push(RatioInconsistency {
                    key: key.clone(),
                    ratio: *ratio,
                    reverse_ratio: *reverse,
                });
            }
        }
        found
    }

    fn insert(&mut self, scope: ProductScope, from: Unit, to: Unit, ratio: ConversionRatio) -> Option<ConversionRatio> {
        self.ratios.insert(ConversionKey { scope, from, to }, ratio)
    }
}

fn product_scope(base_product: &str) -> Result<ProductScope, RatioError> {
    let trimmed = base_product.trim();
    if trimmed.is_empty() {
        return Err(RatioError::EmptyBaseProduct);
    }
    Ok(ProductScope::Product(trimmed.to_string()))
}

fn checked(from: &Unit, to: &Unit, ratio: f64) -> Result<ConversionRatio, RatioError> {
    let ratio = ConversionRatio::new(ratio)?;
    if from == to {
        return Err(RatioError::SameUnit { unit: from.clone() });
    }
    Ok(ratio)
}
