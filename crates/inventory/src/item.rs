use serde::{Deserialize, Serialize};

use koperasi_core::{DomainError, DomainResult, Entity, ItemCode};

use crate::unit::Unit;

/// Entity: InventoryItem.
///
/// One packaging-unit variant of a base product. Items that share
/// `base_product` but differ in `unit` can be converted into one another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawInventoryItem", into = "RawInventoryItem")]
pub struct InventoryItem {
    code: ItemCode,
    name: String,
    unit: Unit,
    base_product: String,
    stock: f64,
    version: u64,
}

impl InventoryItem {
    pub fn new(
        code: ItemCode,
        name: impl Into<String>,
        unit: Unit,
        base_product: impl Into<String>,
        stock: f64,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        let base_product = base_product.into().trim().to_string();
        if base_product.is_empty() {
            return Err(DomainError::validation("base product cannot be empty"));
        }

        ensure_stock(stock)?;

        Ok(Self {
            code,
            name,
            unit,
            base_product,
            stock,
            version: 0,
        })
    }

    pub fn code(&self) -> &ItemCode {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    pub fn base_product(&self) -> &str {
        &self.base_product
    }

    pub fn stock(&self) -> f64 {
        self.stock
    }

    /// Restore a persisted version (store adapters rehydrating rows).
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// Whether stock can be transformed between `self` and `other`.
    pub fn is_convertible_with(&self, other: &InventoryItem) -> bool {
        self.base_product == other.base_product && self.unit != other.unit
    }

    /// Replace the stock level and advance the version.
    ///
    /// Stock must stay non-negative and finite.
    pub fn set_stock(&mut self, stock: f64) -> DomainResult<()> {
        ensure_stock(stock)?;
        self.stock = stock;
        self.version += 1;
        Ok(())
    }
}

impl Entity for InventoryItem {
    type Id = ItemCode;

    fn id(&self) -> &Self::Id {
        &self.code
    }

    fn version(&self) -> u64 {
        self.version
    }
}

fn ensure_stock(stock: f64) -> DomainResult<()> {
    if !stock.is_finite() {
        return Err(DomainError::validation("stock must be a finite number"));
    }
    if stock < 0.0 {
        return Err(DomainError::invariant("stock cannot go negative"));
    }
    Ok(())
}

/// Wire shape; deserialization goes through [`InventoryItem::new`].
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawInventoryItem {
    code: ItemCode,
    name: String,
    unit: Unit,
    base_product: String,
    stock: f64,
    #[serde(default)]
    version: u64,
}

impl TryFrom<RawInventoryItem> for InventoryItem {
    type Error = DomainError;

    fn try_from(raw: RawInventoryItem) -> Result<Self, Self::Error> {
        Ok(InventoryItem::new(raw.code, raw.name, raw.unit, raw.base_product, raw.stock)?
            .with_version(raw.version))
    }
}

impl From<InventoryItem> for RawInventoryItem {
    fn from(item: InventoryItem) -> Self {
        Self {
            code: item.code,
            name: item.name,
            unit: item.unit,
            base_product: item.base_product,
            stock: item.stock,
            version: item.version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn new_item_starts_at_version_zero() {
        let rice = item("BRG001", "kg", "BRG001", 100.0);
        assert_eq!(rice.version(), 0);
        assert_eq!(rice.stock(), 100.0);
        assert_eq!(rice.id().as_str(), "BRG001");
    }

    #[test]
    fn negative_stock_is_rejected() {
        let err = InventoryItem::new(
            ItemCode::new("BRG001").unwrap(),
            "Rice",
            Unit::new("kg").unwrap(),
            "BRG001",
            -1.0,
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn set_stock_advances_version() {
        let mut rice = item("BRG001", "kg", "BRG001", 100.0);
        rice.set_stock(95.0).unwrap();
        assert_eq!(rice.stock(), 95.0);
        assert_eq!(rice.version(), 1);

        assert!(rice.set_stock(f64::NAN).is_err());
        assert_eq!(rice.version(), 1);
    }

    #[test]
    fn convertibility_requires_same_product_and_different_unit() {
        let kg = item("BRG001", "kg", "BRG001", 100.0);
        let gram = item("BRG002", "gram", "BRG001", 50_000.0);
        let other_kg = item("BRG003", "kg", "BRG001", 5.0);
        let sugar = item("GLA001", "gram", "GLA001", 5.0);

        assert!(kg.is_convertible_with(&gram));
        assert!(!kg.is_convertible_with(&other_kg));
        assert!(!kg.is_convertible_with(&sugar));
    }

    #[test]
    fn deserialization_validates_and_keeps_version() {
        let json = r#"{"code":"BRG002","name":"Rice (gram)","unit":"Gram","baseProduct":"BRG001","stock":50000,"version":4}"#;
        let parsed: InventoryItem = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.unit().as_str(), "gram");
        assert_eq!(parsed.version(), 4);

        let bad = r#"{"code":"BRG002","name":"Rice","unit":"gram","baseProduct":"BRG001","stock":-3}"#;
        assert!(serde_json::from_str::<InventoryItem>(bad).is_err());
    }
}
