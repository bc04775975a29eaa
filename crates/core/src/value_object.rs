//! Value object trait: equality by value, not identity.
//!
//! Value objects are domain objects that have **no identity** - they are defined entirely
//! by their attribute values. Two value objects with the same values are considered equal.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// construct a new one; constructors are where validation happens, so a value
/// object that exists is always valid.
///
/// ## Value Object vs Entity
///
/// - **Value Object**: No identity (a unit `"kg"` equals every other `"kg"`)
/// - **Entity**: Has identity (an inventory item stays the same item as its stock changes)
///
/// ## Usage Pattern
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq)]
/// struct ConversionRatio(f64);
///
/// impl ValueObject for ConversionRatio {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
