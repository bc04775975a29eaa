//! Unit of measure.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use koperasi_core::{DomainError, DomainResult, ValueObject};

/// Unit of measure (e.g. `dus`, `pcs`, `kg`, `gram`).
///
/// Normalised on construction: surrounding whitespace is dropped and the
/// name is lower-cased, so `"KG"` and `" kg"` are the same unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Unit(String);

impl Unit {
    pub fn new(raw: impl AsRef<str>) -> DomainResult<Self> {
        let normalized = raw.as_ref().trim().to_lowercase();
        if normalized.is_empty() {
            return Err(DomainError::validation("unit cannot be empty"));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for Unit {}

impl core::fmt::Display for Unit {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Unit {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Unit {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Unit> for String {
    fn from(value: Unit) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units_are_normalized() {
        assert_eq!(Unit::new(" KG ").unwrap(), Unit::new("kg").unwrap());
        assert_eq!(Unit::new("Dus").unwrap().as_str(), "dus");
    }

    #[test]
    fn empty_unit_is_rejected() {
        assert!(matches!(Unit::new("  "), Err(DomainError::Validation(_))));
    }
}
