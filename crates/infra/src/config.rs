//! Engine configuration.
//!
//! Loaded from a JSON document, typically at startup:
//!
//! ```json
//! {
//!   "seed_default_ratios": true,
//!   "max_conflict_retries": 3,
//!   "ratios": [
//!     { "base_product": "MIE001", "from_unit": "dus", "to_unit": "pcs", "ratio": 40 },
//!     { "base_product": "MIE001", "from_unit": "pcs", "to_unit": "dus", "ratio": 0.025 },
//!     { "from_unit": "karung", "to_unit": "kg", "ratio": 50 }
//!   ]
//! }
//! ```
//!
//! Entries without `base_product` apply to every product.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use koperasi_inventory::{ConversionRegistry, RatioError, Unit};

/// Environment variable naming the config file read by [`EngineConfig::from_env`].
pub const CONFIG_PATH_ENV: &str = "KOPERASI_ENGINE_CONFIG";

pub const DEFAULT_MAX_CONFLICT_RETRIES: u32 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_product: Option<String>,
    pub from_unit: Unit,
    pub to_unit: Unit,
    pub ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub seed_default_ratios: bool,
    pub ratios: Vec<RatioEntry>,
    pub max_conflict_retries: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed_default_ratios: true,
            ratios: Vec::new(),
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("invalid engine config JSON")?;
        config
            .build_registry()
            .context("engine config contains an invalid conversion ratio")?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read engine config at {}", path.display()))?;
        Self::from_json_str(&raw).with_context(|| format!("failed to load {}", path.display()))
    }

    /// Load from the file named by `KOPERASI_ENGINE_CONFIG`, or defaults when unset.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::from_path(path),
            None => Ok(Self::default()),
        }
    }

    /// Build the conversion registry described by this config.
    ///
    /// Entries are applied in order after the defaults, so a configured ratio
    /// overrides a seeded one.
    pub fn build_registry(&self) -> Result<ConversionRegistry, RatioError> {
        let mut registry = if self.seed_default_ratios {
            ConversionRegistry::with_defaults()
        } else {
            ConversionRegistry::new()
        };

        for entry in &self.ratios {
            match &entry.base_product {
                Some(product) => registry.set_ratio(product, &entry.from_unit, &entry.to_unit, entry.ratio)?,
                None => registry.set_generic_ratio(&entry.from_unit, &entry.to_unit, entry.ratio)?,
            };
        }

        Ok(registry)
    }
}
