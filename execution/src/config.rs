use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use core_types::DataType;
use serde::Deserialize;

use crate::promotion::PromotionTable;

/// One whitelisted conversion, by canonical dtype name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Promotion {
    pub from: DataType,
    pub to:   DataType,
}

/// Resolver settings, usually read from YAML:
///
/// ```yaml
/// use_default_promotions: true
/// promotions:
///   - { from: int32, to: int64 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchConfig {
    /// Start from the widenings in `supported_types.yaml`
    pub use_default_promotions: bool,
    /// Extra entries on top of (or instead of) the defaults
    pub promotions: Vec<Promotion>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self { use_default_promotions: true, promotions: Vec::new() }
    }
}

impl DispatchConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("invalid dispatch configuration")
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_yaml_str(&yaml).with_context(|| format!("in {}", path.display()))
    }

    pub fn promotion_table(&self) -> PromotionTable {
        let mut table = if self.use_default_promotions {
            PromotionTable::widening()
        } else {
            PromotionTable::exact_only()
        };
        for p in &self.promotions {
            table.allow(p.from, p.to);
        }
        table
    }
}
