//! Configuration system for the dashboard

use crate::charts::BarMode;
use crate::reader::SheetKind;
use crate::schema::Field;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Default number of workbooks kept by a session cache
pub const DEFAULT_CACHE_CAPACITY: usize = 4;

/// Main dashboard configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub global: GlobalConfig,
    /// Per-sheet sections keyed by exact sheet name
    #[serde(default)]
    pub sheets: HashMap<String, SheetConfig>,
}

impl DashboardConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: DashboardConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Bar mode of the segment chart
    pub fn segment_barmode(&self) -> BarMode {
        self.global.segment_barmode.unwrap_or_default()
    }

    /// Every schema field becomes required
    pub fn strict_schema(&self) -> bool {
        self.global.strict_schema.unwrap_or(false)
    }

    pub fn cache_capacity(&self) -> usize {
        self.global.cache_capacity.unwrap_or(DEFAULT_CACHE_CAPACITY)
    }

    /// Validate sheet sections and parameter keys
    pub fn validate(&self) -> Result<()> {
        if self.global.cache_capacity == Some(0) {
            anyhow::bail!("Configuration error: 'cache_capacity' must be at least 1");
        }

        for key in self.global.params.keys() {
            validate_param_key(key).map_err(|e| anyhow::anyhow!("{} in [global]", e))?;
        }

        for (sheet_name, sheet_config) in &self.sheets {
            if SheetKind::from_sheet_name(sheet_name).is_none() {
                anyhow::bail!(
                    "Configuration error: Unknown sheet '{}' (expected one of: {})",
                    sheet_name,
                    SheetKind::ALL
                        .iter()
                        .map(|k| k.sheet_name())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
            for key in sheet_config.params.keys() {
                validate_param_key(key)
                    .map_err(|e| anyhow::anyhow!("{} in sheet '{}'", e, sheet_name))?;
            }
        }

        Ok(())
    }

    /// Get a parameter value as string array with fallback chain: sheet -> global
    pub fn get_param_array(&self, key: &str, sheet_name: Option<&str>) -> Option<Vec<String>> {
        // Try sheet-specific first
        if let Some(sheet) = sheet_name.and_then(|name| self.sheets.get(name)) {
            if let Some(arr) = sheet.params.get(key).and_then(as_string_array) {
                return Some(arr);
            }
        }

        // Try global
        self.global.params.get(key).and_then(as_string_array)
    }
}

/// Global configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// "stack" or "group"
    #[serde(default)]
    pub segment_barmode: Option<BarMode>,
    #[serde(default)]
    pub strict_schema: Option<bool>,
    #[serde(default)]
    pub cache_capacity: Option<usize>,
    /// Segments selected when the caller does not pick any
    #[serde(default)]
    pub default_segments: Vec<String>,
    #[serde(flatten)]
    pub params: HashMap<String, toml::Value>,
}

/// Sheet-specific configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SheetConfig {
    #[serde(flatten)]
    pub params: HashMap<String, toml::Value>,
}

fn as_string_array(value: &toml::Value) -> Option<Vec<String>> {
    value.as_array().map(|arr| {
        arr.iter()
            .filter_map(|item| item.as_str().map(|s| s.to_string()))
            .collect()
    })
}

/// Free-form keys must be `<field>_aliases`
fn validate_param_key(key: &str) -> Result<()> {
    let field = key
        .strip_suffix("_aliases")
        .and_then(Field::from_key);
    if field.is_none() {
        anyhow::bail!("Configuration error: Unknown key '{}'", key);
    }
    Ok(())
}
