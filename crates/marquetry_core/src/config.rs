//! # Configuration
//!
//! `marquetry.toml` layout. Every field has a default so an empty file is a
//! valid configuration.
//!
//! ```toml
//! [composer]
//! decoration_enabled = true
//! ignored_type_names = ["Transform"]
//!
//! [validator]
//! batch_quota = 64
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Default nodes processed per validator tick.
pub const DEFAULT_BATCH_QUOTA: usize = 64;

/// Composer settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    /// Initial value of the decoration toggle.
    pub decoration_enabled: bool,
    /// Native binding editors; false selects the immediate-mode fallback.
    pub native_bindings: bool,
    /// Type names never inspected for decoration.
    pub ignored_type_names: Vec<String>,
    /// Types drawn as a single-row editor despite having children.
    pub opaque_math_types: Vec<String>,
    /// Property names filtered out of every composition.
    pub hidden_property_names: Vec<String>,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            decoration_enabled: true,
            native_bindings: true,
            ignored_type_names: Vec::new(),
            opaque_math_types: ["Vector2", "Vector2Int", "Vector3", "Vector3Int", "Quaternion"]
                .into_iter()
                .map(String::from)
                .collect(),
            hidden_property_names: vec![crate::value::TYPE_KEY.to_string()],
        }
    }
}

/// Validator settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Nodes processed per tick.
    pub batch_quota: usize,
    /// Location label for owners without a name.
    pub location_name: String,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            batch_quota: DEFAULT_BATCH_QUOTA,
            location_name: "Scene".to_string(),
        }
    }
}

/// Style assets the composer requires.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Sheets that must be registered before composing.
    pub required: Vec<String>,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            required: vec!["global".to_string(), "composer".to_string()],
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MarquetryConfig {
    /// `[composer]`
    pub composer: ComposerConfig,
    /// `[validator]`
    pub validator: ValidatorConfig,
    /// `[styles]`
    pub styles: StyleConfig,
}

impl MarquetryConfig {
    /// Parses and validates TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Checks cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.validator.batch_quota == 0 {
            return Err(ConfigError::Invalid("validator.batch_quota must be positive".into()));
        }
        Ok(())
    }
}
