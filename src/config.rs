//! Arena Configuration
//!
//! Sizing and compaction thresholds for slot storage, stored as RON so
//! they can sit next to the rest of a project's settings.
//!
//! The core never compacts on its own: moving slots would break every
//! outstanding handle. `should_compact` only answers whether a consumer
//! that owns all its handles (and can re-issue them) ought to.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Slots reserved up front
    pub initial_capacity: u32,
    /// Free slots required before compaction is worth considering
    pub min_deleted_elements: u32,
    /// Share of free slots (0.0 - 1.0) required before compaction is suggested
    pub max_deleted_fraction: f32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 0,
            min_deleted_elements: 64,
            max_deleted_fraction: 0.5,
        }
    }
}

impl ArenaConfig {
    /// Whether an arena with `len` live slots out of `capacity` has enough
    /// holes to be worth compacting.
    pub fn should_compact(&self, len: u32, capacity: u32) -> bool {
        let deleted = capacity.saturating_sub(len);
        if deleted == 0 || deleted < self.min_deleted_elements {
            return false;
        }
        deleted as f32 / capacity as f32 >= self.max_deleted_fraction
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.max_deleted_fraction) {
            return Err(ConfigError::Invalid(format!(
                "max_deleted_fraction must be within 0.0..=1.0, got {}",
                self.max_deleted_fraction
            )));
        }
        Ok(())
    }

    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(2)
            .indentor("  ".to_string());
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Load from a RON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_ron_str(&text)?;
        info!(path = %path.display(), ?config, "loaded arena config");
        Ok(config)
    }

    /// Save as pretty-printed RON.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;
        std::fs::write(path, self.to_ron_string()?)?;
        info!(path = %path.display(), "saved arena config");
        Ok(())
    }
}
