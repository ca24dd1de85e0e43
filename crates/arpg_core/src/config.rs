//! Engine tuning loaded from RON.
//!
//! # Example RON
//!
//! ```ron
//! CombatConfig(
//!     tile_size: 32,
//!     melee_decision_delay_ms: 600,
//!     ranged_decision_delay_ms: 400,
//!     step_duration_ms: 250,
//!     kite_min_percent: 80,
//!     kite_max_percent: 120,
//!     wander: WanderConfig(
//!         min_interval_ms: 2000,
//!         max_interval_ms: 5000,
//!         idle_facing_percent: 30,
//!         home_radius_tiles: 3,
//!     ),
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CombatError, Result};
use crate::math::Fixed;

/// Idle wandering of dormant agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WanderConfig {
    /// Shortest wait between wander actions.
    pub min_interval_ms: u64,
    /// Longest wait between wander actions.
    pub max_interval_ms: u64,
    /// Chance that a wander action only turns in place.
    pub idle_facing_percent: u32,
    /// Chebyshev distance from spawn beyond which wandering heads home.
    pub home_radius_tiles: u32,
}

impl Default for WanderConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 2000,
            max_interval_ms: 5000,
            idle_facing_percent: 30,
            home_radius_tiles: 3,
        }
    }
}

/// Engine-wide combat tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Edge length of a tile in world units.
    pub tile_size: u32,
    /// Decision cooldown for melee agents.
    pub melee_decision_delay_ms: u64,
    /// Decision cooldown for ranged and magic agents.
    pub ranged_decision_delay_ms: u64,
    /// Time a single tile step takes to complete.
    pub step_duration_ms: u64,
    /// Kiting agents retreat below this share of their preferred distance.
    pub kite_min_percent: u32,
    /// Kiting agents advance above this share of their preferred distance.
    pub kite_max_percent: u32,
    /// Dormant wandering.
    pub wander: WanderConfig,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            tile_size: 32,
            melee_decision_delay_ms: 600,
            ranged_decision_delay_ms: 400,
            step_duration_ms: 250,
            kite_min_percent: 80,
            kite_max_percent: 120,
            wander: WanderConfig::default(),
        }
    }
}

impl CombatConfig {
    /// Tile edge length as a world-space value.
    #[must_use]
    pub fn tile_size_fixed(&self) -> Fixed {
        Fixed::from_num(self.tile_size)
    }

    /// Parse and validate a config from RON text.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::DataParseError`] for malformed RON and
    /// [`CombatError::InvalidData`] for values that fail validation.
    pub fn from_ron_str(source: &str, label: &str) -> Result<Self> {
        let config: Self = ron::from_str(source).map_err(|e| CombatError::DataParseError {
            path: label.to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::Io`] if the file cannot be read, otherwise the
    /// errors of [`CombatConfig::from_ron_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let label = path.display().to_string();
        let source = std::fs::read_to_string(path).map_err(|source| CombatError::Io {
            path: label.clone(),
            source,
        })?;
        Self::from_ron_str(&source, &label)
    }

    /// Check internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::InvalidData`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| CombatError::InvalidData {
            kind: "config",
            id: "combat".to_string(),
            reason: reason.to_string(),
        };

        if self.tile_size == 0 {
            return Err(invalid("tile_size must be positive"));
        }
        if self.step_duration_ms == 0 {
            return Err(invalid("step_duration_ms must be positive"));
        }
        if self.kite_min_percent > 100 || self.kite_max_percent < 100 {
            return Err(invalid("kite band must bracket 100%"));
        }
        if self.wander.min_interval_ms > self.wander.max_interval_ms {
            return Err(invalid("wander.min_interval_ms exceeds wander.max_interval_ms"));
        }
        if self.wander.idle_facing_percent > 100 {
            return Err(invalid("wander.idle_facing_percent exceeds 100"));
        }
        Ok(())
    }
}
