//! Configuration types for Gravity CA maps.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::compute::Topology;

fn default_max_gravity() -> u128 {
    u128::MAX
}

fn default_max_mass() -> u128 {
    u128::MAX >> 1
}

fn default_mass_divisor() -> u128 {
    1 << 25
}

/// Top-level map configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// Grid width in cells (X dimension).
    pub width: usize,
    /// Grid height in cells (Y dimension).
    pub height: usize,
    /// Global gravity cap. Diffusion clamps every cell to this value.
    #[serde(default = "default_max_gravity")]
    pub max_gravity: u128,
    /// Global mass cap. Scales the local ceiling during consumption.
    #[serde(default = "default_max_mass")]
    pub max_mass: u128,
    /// Initial boundary topology.
    #[serde(default)]
    pub topology: Topology,
    /// RNG seed for reproducible runs. `None` seeds from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Spontaneous mass seeding while running.
    #[serde(default)]
    pub spawn: SpawnConfig,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 125,
            height: 125,
            max_gravity: default_max_gravity(),
            max_mass: default_max_mass(),
            topology: Topology::Torus,
            seed: None,
            spawn: SpawnConfig::default(),
        }
    }
}

/// Spontaneous seeding parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnConfig {
    /// Per-cell, per-tick probability that an empty cell receives mass.
    pub chance: f64,
    /// Spawned mass is `max_mass / mass_divisor`.
    #[serde(default = "default_mass_divisor")]
    pub mass_divisor: u128,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            chance: 0.002,
            mass_divisor: default_mass_divisor(),
        }
    }
}

impl MapConfig {
    /// Get total cell count (width * height).
    #[inline]
    pub fn grid_size(&self) -> usize {
        self.width * self.height
    }

    /// Mass placed by one spontaneous spawn.
    #[inline]
    pub fn spawn_mass(&self) -> u128 {
        self.max_mass / self.spawn.mass_divisor.max(1)
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        let max_side = i32::MAX as usize;
        if self.width > max_side
            || self.height > max_side
            || self.width.checked_mul(self.height).is_none()
        {
            return Err(ConfigError::DimensionsTooLarge {
                width: self.width,
                height: self.height,
            });
        }
        if !(0.0..=1.0).contains(&self.spawn.chance) {
            return Err(ConfigError::InvalidSpawnChance(self.spawn.chance));
        }
        if self.spawn.mass_divisor == 0 {
            return Err(ConfigError::InvalidMassDivisor);
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Grid dimensions (width, height) must be non-zero")]
    InvalidDimensions,
    #[error("Grid dimensions {width}x{height} are too large")]
    DimensionsTooLarge { width: usize, height: usize },
    #[error("Spawn chance {0} must lie in [0, 1]")]
    InvalidSpawnChance(f64),
    #[error("Mass divisor must be non-zero")]
    InvalidMassDivisor,
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}
