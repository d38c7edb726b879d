//! Seed types for initializing Gravity CA maps.

use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::compute::GravityMap;

fn default_mass_divisor() -> u128 {
    1 << 25
}

/// Complete seed specification for map initialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seed {
    /// Pattern to use for seeding.
    pub pattern: Pattern,
}

impl Default for Seed {
    fn default() -> Self {
        Self {
            pattern: Pattern::Scatter {
                chance: 0.02,
                mass_divisor: default_mass_divisor(),
                seed: 0,
            },
        }
    }
}

/// Predefined patterns for initialization.
///
/// Mass amounts given as a divisor resolve to `max_mass / mass_divisor`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Pattern {
    /// Leave the map empty.
    Empty,
    /// Random empty cells receive mass.
    Scatter {
        /// Per-cell probability in [0, 1].
        chance: f64,
        #[serde(default = "default_mass_divisor")]
        mass_divisor: u128,
        /// Random seed.
        seed: u64,
    },
    /// 3x3 blocks of mass.
    Blocks {
        /// List of block specifications.
        blocks: Vec<BlockSpec>,
    },
    /// Custom cell values (sparse representation).
    ///
    /// Masses are `u64`: tagged enums buffer their content, and the buffer
    /// cannot carry wider integers.
    Custom {
        /// List of (x, y, mass) entries.
        values: Vec<(i32, i32, u64)>,
    },
}

/// A 3x3 block anchored at its top-left cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockSpec {
    pub x: i32,
    pub y: i32,
    #[serde(default = "default_mass_divisor")]
    pub mass_divisor: u128,
}

impl Seed {
    /// Parse a JSON seed.
    pub fn from_json_str(json: &str) -> Result<Self, SeedError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the pattern into `map` through its public setters.
    ///
    /// Returns the number of cells written.
    pub fn apply<R: Rng>(&self, map: &mut GravityMap<R>) -> Result<usize, SeedError> {
        let written = match &self.pattern {
            Pattern::Empty => 0,
            Pattern::Scatter {
                chance,
                mass_divisor,
                seed,
            } => {
                if !(0.0..=1.0).contains(chance) {
                    return Err(SeedError::InvalidChance(*chance));
                }
                let mass = divided_mass(map.max_mass(), *mass_divisor)?;
                let mut rng = StdRng::seed_from_u64(*seed);
                map.scatter_mass_with(&mut rng, *chance, mass)
            }
            Pattern::Blocks { blocks } => {
                for block in blocks {
                    let mass = divided_mass(map.max_mass(), block.mass_divisor)?;
                    map.stamp_mass(block.x, block.y, mass);
                }
                blocks.len() * 9
            }
            Pattern::Custom { values } => {
                for &(x, y, mass) in values {
                    map.set_mass(x, y, u128::from(mass));
                }
                values.len()
            }
        };

        log::debug!("seeded {} cells", written);
        Ok(written)
    }
}

fn divided_mass(max_mass: u128, divisor: u128) -> Result<u128, SeedError> {
    max_mass
        .checked_div(divisor)
        .ok_or(SeedError::InvalidMassDivisor)
}

/// Seed application errors.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Scatter chance {0} must lie in [0, 1]")]
    InvalidChance(f64),
    #[error("Mass divisor must be non-zero")]
    InvalidMassDivisor,
    #[error("Failed to parse seed: {0}")]
    Parse(#[from] serde_json::Error),
}
