//! Aggregate statistics over the gravity and mass layers.
//!
//! Values are folded as `f64`: a `u128` total overflows long before a full
//! grid of large cells does, and renderers normalize in floating point anyway.

use serde::{Deserialize, Serialize};

use super::{Field, Grid};

/// Running total, minimum and maximum of the non-zero cells in one layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldStats {
    pub total: f64,
    pub min: f64,
    pub max: f64,
    /// Number of non-zero cells folded.
    pub occupied: usize,
}

impl FieldStats {
    /// Nothing folded yet.
    pub const EMPTY: Self = Self {
        total: 0.0,
        min: f64::INFINITY,
        max: 0.0,
        occupied: 0,
    };

    /// Cleared aggregates whose minimum starts at the layer's global cap.
    pub fn reset_to(cap: u128) -> Self {
        Self {
            min: cap as f64,
            ..Self::EMPTY
        }
    }

    /// Fold one cell. Zero cells are ignored.
    #[inline]
    pub fn fold(&mut self, value: u128) {
        if value == 0 {
            return;
        }
        let v = value as f64;
        self.total += v;
        self.max = self.max.max(v);
        self.min = self.min.min(v);
        self.occupied += 1;
    }

    /// Aggregate a whole layer.
    pub fn from_layer(layer: &[u128]) -> Self {
        let mut stats = Self::EMPTY;
        for &v in layer {
            stats.fold(v);
        }
        stats
    }

    /// Map `value` into `[0, 1]` for display.
    ///
    /// Degenerate ranges (empty layer, min == max, zero cap) map to 0.
    pub fn normalize(&self, value: u128, global_max: u128, mode: Normalization) -> f64 {
        let v = value as f64;
        let ratio = match mode {
            Normalization::ZeroToGlobalMax => v / global_max as f64,
            Normalization::ZeroToSystemMax => v / self.max,
            Normalization::SystemMinToSystemMax => (v - self.min) / (self.max - self.min),
        };
        if ratio.is_finite() {
            ratio.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

impl Default for FieldStats {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// How a consumer scales a cell value against the aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Normalization {
    /// `value / global cap`
    ZeroToGlobalMax,
    /// `value / observed max`
    ZeroToSystemMax,
    /// `(value - observed min) / (observed max - observed min)`
    #[default]
    SystemMinToSystemMax,
}

impl Normalization {
    pub fn next(self) -> Self {
        match self {
            Normalization::ZeroToGlobalMax => Normalization::ZeroToSystemMax,
            Normalization::ZeroToSystemMax => Normalization::SystemMinToSystemMax,
            Normalization::SystemMinToSystemMax => Normalization::ZeroToGlobalMax,
        }
    }
}

/// Aggregates for both layers.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SimulationStats {
    pub gravity: FieldStats,
    pub mass: FieldStats,
}

impl SimulationStats {
    /// Recompute both layers from scratch.
    pub fn from_grid(grid: &Grid) -> Self {
        Self {
            gravity: FieldStats::from_layer(grid.layer(Field::Gravity)),
            mass: FieldStats::from_layer(grid.layer(Field::Mass)),
        }
    }

    /// Cleared aggregates with minima at the global caps.
    pub fn reset_to(max_gravity: u128, max_mass: u128) -> Self {
        Self {
            gravity: FieldStats::reset_to(max_gravity),
            mass: FieldStats::reset_to(max_mass),
        }
    }
}
