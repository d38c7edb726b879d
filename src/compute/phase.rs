//! The per-generation phase cycle.

use serde::{Deserialize, Serialize};

/// One sub-step of the update cycle. Each driver call runs exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Phase {
    /// Recompute gravity from neighbour gravity and local mass.
    #[default]
    GravityDiffusion,
    /// Move mass toward equal-or-higher gravity.
    MassMigration,
    /// Let hungry cells absorb their smallest neighbour.
    MassConsumption,
    /// Refresh aggregates only.
    StatsOnly,
}

impl Phase {
    /// Number of phases in one cycle.
    pub const COUNT: usize = 4;

    /// The phase run on the following driver call.
    pub fn next(self) -> Self {
        match self {
            Phase::GravityDiffusion => Phase::MassMigration,
            Phase::MassMigration => Phase::MassConsumption,
            Phase::MassConsumption => Phase::StatsOnly,
            Phase::StatsOnly => Phase::GravityDiffusion,
        }
    }

    /// Position in the cycle, `0..COUNT`.
    pub fn index(self) -> usize {
        match self {
            Phase::GravityDiffusion => 0,
            Phase::MassMigration => 1,
            Phase::MassConsumption => 2,
            Phase::StatsOnly => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Phase::GravityDiffusion => "gravity-diffusion",
            Phase::MassMigration => "mass-migration",
            Phase::MassConsumption => "mass-consumption",
            Phase::StatsOnly => "stats-only",
        }
    }
}
