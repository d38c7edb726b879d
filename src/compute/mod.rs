//! Compute module - Field storage and the phase-driven update engine.

mod adjacency;
mod engine;
mod grid;
mod phase;
mod stats;
mod topology;

pub use adjacency::*;
pub use engine::*;
pub use grid::*;
pub use phase::*;
pub use stats::*;
pub use topology::*;
