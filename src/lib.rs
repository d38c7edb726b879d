//! Gravity CA - a two-field cellular automaton.
//!
//! A gravity potential diffuses across a 2-D grid while discrete lumps of
//! mass drift toward stronger gravity and occasionally merge with smaller
//! neighbours. Both fields hold `u128` values; gravity is clamped to a global
//! cap, and boundary behaviour is selected by a [`Topology`].
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Configuration types and seeding for maps
//! - `compute`: Topology, field storage, neighbourhood sampling, the update
//!   engine and aggregate statistics
//!
//! # Example
//!
//! ```rust,no_run
//! use gravity_ca::{
//!     compute::GravityMap,
//!     schema::{MapConfig, Seed},
//! };
//!
//! let config = MapConfig {
//!     seed: Some(7),
//!     ..MapConfig::default()
//! };
//! let mut map = GravityMap::new(&config).unwrap();
//! Seed::default().apply(&mut map).unwrap();
//!
//! map.set_running(true);
//! map.run(100);
//!
//! println!("Total mass after 100 ticks: {:e}", map.stats().mass.total);
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::{Field, GravityMap, Phase, SimulationStats, Topology};
pub use schema::{MapConfig, Pattern, Seed};
