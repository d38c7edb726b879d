//! Schema module - Configuration and seeding types for Gravity CA maps.

mod config;
mod seed;

pub use config::*;
pub use seed::*;
