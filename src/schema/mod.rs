//! Schema module - Configuration, seeding and dataset types for experiments.

mod config;
mod dataset;
mod seed;

pub use config::*;
pub use dataset::*;
pub use seed::*;
