//! ka - Complexity-guided stochastic rearrangement on toroidal grids.
//!
//! Cells on a wrapped square grid are moved around by randomized search
//! policies that try to lower an estimate of local Kolmogorov complexity,
//! measured as the LZ4-compressed length of each cell's circular
//! neighborhood trace.
//!
//! # Architecture
//!
//! The crate is split into three modules:
//!
//! - `schema`: Configuration, initial scatters and labelled datasets
//! - `compute`: Grid, neighborhood template, estimators, search policies,
//!   the experiment driver and the projected-embedding ensemble
//! - `render`: Frame rasterization, PNG mosaics and GIF recording
//!
//! # Example
//!
//! ```rust,no_run
//! use ka::{
//!     compute::Experiment,
//!     schema::{ExperimentConfig, PolicyConfig},
//! };
//!
//! let config = ExperimentConfig {
//!     steps: 100,
//!     policy: PolicyConfig::global_sum(),
//!     ..Default::default()
//! };
//!
//! let mut experiment = Experiment::new(config).unwrap();
//! let result = experiment.run();
//!
//! println!(
//!     "Complexity {} -> {}",
//!     result.stats.initial_complexity, result.stats.final_complexity
//! );
//! ```

pub mod compute;
pub mod render;
pub mod schema;

// Re-export commonly used types
pub use compute::{Experiment, ExperimentResult, Grid, Lz4Estimator, NeighborhoodTemplate};
pub use schema::{ExperimentConfig, PolicyConfig, Scatter};
