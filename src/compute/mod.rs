//! Compute module - grids, complexity estimation and search.

mod embedding;
mod estimator;
mod experiment;
mod grid;
mod neighborhood;

pub mod search;

pub use embedding::*;
pub use estimator::*;
pub use experiment::*;
pub use grid::*;
pub use neighborhood::*;
