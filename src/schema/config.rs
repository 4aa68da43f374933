//! Configuration types for rearrangement experiments.

use serde::{Deserialize, Serialize};

use super::Scatter;

/// Which compressor backs the complexity estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EstimatorKind {
    /// LZ4 block-compressed length.
    #[default]
    Lz4,
    /// Run-length encoded length (predictable, for tests and comparisons).
    RunLength,
}

/// Which cells contribute to the aggregate complexity of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AggregateScope {
    /// Sum over every cell of the grid.
    All,
    /// Sum over active cells only.
    #[default]
    Active,
}

/// Top-level configuration for a single experiment run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Grid side length in cells.
    pub size: usize,
    /// Neighborhood radius used to sample traces.
    pub radius: u32,
    /// Number of policy steps to run.
    pub steps: usize,
    /// PRNG seed; fully determines the run.
    pub seed: u64,
    /// Initial placement of active cells.
    #[serde(default)]
    pub scatter: Scatter,
    #[serde(default)]
    pub estimator: EstimatorKind,
    #[serde(default)]
    pub scope: AggregateScope,
    /// Mutation/acceptance policy.
    #[serde(default)]
    pub policy: PolicyConfig,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            size: 9,
            radius: 4,
            steps: 256,
            seed: 1,
            scatter: Scatter::default(),
            estimator: EstimatorKind::default(),
            scope: AggregateScope::default(),
            policy: PolicyConfig::default(),
        }
    }
}

/// Search policy selection and parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PolicyConfig {
    /// Swap an active/inactive pair only if both cells individually improve.
    Pairwise {
        #[serde(default = "default_pairwise_attempts")]
        max_attempts: usize,
    },
    /// Swap an active/inactive pair if the aggregate does not increase.
    GlobalSum {
        #[serde(default = "default_global_sum_attempts")]
        max_attempts: usize,
    },
    /// Move every active cell one step in a random direction.
    Drift {
        #[serde(default = "default_drift_attempts")]
        max_attempts: usize,
    },
    /// Perturb element positions with Gaussian noise over a noise overlay.
    Gaussian {
        #[serde(default = "default_gaussian_attempts")]
        max_attempts: usize,
        /// Starting mean offset of every element.
        #[serde(default)]
        mean: (f64, f64),
        /// Starting per-axis standard deviation of every element, in cells.
        #[serde(default = "default_stddev")]
        stddev: f64,
        /// Extra randomly placed active cells mixed into sampled traces.
        #[serde(default = "default_noise_cells")]
        noise_cells: usize,
    },
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self::Pairwise {
            max_attempts: default_pairwise_attempts(),
        }
    }
}

fn default_pairwise_attempts() -> usize {
    4096
}
fn default_global_sum_attempts() -> usize {
    256
}
fn default_drift_attempts() -> usize {
    64
}
fn default_gaussian_attempts() -> usize {
    64
}
fn default_stddev() -> f64 {
    1.0
}
fn default_noise_cells() -> usize {
    9
}

impl PolicyConfig {
    pub fn pairwise() -> Self {
        Self::default()
    }

    pub fn global_sum() -> Self {
        Self::GlobalSum {
            max_attempts: default_global_sum_attempts(),
        }
    }

    pub fn drift() -> Self {
        Self::Drift {
            max_attempts: default_drift_attempts(),
        }
    }

    pub fn gaussian() -> Self {
        Self::Gaussian {
            max_attempts: default_gaussian_attempts(),
            mean: (0.0, 0.0),
            stddev: default_stddev(),
            noise_cells: default_noise_cells(),
        }
    }

    /// Attempt budget per step.
    pub fn max_attempts(&self) -> usize {
        match self {
            Self::Pairwise { max_attempts }
            | Self::GlobalSum { max_attempts }
            | Self::Drift { max_attempts }
            | Self::Gaussian { max_attempts, .. } => *max_attempts,
        }
    }
}

impl ExperimentConfig {
    /// Number of cells on the grid.
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.size * self.size
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size == 0 {
            return Err(ConfigError::InvalidSize);
        }
        if self.radius == 0 {
            return Err(ConfigError::InvalidRadius);
        }
        self.scatter.validate(self.size)?;
        if self.policy.max_attempts() == 0 {
            return Err(ConfigError::InvalidAttemptBudget);
        }
        if let PolicyConfig::Gaussian {
            mean,
            stddev,
            noise_cells,
            ..
        } = &self.policy
        {
            if !stddev.is_finite() || *stddev < 0.0 || !mean.0.is_finite() || !mean.1.is_finite() {
                return Err(ConfigError::InvalidPerturbation);
            }
            if *noise_cells > self.cell_count() {
                return Err(ConfigError::TooManyCells {
                    requested: *noise_cells,
                    available: self.cell_count(),
                });
            }
        }
        Ok(())
    }
}

/// Configuration for the projected-embedding ensemble.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Per-worker experiment settings. The scatter is ignored; the grid is
    /// built from the projected dataset.
    pub experiment: ExperimentConfig,
    /// Number of independent projections to run in parallel.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_workers() -> usize {
    4
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            experiment: ExperimentConfig {
                size: 256,
                steps: 1024,
                ..Default::default()
            },
            workers: default_workers(),
        }
    }
}

impl EmbeddingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::InvalidWorkers);
        }
        self.experiment.validate()
    }
}

/// Frame rendering parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Pixels per cell side.
    pub scale: u32,
    /// Display duration of each frame.
    pub frame_delay_ms: u32,
    /// Height of the progress bar along the bottom edge.
    pub progress_bar_height: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scale: 25,
            frame_delay_ms: 200,
            progress_bar_height: 10,
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Grid size must be non-zero")]
    InvalidSize,
    #[error("Neighborhood radius must be non-zero")]
    InvalidRadius,
    #[error("Policy attempt budget must be non-zero")]
    InvalidAttemptBudget,
    #[error("Gaussian mean must be finite and stddev finite and non-negative")]
    InvalidPerturbation,
    #[error("Requested {requested} cells but the grid only has {available}")]
    TooManyCells { requested: usize, available: usize },
    #[error("Cell ({x}, {y}) lies outside a {size}x{size} grid")]
    CellOutOfBounds { x: usize, y: usize, size: usize },
    #[error("Grid is {actual}x{actual} but the configuration expects {expected}x{expected}")]
    GridSizeMismatch { expected: usize, actual: usize },
    #[error("Worker count must be non-zero")]
    InvalidWorkers,
}
