//! Complexity-guided search policies.
//!
//! Every policy shares the same building blocks:
//!
//! - **Scorer** (`Scorer`): estimator + neighborhood template + aggregate scope
//! - **State** (`SearchState`): the grid, its complexity, and the run's RNG
//! - **Outcome** (`StepOutcome`): whether a step committed a mutation or ran
//!   out of attempts
//!
//! Candidates are always built on a copy of the grid and only committed on
//! acceptance; a rejected candidate is simply dropped.
//!
//! # Policies
//!
//! - `PairwiseGreedy`: both swapped cells must individually improve
//! - `GlobalSum`: the aggregate must not increase
//! - `DirectionalDrift`: every active cell steps in a random direction at once
//! - `GaussianAnnealing`: elements jitter around continuous targets

mod drift;
mod gaussian;
mod global_sum;
mod pairwise;

use rand::rngs::StdRng;
use serde::Serialize;

use super::{ComplexityEstimator, Coord, Grid, NeighborhoodTemplate};
use crate::schema::{AggregateScope, PolicyConfig};

pub use drift::{DIRECTIONS, DirectionalDrift};
pub use gaussian::{Element, GaussianAnnealing};
pub use global_sum::GlobalSum;
pub use pairwise::PairwiseGreedy;

/// Local and aggregate complexity of grids.
pub struct Scorer {
    estimator: Box<dyn ComplexityEstimator>,
    template: NeighborhoodTemplate,
    scope: AggregateScope,
}

impl Scorer {
    pub fn new(
        estimator: Box<dyn ComplexityEstimator>,
        template: NeighborhoodTemplate,
        scope: AggregateScope,
    ) -> Self {
        Self {
            estimator,
            template,
            scope,
        }
    }

    /// Complexity of the trace centred on `at`.
    #[inline]
    pub fn local(&self, grid: &Grid, at: Coord) -> usize {
        self.estimator
            .estimate(&grid.sample_trace(at, &self.template))
    }

    /// Sum of local complexity over the configured scope.
    pub fn aggregate(&self, grid: &Grid) -> usize {
        match self.scope {
            AggregateScope::All => grid.coords().map(|c| self.local(grid, c)).sum(),
            AggregateScope::Active => grid
                .coords()
                .filter(|&c| grid.is_active(c))
                .map(|c| self.local(grid, c))
                .sum(),
        }
    }

    /// Sum of local complexity at the given positions.
    pub fn sum_at(&self, grid: &Grid, cells: &[Coord]) -> usize {
        cells.iter().map(|&c| self.local(grid, c)).sum()
    }
}

/// Mutable state of one run. Never shared between runs.
pub struct SearchState {
    pub grid: Grid,
    /// Aggregate complexity of `grid` as tracked by the active policy.
    pub current: usize,
    /// Lowest `current` seen so far.
    pub best: usize,
    pub rng: StdRng,
    pub step: u64,
}

impl SearchState {
    pub fn new(grid: Grid, rng: StdRng) -> Self {
        Self {
            grid,
            current: 0,
            best: 0,
            rng,
            step: 0,
        }
    }

    /// Replace the grid with an accepted candidate.
    pub fn commit(&mut self, candidate: Candidate, attempts: usize) -> StepOutcome {
        self.grid = candidate.grid;
        self.current = candidate.fitness;
        StepOutcome::Improved {
            attempts,
            mutation: candidate.mutation,
        }
    }
}

/// A committed mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Mutation {
    /// Two cells exchanged.
    Swap { a: Coord, b: Coord },
    /// Every `(from, to)` applied at once against the pre-step grid.
    Drift { moves: Vec<(Coord, Coord)> },
    /// New element cells, in element order.
    Perturb { cells: Vec<Coord> },
}

/// A proposed mutation with the grid it produces and its fitness.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub grid: Grid,
    pub mutation: Mutation,
    pub fitness: usize,
}

/// Result of one policy step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// A candidate was accepted after `attempts` tries.
    Improved { attempts: usize, mutation: Mutation },
    /// The attempt budget ran out; the state is unchanged.
    Exhausted { attempts: usize },
}

impl StepOutcome {
    pub fn attempts(&self) -> usize {
        match self {
            StepOutcome::Improved { attempts, .. } | StepOutcome::Exhausted { attempts } => {
                *attempts
            }
        }
    }

    pub fn is_improved(&self) -> bool {
        matches!(self, StepOutcome::Improved { .. })
    }
}

/// A mutation/acceptance strategy applied once per step.
pub trait SearchPolicy: Send {
    fn name(&self) -> &'static str;

    /// Prepare policy state and set `state.current` for the starting grid.
    fn initialize(&mut self, state: &mut SearchState, scorer: &Scorer) {
        state.current = scorer.aggregate(&state.grid);
    }

    fn step(&mut self, state: &mut SearchState, scorer: &Scorer) -> StepOutcome;
}

/// Instantiate the configured policy.
pub fn build_policy(config: &PolicyConfig) -> Box<dyn SearchPolicy> {
    match config {
        PolicyConfig::Pairwise { max_attempts } => Box::new(PairwiseGreedy::new(*max_attempts)),
        PolicyConfig::GlobalSum { max_attempts } => Box::new(GlobalSum::new(*max_attempts)),
        PolicyConfig::Drift { max_attempts } => Box::new(DirectionalDrift::new(*max_attempts)),
        PolicyConfig::Gaussian {
            max_attempts,
            mean,
            stddev,
            noise_cells,
        } => Box::new(GaussianAnnealing::new(
            *max_attempts,
            *mean,
            *stddev,
            *noise_cells,
        )),
    }
}

/// Pick a random active cell and a random inactive cell.
pub(crate) fn sample_opposite_pair(
    active: &[Coord],
    inactive: &[Coord],
    rng: &mut StdRng,
) -> (Coord, Coord) {
    use rand::Rng;
    let a = active[rng.gen_range(0..active.len())];
    let b = inactive[rng.gen_range(0..inactive.len())];
    (a, b)
}
