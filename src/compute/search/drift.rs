//! Directional drift.
//!
//! Every active cell draws one of eight unit steps and all moves are applied
//! together against the pre-step grid: each mover's state lands on its
//! destination and the inactive cell it displaces takes the mover's place.
//! Draws where two movers share a destination are rejected. The move set is
//! kept only if the aggregate strictly drops, which makes the grid relax much
//! like a diffusion process.

use std::collections::HashSet;

use log::debug;
use rand::Rng;

use super::{Candidate, Mutation, Scorer, SearchPolicy, SearchState, StepOutcome};
use crate::compute::{Coord, Grid, INACTIVE};

/// The eight king-move directions.
pub const DIRECTIONS: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Simultaneous random-direction moves.
#[derive(Debug, Clone)]
pub struct DirectionalDrift {
    max_attempts: usize,
}

impl DirectionalDrift {
    pub fn new(max_attempts: usize) -> Self {
        Self { max_attempts }
    }
}

/// Apply every move at once. Returns `None` if two movers share a destination.
fn apply_moves(grid: &Grid, moves: &[(Coord, Coord)]) -> Option<Grid> {
    let mut destinations = HashSet::with_capacity(moves.len());
    if !moves.iter().all(|&(_, to)| destinations.insert(to)) {
        return None;
    }

    let mut next = grid.clone();
    for &(from, _) in moves {
        next.set(from, INACTIVE);
    }
    for &(from, to) in moves {
        next.set(to, grid.get(from));
    }
    Some(next)
}

impl SearchPolicy for DirectionalDrift {
    fn name(&self) -> &'static str {
        "drift"
    }

    fn step(&mut self, state: &mut SearchState, scorer: &Scorer) -> StepOutcome {
        let movers = state.grid.active_cells();
        if movers.is_empty() {
            return StepOutcome::Exhausted { attempts: 0 };
        }

        let size = state.grid.size();
        for attempt in 1..=self.max_attempts {
            let moves: Vec<(Coord, Coord)> = movers
                .iter()
                .map(|&from| {
                    let (dx, dy) = DIRECTIONS[state.rng.gen_range(0..DIRECTIONS.len())];
                    (from, from.offset(dx, dy, size))
                })
                .collect();

            let Some(grid) = apply_moves(&state.grid, &moves) else {
                continue;
            };

            let fitness = scorer.aggregate(&grid);
            if fitness < state.current {
                let candidate = Candidate {
                    grid,
                    mutation: Mutation::Drift { moves },
                    fitness,
                };
                return state.commit(candidate, attempt);
            }
        }

        debug!(
            "drift: no improving move set in {} attempts at step {}",
            self.max_attempts, state.step
        );
        StepOutcome::Exhausted {
            attempts: self.max_attempts,
        }
    }
}
