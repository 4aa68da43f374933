//! Global sum improvement.
//!
//! Individual cells may get worse as long as the aggregate does not.

use log::debug;

use super::{
    Candidate, Mutation, Scorer, SearchPolicy, SearchState, StepOutcome, sample_opposite_pair,
};

/// Accept the first swap whose aggregate is `<=` the current aggregate.
#[derive(Debug, Clone)]
pub struct GlobalSum {
    max_attempts: usize,
}

impl GlobalSum {
    pub fn new(max_attempts: usize) -> Self {
        Self { max_attempts }
    }
}

impl SearchPolicy for GlobalSum {
    fn name(&self) -> &'static str {
        "global-sum"
    }

    fn step(&mut self, state: &mut SearchState, scorer: &Scorer) -> StepOutcome {
        let active = state.grid.active_cells();
        let inactive = state.grid.inactive_cells();
        if active.is_empty() || inactive.is_empty() {
            return StepOutcome::Exhausted { attempts: 0 };
        }

        let before = state.current;
        for attempt in 1..=self.max_attempts {
            let (a, b) = sample_opposite_pair(&active, &inactive, &mut state.rng);
            let grid = state.grid.with_swap(a, b);
            let after = scorer.aggregate(&grid);

            if after <= before {
                let candidate = Candidate {
                    grid,
                    mutation: Mutation::Swap { a, b },
                    fitness: after,
                };
                return state.commit(candidate, attempt);
            }
        }

        debug!(
            "global-sum: budget of {} exhausted at step {} (aggregate {})",
            self.max_attempts, state.step, before
        );
        StepOutcome::Exhausted {
            attempts: self.max_attempts,
        }
    }
}
