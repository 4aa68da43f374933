//! Gaussian-perturbation annealing for point sets.
//!
//! Each element keeps a continuous target position together with its own
//! mean offset and standard deviation. A step samples
//! `target + mean + N(0, stddev)` per axis for every element and rounds to
//! the nearest cell. Elements are then swapped against a noise overlay: a
//! noise cell sitting on an element's new cell moves into the element's old
//! cell. The extra noise cells diversify the sampled traces. Draws where two
//! elements share a cell, or where displaced noise would land on another
//! element, are rejected. The first attempt whose summed element complexity
//! does not exceed the current value is kept.

use std::collections::HashSet;

use log::debug;
use rand::Rng;
use rand_distr::StandardNormal;

use super::{Candidate, Mutation, Scorer, SearchPolicy, SearchState, StepOutcome};
use crate::compute::{ACTIVE, Coord, Grid, wrap};

/// A movable element.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Continuous position in cell units, kept within `[0, size)`.
    pub target: (f64, f64),
    /// Offset added to every sampled position.
    pub mean: (f64, f64),
    /// Standard deviation of the per-axis jitter.
    pub stddev: f64,
    /// State byte placed at the element's cell.
    pub value: u8,
}

impl Element {
    /// Nearest cell to the target.
    pub fn cell(&self, size: usize) -> Coord {
        nearest_cell(self.target, size)
    }

    /// Draw `target + mean + N(0, stddev)` per axis, wrapped into `[0, size)`.
    pub fn sample_target<R: Rng + ?Sized>(&self, size: usize, rng: &mut R) -> (f64, f64) {
        let nx: f64 = rng.sample(StandardNormal);
        let ny: f64 = rng.sample(StandardNormal);
        let side = size as f64;
        (
            (self.target.0 + self.mean.0 + nx * self.stddev).rem_euclid(side),
            (self.target.1 + self.mean.1 + ny * self.stddev).rem_euclid(side),
        )
    }
}

fn nearest_cell(target: (f64, f64), size: usize) -> Coord {
    Coord::new(
        wrap(target.0.round() as i64, size),
        wrap(target.1.round() as i64, size),
    )
}

/// Perturbation policy over a noise overlay.
#[derive(Debug, Clone)]
pub struct GaussianAnnealing {
    max_attempts: usize,
    mean: (f64, f64),
    stddev: f64,
    noise_cells: usize,
    /// Noise cells only; never shares a cell with an element.
    overlay: Grid,
    elements: Vec<Element>,
}

impl GaussianAnnealing {
    /// `mean` and `stddev` seed every element created by `initialize`.
    pub fn new(max_attempts: usize, mean: (f64, f64), stddev: f64, noise_cells: usize) -> Self {
        Self {
            max_attempts,
            mean,
            stddev,
            noise_cells,
            overlay: Grid::new(0),
            elements: Vec::new(),
        }
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn overlay(&self) -> &Grid {
        &self.overlay
    }

    fn cells(&self, size: usize) -> Vec<Coord> {
        self.elements.iter().map(|e| e.cell(size)).collect()
    }

    /// Move noise out of the way of elements landing on `cells`.
    ///
    /// Returns `None` if two elements share a cell or displaced noise would
    /// land on another element's new cell.
    fn displace_noise(&self, from: &[Coord], to: &[Coord]) -> Option<Grid> {
        let mut claimed = HashSet::with_capacity(to.len());
        if !to.iter().all(|&c| claimed.insert(c)) {
            return None;
        }

        let mut overlay = self.overlay.clone();
        for (&old, &new) in from.iter().zip(to) {
            if overlay.is_active(new) {
                if claimed.contains(&old) {
                    return None;
                }
                overlay.swap(old, new);
            }
        }
        Some(overlay)
    }

    /// Overlay with every element placed at its cell.
    fn combine(&self, overlay: &Grid, cells: &[Coord]) -> Grid {
        let mut grid = overlay.clone();
        for (element, &cell) in self.elements.iter().zip(cells) {
            grid.set(cell, element.value);
        }
        grid
    }

    /// Elements alone, without the noise overlay.
    fn placement(&self, size: usize, cells: &[Coord]) -> Grid {
        self.combine(&Grid::new(size), cells)
    }
}

impl SearchPolicy for GaussianAnnealing {
    fn name(&self) -> &'static str {
        "gaussian"
    }

    fn initialize(&mut self, state: &mut SearchState, scorer: &Scorer) {
        let size = state.grid.size();

        self.elements = state
            .grid
            .active_cells()
            .into_iter()
            .map(|c| Element {
                target: (c.x as f64, c.y as f64),
                mean: self.mean,
                stddev: self.stddev,
                value: state.grid.get(c),
            })
            .collect();

        self.overlay = Grid::new(size);
        let free = state.grid.inactive_cells();
        let count = self.noise_cells.min(free.len());
        for i in rand::seq::index::sample(&mut state.rng, free.len(), count) {
            self.overlay.set(free[i], ACTIVE);
        }

        let cells = self.cells(size);
        state.current = scorer.sum_at(&self.combine(&self.overlay, &cells), &cells);
    }

    fn step(&mut self, state: &mut SearchState, scorer: &Scorer) -> StepOutcome {
        if self.elements.is_empty() {
            return StepOutcome::Exhausted { attempts: 0 };
        }

        let size = state.grid.size();
        let from = self.cells(size);
        for attempt in 1..=self.max_attempts {
            let targets: Vec<(f64, f64)> = self
                .elements
                .iter()
                .map(|e| e.sample_target(size, &mut state.rng))
                .collect();
            let cells: Vec<Coord> = targets
                .iter()
                .map(|&target| nearest_cell(target, size))
                .collect();

            let Some(overlay) = self.displace_noise(&from, &cells) else {
                continue;
            };

            let fitness = scorer.sum_at(&self.combine(&overlay, &cells), &cells);
            if fitness <= state.current {
                let candidate = Candidate {
                    grid: self.placement(size, &cells),
                    mutation: Mutation::Perturb { cells },
                    fitness,
                };
                for (element, target) in self.elements.iter_mut().zip(targets) {
                    element.target = target;
                }
                self.overlay = overlay;
                return state.commit(candidate, attempt);
            }
        }

        debug!(
            "gaussian: no perturbation at or below {} in {} attempts at step {}",
            state.current, self.max_attempts, state.step
        );
        StepOutcome::Exhausted {
            attempts: self.max_attempts,
        }
    }
}
