//! Projected dataset embedding.
//!
//! Labelled samples are projected onto two axes with a random weight matrix,
//! scaled onto the grid and stamped with a per-class byte. Each worker then
//! rearranges its own grid with the configured policy.

use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;

use super::{Coord, Experiment, ExperimentResult, Grid};
use crate::schema::{ConfigError, Dataset, EmbeddingConfig};

/// Two-row projection from `d` measures to a plane.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    rows: [Vec<f64>; 2],
}

impl Projection {
    /// Draw uniform `[0, 1)` weights and normalize each row to unit length.
    pub fn random<R: Rng + ?Sized>(dimensions: usize, rng: &mut R) -> Self {
        let mut draw_row = || {
            let mut row: Vec<f64> = (0..dimensions).map(|_| rng.r#gen::<f64>()).collect();
            let norm = row.iter().map(|w| w * w).sum::<f64>().sqrt();
            if norm > 0.0 {
                row.iter_mut().for_each(|w| *w /= norm);
            }
            row
        };
        let x = draw_row();
        let y = draw_row();
        Self { rows: [x, y] }
    }

    pub fn from_rows(x: Vec<f64>, y: Vec<f64>) -> Self {
        Self { rows: [x, y] }
    }

    pub fn rows(&self) -> &[Vec<f64>; 2] {
        &self.rows
    }

    pub fn project(&self, measures: &[f64]) -> (f64, f64) {
        let dot = |row: &[f64]| row.iter().zip(measures).map(|(w, m)| w * m).sum::<f64>();
        (dot(&self.rows[0]), dot(&self.rows[1]))
    }
}

/// Class byte for the label at `index` in first-appearance order.
pub fn class_value(index: usize) -> u8 {
    (255 - index.min(254)) as u8
}

/// Map `value` from `[min, max]` onto `0..size`.
fn scale_axis(value: f64, min: f64, max: f64, size: usize) -> usize {
    let span = max - min;
    if span <= 0.0 {
        return 0;
    }
    let scaled = ((value - min) / span * (size - 1) as f64).round() as usize;
    scaled.min(size - 1)
}

/// Stamp every projected sample onto a fresh `size`x`size` grid.
///
/// Samples that land on the same cell overwrite earlier ones.
pub fn embed_dataset(dataset: &Dataset, projection: &Projection, size: usize) -> Grid {
    let labels = dataset.labels();
    let points: Vec<(f64, f64)> = dataset
        .samples()
        .iter()
        .map(|s| projection.project(&s.measures))
        .collect();

    let bounds = |axis: fn(&(f64, f64)) -> f64| {
        points.iter().map(axis).fold((f64::MAX, f64::MIN), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        })
    };
    let (min_x, max_x) = bounds(|p| p.0);
    let (min_y, max_y) = bounds(|p| p.1);

    let mut grid = Grid::new(size);
    for (sample, point) in dataset.samples().iter().zip(&points) {
        let class = labels
            .iter()
            .position(|l| *l == sample.label)
            .unwrap_or_default();
        let at = Coord::new(
            scale_axis(point.0, min_x, max_x, size),
            scale_axis(point.1, min_y, max_y, size),
        );
        grid.set(at, class_value(class));
    }
    grid
}

/// One finished worker of an ensemble.
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingResult {
    pub worker: usize,
    pub projection: Projection,
    pub result: ExperimentResult,
}

/// Run `config.workers` independent projections in parallel.
///
/// Worker `i` uses seed `config.experiment.seed + i` for both its projection
/// and its search. Results are returned in worker order.
pub fn run_ensemble(
    dataset: &Dataset,
    config: &EmbeddingConfig,
) -> Result<Vec<EmbeddingResult>, ConfigError> {
    config.validate()?;
    info!(
        "embedding {} samples ({} dimensions, {} classes) with {} workers",
        dataset.len(),
        dataset.dimensions(),
        dataset.labels().len(),
        config.workers
    );

    (0..config.workers)
        .into_par_iter()
        .map(|worker| run_worker(dataset, config, worker))
        .collect()
}

fn run_worker(
    dataset: &Dataset,
    config: &EmbeddingConfig,
    worker: usize,
) -> Result<EmbeddingResult, ConfigError> {
    let mut experiment_config = config.experiment.clone();
    experiment_config.seed = experiment_config.seed.wrapping_add(worker as u64);

    let mut rng = StdRng::seed_from_u64(experiment_config.seed);
    let projection = Projection::random(dataset.dimensions(), &mut rng);
    let grid = embed_dataset(dataset, &projection, experiment_config.size);

    let result = Experiment::from_grid(experiment_config, grid)?.run();
    Ok(EmbeddingResult {
        worker,
        projection,
        result,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ExperimentConfig, PolicyConfig};

    const SAMPLE_DATA: &str = "\
5.1,3.5,1.4,0.2,setosa
4.9,3.0,1.4,0.2,setosa
4.7,3.2,1.3,0.2,setosa
7.0,3.2,4.7,1.4,versicolor
6.4,3.2,4.5,1.5,versicolor
6.9,3.1,4.9,1.5,versicolor
6.3,3.3,6.0,2.5,virginica
5.8,2.7,5.1,1.9,virginica
7.1,3.0,5.9,2.1,virginica
";

    fn dataset() -> Dataset {
        Dataset::from_csv_str(SAMPLE_DATA).unwrap()
    }

    #[test]
    fn test_projection_rows_are_unit_length() {
        let mut rng = StdRng::seed_from_u64(3);
        let projection = Projection::random(4, &mut rng);

        for row in projection.rows() {
            assert_eq!(row.len(), 4);
            assert!(row.iter().all(|&w| w >= 0.0));
            let norm: f64 = row.iter().map(|w| w * w).sum::<f64>().sqrt();
            assert!((norm - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_project_is_dot_product() {
        let projection = Projection::from_rows(vec![1.0, 0.0], vec![0.5, 0.5]);
        assert_eq!(projection.project(&[2.0, 4.0]), (2.0, 3.0));
    }

    #[test]
    fn test_class_values() {
        assert_eq!(class_value(0), 255);
        assert_eq!(class_value(2), 253);
        assert_eq!(class_value(1000), 1);
    }

    #[test]
    fn test_embed_spans_grid_and_uses_class_bytes() {
        // Projecting onto the first two measures keeps the extremes known.
        let projection = Projection::from_rows(
            vec![1.0, 0.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0, 0.0],
        );
        let grid = embed_dataset(&dataset(), &projection, 16);

        // x spans 4.7..7.1 and y spans 2.7..3.5, scaled onto 0..=15.
        assert_eq!(grid.get(Coord::new(0, 9)), 255);
        assert_eq!(grid.get(Coord::new(14, 9)), 254);
        assert_eq!(grid.get(Coord::new(15, 6)), 253);
        assert_eq!(grid.get(Coord::new(7, 0)), 253);
        assert_eq!(grid.active_count(), 9);
    }

    #[test]
    fn test_constant_axis_maps_to_origin() {
        let projection = Projection::from_rows(vec![0.0; 4], vec![0.0; 4]);
        let grid = embed_dataset(&dataset(), &projection, 8);
        assert_eq!(grid.active_count(), 1);
        assert!(grid.is_active(Coord::new(0, 0)));
    }

    fn small_config(workers: usize) -> EmbeddingConfig {
        EmbeddingConfig {
            experiment: ExperimentConfig {
                size: 16,
                radius: 2,
                steps: 5,
                seed: 40,
                policy: PolicyConfig::Pairwise { max_attempts: 64 },
                ..Default::default()
            },
            workers,
        }
    }

    #[test]
    fn test_ensemble_runs_every_worker_in_order() {
        let results = run_ensemble(&dataset(), &small_config(3)).unwrap();

        assert_eq!(results.len(), 3);
        for (i, r) in results.iter().enumerate() {
            assert_eq!(r.worker, i);
            assert_eq!(r.result.seed, 40 + i as u64);
            assert_eq!(r.result.history.best.len(), 5);
            assert_eq!(
                r.result.final_grid.active_count(),
                r.result.initial.active_count()
            );
        }
        assert_ne!(results[0].projection, results[1].projection);
    }

    #[test]
    fn test_ensemble_is_reproducible() {
        let first = run_ensemble(&dataset(), &small_config(2)).unwrap();
        let second = run_ensemble(&dataset(), &small_config(2)).unwrap();

        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.projection, b.projection);
            assert_eq!(a.result.final_grid, b.result.final_grid);
            assert_eq!(a.result.history.best, b.result.history.best);
        }
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(matches!(
            run_ensemble(&dataset(), &small_config(0)),
            Err(ConfigError::InvalidWorkers)
        ));
    }
}
