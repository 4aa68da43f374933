//! ka CLI - Run complexity-guided rearrangement experiments.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde::de::DeserializeOwned;

use ka::{
    compute::{Experiment, run_ensemble},
    render::{GifRecorder, RecorderConfig, RenderError, grid_mosaic, render_frame, save_png},
    schema::{
        ConfigError, Dataset, DatasetError, EmbeddingConfig, ExperimentConfig, PolicyConfig,
        RenderConfig,
    },
};

#[derive(Parser, Debug)]
#[command(
    name = "ka",
    version,
    about = "Rearrange cells on a toroidal grid to minimize estimated local complexity"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a single experiment on a scattered grid.
    Grid(GridArgs),
    /// Embed a labelled dataset with random projections and rearrange it.
    Embed(EmbedArgs),
    /// Print example configurations.
    Example,
}

#[derive(Args, Debug)]
struct GridArgs {
    /// JSON experiment configuration (defaults are used when omitted).
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Override the configured search policy.
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,
    /// Override the number of steps.
    #[arg(long)]
    steps: Option<usize>,
    /// Override the PRNG seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Write an animated GIF of the run.
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Pixels per cell side in the GIF.
    #[arg(long, default_value_t = 25)]
    scale: u32,
    /// Record every Nth step.
    #[arg(long, default_value_t = 1)]
    frame_skip: u32,
    /// Write the run summary as JSON.
    #[arg(long)]
    summary: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct EmbedArgs {
    /// CSV (`m1,...,mN,label` per line) or JSON dataset.
    #[arg(short, long)]
    dataset: PathBuf,
    /// JSON embedding configuration (defaults are used when omitted).
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Override the number of parallel workers.
    #[arg(long)]
    workers: Option<usize>,
    /// Override the number of steps.
    #[arg(long)]
    steps: Option<usize>,
    /// Mosaics are written to `<prefix>_start.png` and `<prefix>_stop.png`.
    #[arg(long, default_value = "embedding")]
    output_prefix: String,
    /// Write the per-worker summaries as JSON.
    #[arg(long)]
    summary: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PolicyArg {
    Pairwise,
    GlobalSum,
    Drift,
    Gaussian,
}

impl From<PolicyArg> for PolicyConfig {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Pairwise => PolicyConfig::pairwise(),
            PolicyArg::GlobalSum => PolicyConfig::global_sum(),
            PolicyArg::Drift => PolicyConfig::drift(),
            PolicyArg::Gaussian => PolicyConfig::gaussian(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("Error reading {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Error parsing {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Error writing {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Invalid dataset: {0}")]
    Dataset(#[from] DatasetError),
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Grid(args) => run_grid(args),
        Command::Embed(args) => run_embed(args),
        Command::Example => print_example_config(),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run_grid(args: GridArgs) -> Result<(), CliError> {
    let mut config: ExperimentConfig = match &args.config {
        Some(path) => load_json(path)?,
        None => ExperimentConfig::default(),
    };
    if let Some(policy) = args.policy {
        config.policy = policy.into();
    }
    if let Some(steps) = args.steps {
        config.steps = steps;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let render = RenderConfig {
        scale: args.scale,
        ..Default::default()
    };
    let mut recorder = match &args.output {
        Some(path) => Some(GifRecorder::new(
            path,
            RecorderConfig {
                frame_delay_ms: render.frame_delay_ms,
                frame_skip: args.frame_skip.max(1),
                max_frames: 0,
            },
        )?),
        None => None,
    };

    let mut experiment = Experiment::new(config)?;
    let config = experiment.config().clone();

    println!("Complexity-guided rearrangement");
    println!("===============================");
    println!("Grid: {}x{}", config.size, config.size);
    println!("Policy: {}", experiment.policy_name());
    println!("Radius: {}", config.radius);
    println!("Steps: {}", config.steps);
    println!("Seed: {}", config.seed);
    println!("Initial complexity: {}", experiment.state().current);
    println!();

    if let Some(recorder) = recorder.as_mut() {
        recorder.record_frame(render_frame(experiment.initial(), 0, config.steps, &render));
    }

    let result = experiment.run_with_callback(|report| {
        if let Some(recorder) = recorder.as_mut() {
            recorder.record_frame(render_frame(
                report.grid,
                report.step,
                report.total_steps,
                &render,
            ));
        }
        if report.step % (report.total_steps / 10).max(1) == 0 {
            println!(
                "  Step {}/{}: current={}, best={}",
                report.step, report.total_steps, report.current, report.best
            );
        }
        Ok::<(), CliError>(())
    })?;

    let stats = &result.stats;
    println!();
    println!(
        "Complexity: {} -> {}",
        stats.initial_complexity, stats.final_complexity
    );
    println!(
        "Steps: {} improved, {} exhausted ({} attempts)",
        stats.improved_steps, stats.exhausted_steps, stats.total_attempts
    );
    println!("Time: {:.2}s", stats.elapsed_seconds);

    if let (Some(recorder), Some(path)) = (recorder, &args.output) {
        let recording = recorder.finalize()?;
        println!("Wrote {} ({})", path.display(), recording);
    }
    if let Some(path) = &args.summary {
        write_json(path, &result)?;
        println!("Wrote {}", path.display());
    }

    Ok(())
}

fn run_embed(args: EmbedArgs) -> Result<(), CliError> {
    let dataset = Dataset::load(&args.dataset)?;
    let mut config: EmbeddingConfig = match &args.config {
        Some(path) => load_json(path)?,
        None => EmbeddingConfig::default(),
    };
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(steps) = args.steps {
        config.experiment.steps = steps;
    }

    println!("Projected embedding");
    println!("===================");
    println!(
        "Dataset: {} samples, {} dimensions, {} classes",
        dataset.len(),
        dataset.dimensions(),
        dataset.labels().len()
    );
    println!("Grid: {}x{}", config.experiment.size, config.experiment.size);
    println!("Workers: {}", config.workers);
    println!("Steps: {}", config.experiment.steps);
    println!();

    let results = run_ensemble(&dataset, &config)?;

    for r in &results {
        println!(
            "  Worker {} (seed {}): complexity {} -> {}, {} improved steps",
            r.worker,
            r.result.seed,
            r.result.stats.initial_complexity,
            r.result.stats.final_complexity,
            r.result.stats.improved_steps
        );
    }

    let start = grid_mosaic(results.iter().map(|r| &r.result.initial));
    let stop = grid_mosaic(results.iter().map(|r| &r.result.final_grid));
    let start_path = PathBuf::from(format!("{}_start.png", args.output_prefix));
    let stop_path = PathBuf::from(format!("{}_stop.png", args.output_prefix));
    save_png(&start, &start_path)?;
    save_png(&stop, &stop_path)?;
    println!();
    println!("Wrote {} and {}", start_path.display(), stop_path.display());

    if let Some(path) = &args.summary {
        write_json(path, &results)?;
        println!("Wrote {}", path.display());
    }

    Ok(())
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value)?;
    fs::write(path, text).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn print_example_config() -> Result<(), CliError> {
    println!("Example experiment configuration (ka grid --config):");
    println!(
        "{}",
        serde_json::to_string_pretty(&ExperimentConfig::default())?
    );
    println!();
    println!("Example embedding configuration (ka embed --config):");
    println!(
        "{}",
        serde_json::to_string_pretty(&EmbeddingConfig::default())?
    );
    println!();
    println!("Available policies:");
    for policy in [
        PolicyConfig::pairwise(),
        PolicyConfig::global_sum(),
        PolicyConfig::drift(),
        PolicyConfig::gaussian(),
    ] {
        println!("{}", serde_json::to_string(&policy)?);
    }
    Ok(())
}
