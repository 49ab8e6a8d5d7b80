use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Command, FromArgMatches as _};

use crate::batch::BatchConfig;
use crate::error::SimulationError;
use crate::kernel::ModelVariant;
use crate::log::{set_log_level, LevelFilter};
use crate::parameters::Parameters;
use crate::simulation::Simulation;
use crate::trial::{TrialResult, DEFAULT_MAX_STEPS};

/// Default cli arguments for the superspreader runner
#[derive(Args, Debug, Clone)]
pub struct BaseArgs {
    /// Batch seed; trial `i` is seeded from this and `i`
    #[arg(short, long, default_value = "0")]
    pub random_seed: u64,

    /// Optional path for a JSON parameters file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug or trace)
    #[arg(long, default_value = "off")]
    pub log_level: String,

    /// Number of individuals, patient zero included
    #[arg(short = 'n', long, default_value = "500")]
    pub population: usize,

    /// Superspreader fraction
    #[arg(short, long, default_value = "0.2")]
    pub lambda: f64,

    /// Superspreader hypothesis: strong or hub
    #[arg(short, long, default_value = "strong")]
    pub model: ModelVariant,

    /// Step cap per trial
    #[arg(long, default_value_t = DEFAULT_MAX_STEPS)]
    pub max_steps: usize,

    /// Number of independent trials
    #[arg(long, default_value = "1")]
    pub runs: usize,

    /// Worker threads, defaults to the available parallelism
    #[arg(short, long)]
    pub threads: Option<usize>,
}

impl Default for BaseArgs {
    fn default() -> Self {
        BaseArgs {
            random_seed: 0,
            config: None,
            log_level: "off".to_string(),
            population: 500,
            lambda: 0.2,
            model: ModelVariant::StrongInfectiousness,
            max_steps: DEFAULT_MAX_STEPS,
            runs: 1,
            threads: None,
        }
    }
}

impl BaseArgs {
    fn batch_config(&self) -> BatchConfig {
        BatchConfig {
            population: self.population,
            lambda: self.lambda,
            variant: self.model,
            max_steps: self.max_steps,
            n_runs: self.runs,
            seed: self.random_seed,
            threads: self.threads,
        }
    }
}

fn create_cli() -> Command {
    let cli = Command::new("superspreader")
        .about("Runs a batch of spatial superspreader epidemic trials");
    BaseArgs::augment_args(cli)
}

fn parse_log_level(level: &str) -> Result<LevelFilter, SimulationError> {
    LevelFilter::from_str(level).map_err(|_| {
        SimulationError::InvalidParameter(format!(
            "unknown log level `{level}`, expected off, error, warn, info, debug or trace"
        ))
    })
}

/// Configures logging, loads parameters and runs the batch described by `args`.
///
/// # Errors
/// Returns an error if the log level or config file is invalid or the batch is rejected.
pub fn run_with_args(args: &BaseArgs) -> Result<Vec<TrialResult>, SimulationError> {
    let level = parse_log_level(&args.log_level)?;
    if level != LevelFilter::Off {
        set_log_level(level);
    }

    let parameters = match &args.config {
        Some(path) => Parameters::from_json_file(path)?,
        None => Parameters::default(),
    };

    Simulation::new(parameters)?.run_batch(&args.batch_config())
}

/// Writes one JSON line per result.
///
/// # Errors
/// Returns an error if serialization or writing fails.
pub fn write_results<W: Write>(results: &[TrialResult], out: &mut W) -> Result<(), SimulationError> {
    for result in results {
        serde_json::to_writer(&mut *out, result)?;
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

/// Parses the command line, runs the batch and prints its results to stdout.
///
/// # Errors
/// Returns an error if argument parsing or the batch fails
pub fn run_from_command_line() -> Result<(), Box<dyn std::error::Error>> {
    let matches = create_cli().get_matches();
    let args = BaseArgs::from_arg_matches(&matches)?;
    let results = run_with_args(&args)?;
    write_results(&results, &mut std::io::stdout().lock())?;
    Ok(())
}
