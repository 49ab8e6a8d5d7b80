//! Many independent trials with the same parameters.
//!
//! Trial `i` of a batch draws from its own generator seeded with `trial_seed(seed, i)`, so a
//! batch's results depend only on its configuration and never on how many worker threads ran it
//! or in which order the trials finished.

use std::num::NonZeroUsize;
use std::thread;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64_with_seed;

use crate::error::{invalid, SimulationError};
use crate::kernel::ModelVariant;
use crate::parameters::Parameters;
use crate::info;
use crate::trial::{Trial, TrialResult, DEFAULT_MAX_STEPS, PERCOLATION_THRESHOLD};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BatchConfig {
    pub population: usize,
    pub lambda: f64,
    pub variant: ModelVariant,
    pub max_steps: usize,
    pub n_runs: usize,
    pub seed: u64,
    /// Worker threads. `None` uses the available parallelism.
    pub threads: Option<usize>,
}

impl BatchConfig {
    /// A single-run configuration with the default step cap, seed 0 and automatic threading.
    #[must_use]
    pub fn new(population: usize, lambda: f64, variant: ModelVariant) -> Self {
        BatchConfig {
            population,
            lambda,
            variant,
            max_steps: DEFAULT_MAX_STEPS,
            n_runs: 1,
            seed: 0,
            threads: None,
        }
    }

    fn worker_count(&self) -> usize {
        let wanted = self.threads.unwrap_or_else(|| {
            thread::available_parallelism().map_or(1, NonZeroUsize::get)
        });
        wanted.clamp(1, self.n_runs.max(1))
    }
}

/// The generator seed for trial `index` of a batch seeded with `seed`.
#[must_use]
pub fn trial_seed(seed: u64, index: usize) -> u64 {
    xxh3_64_with_seed(&(index as u64).to_le_bytes(), seed)
}

fn run_one(
    parameters: &Parameters,
    config: &BatchConfig,
    index: usize,
) -> Result<TrialResult, SimulationError> {
    let rng = SmallRng::seed_from_u64(trial_seed(config.seed, index));
    Trial::new(
        parameters,
        config.variant,
        config.population,
        config.lambda,
        rng,
    )?
    .run(config.max_steps)
}

/// Runs `config.n_runs` independent trials, spread over worker threads, and returns their
/// results in trial order.
///
/// # Errors
/// Returns `SimulationError::InvalidParameter` for an invalid configuration,
/// `SimulationError::IoError` if a worker thread cannot be spawned, and
/// `SimulationError::SimulationError` if one panics.
pub fn run_batch(
    parameters: &Parameters,
    config: &BatchConfig,
) -> Result<Vec<TrialResult>, SimulationError> {
    parameters.validate()?;
    if config.threads == Some(0) {
        return invalid("threads must be at least 1");
    }
    if config.max_steps < 1 {
        return invalid("max_steps must be at least 1");
    }
    if config.n_runs == 0 {
        return Ok(Vec::new());
    }

    let workers = config.worker_count();
    info!(
        "running {} {} trials (N = {}, lambda = {}) on {} threads",
        config.n_runs, config.variant, config.population, config.lambda, workers
    );

    let mut slots: Vec<Option<TrialResult>> = vec![None; config.n_runs];
    thread::scope(|scope| -> Result<(), SimulationError> {
        let handles = (0..workers)
            .map(|worker| {
                thread::Builder::new()
                    .name(format!("trial-worker-{worker}"))
                    .spawn_scoped(scope, move || {
                        (worker..config.n_runs)
                            .step_by(workers)
                            .map(|index| run_one(parameters, config, index).map(|r| (index, r)))
                            .collect::<Result<Vec<_>, SimulationError>>()
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        for handle in handles {
            let finished = handle.join().map_err(|_| {
                SimulationError::SimulationError("trial worker thread panicked".to_string())
            })??;
            for (index, result) in finished {
                slots[index] = Some(result);
            }
        }
        Ok(())
    })?;

    let results: Vec<TrialResult> = slots.into_iter().flatten().collect();
    let percolated = results
        .iter()
        .filter(|result| result.percolated(PERCOLATION_THRESHOLD * parameters.r0))
        .count();
    info!(
        "batch finished: {} of {} trials reached {} r0",
        percolated,
        results.len(),
        PERCOLATION_THRESHOLD
    );
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(threads: Option<usize>) -> BatchConfig {
        BatchConfig {
            n_runs: 12,
            seed: 2024,
            threads,
            ..BatchConfig::new(300, 0.2, ModelVariant::Hub)
        }
    }

    #[test]
    fn results_do_not_depend_on_thread_count() {
        let parameters = Parameters::default();
        let serial = run_batch(&parameters, &config(Some(1))).unwrap();
        assert_eq!(serial.len(), 12);
        for threads in [Some(2), Some(5), Some(64), None] {
            assert_eq!(run_batch(&parameters, &config(threads)).unwrap(), serial);
        }
    }

    #[test]
    fn trial_order_matches_direct_runs() {
        let parameters = Parameters::default();
        let config = config(Some(3));
        let batch = run_batch(&parameters, &config).unwrap();
        for (index, result) in batch.iter().enumerate() {
            assert_eq!(result, &run_one(&parameters, &config, index).unwrap());
        }
    }

    #[test]
    fn trials_get_distinct_seeds() {
        let seeds: Vec<u64> = (0..100).map(|index| trial_seed(7, index)).collect();
        for (i, a) in seeds.iter().enumerate() {
            assert!(seeds[i + 1..].iter().all(|b| a != b));
        }
        assert_ne!(trial_seed(7, 0), trial_seed(8, 0));
    }

    #[test]
    fn empty_and_invalid_batches() {
        let parameters = Parameters::default();
        let empty = BatchConfig {
            n_runs: 0,
            ..config(None)
        };
        assert!(run_batch(&parameters, &empty).unwrap().is_empty());

        let zero_threads = config(Some(0));
        assert!(run_batch(&parameters, &zero_threads).is_err());

        let bad_lambda = BatchConfig {
            lambda: -0.5,
            ..config(Some(2))
        };
        assert!(matches!(
            run_batch(&parameters, &bad_lambda),
            Err(SimulationError::InvalidParameter(_))
        ));
    }
}
