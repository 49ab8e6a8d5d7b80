//! Shared setup for the engine benchmarks.

use superspreader::rand::rngs::SmallRng;
use superspreader::rand::SeedableRng;
use superspreader::{BatchConfig, Domain, ModelVariant, Parameters};

pub const SEED: u64 = 42;

/// Population sizes spanning sub- to super-critical densities on the default 10 × 10 domain.
pub const POPULATIONS: [usize; 3] = [100, 500, 2000];

#[must_use]
pub fn batch_config(population: usize, variant: ModelVariant, n_runs: usize) -> BatchConfig {
    BatchConfig {
        n_runs,
        seed: SEED,
        ..BatchConfig::new(population, 0.2, variant)
    }
}

/// A uniformly placed domain gridded for the widest contact radius under `variant`.
///
/// # Panics
/// Panics if `population` is zero.
#[must_use]
pub fn uniform_domain(population: usize, variant: ModelVariant) -> Domain {
    let parameters = Parameters::default();
    let cell_size = superspreader::Kernel::new(&parameters, variant).max_contact_radius();
    let mut rng = SmallRng::seed_from_u64(SEED);
    Domain::place_uniform(population, parameters.side_length(), cell_size, &mut rng)
        .expect("population must be non-empty")
}
