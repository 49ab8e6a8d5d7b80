//! The two entry points the analysis layer drives the engine through.
//!
//! ```
//! use superspreader::{ModelVariant, Parameters, Simulation};
//!
//! let simulation = Simulation::new(Parameters::default()).unwrap();
//! let result = simulation
//!     .run_simulation(200, 0.2, ModelVariant::Hub, 100, 42)
//!     .unwrap();
//! assert_eq!(result.roles.len(), 200);
//!
//! let p = simulation.infection_probability(0.5, false, ModelVariant::StrongInfectiousness);
//! assert!((p - 0.25).abs() < 1e-12);
//! ```

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::batch::{run_batch, BatchConfig};
use crate::error::SimulationError;
use crate::kernel::{Kernel, ModelVariant, Role};
use crate::parameters::Parameters;
use crate::trial::{Trial, TrialResult};

/// A validated parameter set with the operations that use it.
#[derive(Clone, Debug, PartialEq)]
pub struct Simulation {
    parameters: Parameters,
}

impl Simulation {
    /// # Errors
    /// Returns `SimulationError::InvalidParameter` if `parameters` fail validation.
    pub fn new(parameters: Parameters) -> Result<Self, SimulationError> {
        parameters.validate()?;
        Ok(Simulation { parameters })
    }

    #[must_use]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    #[must_use]
    pub fn kernel(&self, variant: ModelVariant) -> Kernel {
        Kernel::new(&self.parameters, variant)
    }

    /// Runs one trial of `n` individuals seeded with `seed`.
    ///
    /// # Errors
    /// Returns `SimulationError::InvalidParameter` if `n < 1`, `lambda` lies outside `[0, 1]`
    /// or `max_steps < 1`.
    pub fn run_simulation(
        &self,
        n: usize,
        lambda: f64,
        variant: ModelVariant,
        max_steps: usize,
        seed: u64,
    ) -> Result<TrialResult, SimulationError> {
        self.run_simulation_with_rng(n, lambda, variant, max_steps, SmallRng::seed_from_u64(seed))
    }

    /// Like [`Simulation::run_simulation`] but drawing from a caller-supplied generator.
    ///
    /// # Errors
    /// See [`Simulation::run_simulation`].
    pub fn run_simulation_with_rng<R: Rng>(
        &self,
        n: usize,
        lambda: f64,
        variant: ModelVariant,
        max_steps: usize,
        rng: R,
    ) -> Result<TrialResult, SimulationError> {
        Trial::new(&self.parameters, variant, n, lambda, rng)?.run(max_steps)
    }

    /// Transmission probability at distance `r`. Never fails: `r` beyond the contact radius
    /// gives exactly 0.
    #[must_use]
    pub fn infection_probability(&self, r: f64, is_superspreader: bool, variant: ModelVariant) -> f64 {
        self.kernel(variant)
            .probability(r, Role::from(is_superspreader))
    }

    /// Runs a batch of independent trials with these parameters.
    ///
    /// # Errors
    /// See [`run_batch`].
    pub fn run_batch(&self, config: &BatchConfig) -> Result<Vec<TrialResult>, SimulationError> {
        run_batch(&self.parameters, config)
    }
}

#[cfg(test)]
mod tests {
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    use super::*;
    use crate::parameters::ParametersBuilder;

    #[test]
    fn rejects_invalid_parameters() {
        let parameters = Parameters {
            rs: 0.5,
            ..Parameters::default()
        };
        assert!(matches!(
            Simulation::new(parameters),
            Err(SimulationError::InvalidParameter(_))
        ));
    }

    #[test]
    fn infection_probability_uses_configured_constants() {
        let parameters = ParametersBuilder::default()
            .r0(2.0)
            .rs(3.0)
            .w0(0.8)
            .build()
            .unwrap();
        let simulation = Simulation::new(parameters).unwrap();
        for variant in [ModelVariant::StrongInfectiousness, ModelVariant::Hub] {
            assert_relative_eq!(simulation.infection_probability(0.0, false, variant), 0.8);
            assert_abs_diff_eq!(simulation.infection_probability(2.0, false, variant), 0.0);
            assert_abs_diff_eq!(simulation.infection_probability(2.5, false, variant), 0.0);
        }
        let strong = ModelVariant::StrongInfectiousness;
        assert_relative_eq!(simulation.infection_probability(1.9, true, strong), 0.8);
        assert_abs_diff_eq!(simulation.infection_probability(2.1, true, strong), 0.0);
        assert!(simulation.infection_probability(2.9, true, ModelVariant::Hub) > 0.0);
        assert_abs_diff_eq!(simulation.infection_probability(3.0, true, ModelVariant::Hub), 0.0);
    }

    #[test]
    fn run_simulation_is_reproducible() {
        let simulation = Simulation::new(Parameters::default()).unwrap();
        let a = simulation
            .run_simulation(250, 0.1, ModelVariant::StrongInfectiousness, 100, 3)
            .unwrap();
        let b = simulation
            .run_simulation_with_rng(
                250,
                0.1,
                ModelVariant::StrongInfectiousness,
                100,
                SmallRng::seed_from_u64(3),
            )
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn run_simulation_rejects_bad_arguments() {
        let simulation = Simulation::new(Parameters::default()).unwrap();
        let hub = ModelVariant::Hub;
        assert!(simulation.run_simulation(0, 0.1, hub, 100, 0).is_err());
        assert!(simulation.run_simulation(10, 1.01, hub, 100, 0).is_err());
        assert!(simulation.run_simulation(10, 0.1, hub, 0, 0).is_err());
    }
}
