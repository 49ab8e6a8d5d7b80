//! The stepped Monte-Carlo trial.
//!
//! One step is one generation of contact opportunities:
//!
//! 1. Every infectious individual that has already had a step to transmit recovers with
//!    probability `gamma`. Recovery comes first, so nobody is credited with a transmission in the
//!    step they recover.
//! 2. Every remaining infectious individual, in ascending id order, draws once against each
//!    susceptible within its contact radius with the kernel probability.
//! 3. A susceptible hit by one or more draws becomes infectious, credited to the hitting
//!    individual with the smallest id. New infections only start transmitting next step.
//! 4. The step's new-infection count and the epidemic front (the furthest origin distance of
//!    anyone ever infected) are recorded.
//!
//! The trial ends when nobody is infectious or the step cap is reached.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::Domain;
use crate::error::{invalid, SimulationError};
use crate::kernel::{Kernel, ModelVariant, Role};
use crate::parameters::Parameters;
use crate::population::{InfectionStatus, Population};
use crate::{debug, trace};

/// Step cap used when the caller has no preference.
pub const DEFAULT_MAX_STEPS: usize = 100;

/// Front distance, in multiples of `r0`, at which a trial counts as a spanning epidemic. With the
/// default `L = 10 · r0` this is the distance from the origin to the domain edge.
pub const PERCOLATION_THRESHOLD: f64 = 5.0;

/// Everything one trial produced. Series are as long as the number of steps actually run.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TrialResult {
    pub new_infections_per_step: Vec<usize>,
    pub max_distances: Vec<f64>,
    /// Secondary infections credited to each individual, indexed by id.
    pub secondary_infections: Vec<usize>,
    pub roles: Vec<Role>,
    pub final_status: Vec<InfectionStatus>,
    /// Who infected each individual, indexed by id.
    pub infectors: Vec<Option<usize>>,
}

impl TrialResult {
    #[must_use]
    pub fn steps(&self) -> usize {
        self.new_infections_per_step.len()
    }

    /// Transmissions over the whole trial. Patient zero is not counted.
    #[must_use]
    pub fn total_new_infections(&self) -> usize {
        self.new_infections_per_step.iter().sum()
    }

    /// Number of individuals ever infected, patient zero included.
    #[must_use]
    pub fn final_size(&self) -> usize {
        self.final_status
            .iter()
            .filter(|status| status.ever_infected())
            .count()
    }

    #[must_use]
    pub fn superspreader_count(&self) -> usize {
        self.roles.iter().filter(|role| role.is_superspreader()).count()
    }

    /// True if nobody was still infectious when the trial stopped.
    #[must_use]
    pub fn burned_out(&self) -> bool {
        !self.final_status.contains(&InfectionStatus::Infectious)
    }

    /// The furthest the epidemic got, 0 when no step ran.
    #[must_use]
    pub fn max_distance(&self) -> f64 {
        self.max_distances.last().copied().unwrap_or(0.0)
    }

    /// True if the front reached `threshold`.
    #[must_use]
    pub fn percolated(&self, threshold: f64) -> bool {
        self.max_distance() >= threshold
    }

    /// New infections padded with zeros to `len` steps (truncated if longer).
    #[must_use]
    pub fn padded_new_infections(&self, len: usize) -> Vec<usize> {
        let mut padded: Vec<usize> = self.new_infections_per_step.iter().copied().take(len).collect();
        padded.resize(len, 0);
        padded
    }

    /// Front distances padded with the last recorded value to `len` steps (truncated if longer).
    #[must_use]
    pub fn padded_max_distances(&self, len: usize) -> Vec<f64> {
        let mut padded: Vec<f64> = self.max_distances.iter().copied().take(len).collect();
        padded.resize(len, self.max_distance());
        padded
    }
}

/// One epidemic run over a fixed population.
pub struct Trial<R: Rng> {
    kernel: Kernel,
    gamma: f64,
    domain: Domain,
    population: Population,
    rng: R,
    new_infections_per_step: Vec<usize>,
    max_distances: Vec<f64>,
    front: f64,
    // Susceptibles already hit during the current step.
    claimed: Vec<bool>,
}

impl<R: Rng> Trial<R> {
    /// Places `population_size` individuals uniformly, draws their roles and seeds patient zero.
    ///
    /// # Errors
    /// Returns `SimulationError::InvalidParameter` if the parameters are invalid,
    /// `population_size < 1`, or `lambda` lies outside `[0, 1]`.
    pub fn new(
        parameters: &Parameters,
        variant: ModelVariant,
        population_size: usize,
        lambda: f64,
        mut rng: R,
    ) -> Result<Self, SimulationError> {
        parameters.validate()?;
        let kernel = Kernel::new(parameters, variant);
        let domain = Domain::place_uniform(
            population_size,
            parameters.side_length(),
            kernel.max_contact_radius(),
            &mut rng,
        )?;
        let population = Population::new(&domain, lambda, parameters.patient_zero_role, &mut rng)?;
        Trial::with_population(parameters, variant, domain, population, rng)
    }

    /// Runs over an existing placement and population instead of drawing new ones.
    ///
    /// # Errors
    /// Returns `SimulationError::InvalidParameter` if the parameters are invalid or the domain
    /// and population sizes differ.
    pub fn with_population(
        parameters: &Parameters,
        variant: ModelVariant,
        domain: Domain,
        population: Population,
        rng: R,
    ) -> Result<Self, SimulationError> {
        parameters.validate()?;
        if domain.len() != population.len() {
            return invalid(format!(
                "domain holds {} positions but population has {} individuals",
                domain.len(),
                population.len()
            ));
        }
        let front = population
            .iter()
            .filter(|individual| individual.status().ever_infected())
            .map(|individual| domain.distance_from_origin(individual.id()))
            .fold(0.0, f64::max);
        Ok(Trial {
            kernel: Kernel::new(parameters, variant),
            gamma: parameters.gamma,
            claimed: vec![false; population.len()],
            domain,
            population,
            rng,
            new_infections_per_step: Vec::new(),
            max_distances: Vec::new(),
            front,
        })
    }

    #[must_use]
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    #[must_use]
    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Steps run so far.
    #[must_use]
    pub fn steps(&self) -> usize {
        self.new_infections_per_step.len()
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        !self.population.has_infectious()
    }

    /// Advances the epidemic by one step and returns the number of new infections.
    pub fn step(&mut self) -> usize {
        let recovered = self.population.attempt_recoveries(self.gamma, &mut self.rng);

        let mut transmissions: Vec<(usize, usize)> = Vec::new();
        for &source in self.population.infectious() {
            let role = self.population.role(source);
            let population = &self.population;
            let claimed = &self.claimed;
            let candidates = self.domain.neighbours_within(
                self.domain.position(source),
                self.kernel.contact_radius(role),
                |id| population.status(id) == InfectionStatus::Susceptible && !claimed[id],
            );

            for (target, distance) in candidates {
                let probability = self.kernel.probability(distance, role);
                if probability > 0.0 && self.rng.random_bool(probability) {
                    // Sources run in ascending id order, so the first hit is the smallest id.
                    self.claimed[target] = true;
                    transmissions.push((source, target));
                }
            }
        }

        self.population.advance_infectious_age();

        for &(source, target) in &transmissions {
            self.claimed[target] = false;
            self.population.infect(target, source);
            self.front = self.front.max(self.domain.distance_from_origin(target));
        }

        let new_infections = transmissions.len();
        self.new_infections_per_step.push(new_infections);
        self.max_distances.push(self.front);

        trace!(
            "step {}: {} recovered, {} infected, {} infectious, front {:.3}",
            self.steps(),
            recovered,
            new_infections,
            self.population.infectious().len(),
            self.front
        );
        new_infections
    }

    /// Steps until nobody is infectious or `max_steps` steps have run.
    ///
    /// # Errors
    /// Returns `SimulationError::InvalidParameter` if `max_steps` is zero.
    pub fn run(mut self, max_steps: usize) -> Result<TrialResult, SimulationError> {
        if max_steps < 1 {
            return invalid("max_steps must be at least 1");
        }
        while !self.is_over() && self.steps() < max_steps {
            self.step();
        }
        debug!(
            "{} trial finished after {} steps: {} of {} infected, front {:.3}",
            self.kernel.variant(),
            self.steps(),
            self.population.ever_infected(),
            self.population.len(),
            self.front
        );
        Ok(self.into_result())
    }

    /// Snapshot of the trial so far.
    #[must_use]
    pub fn into_result(self) -> TrialResult {
        TrialResult {
            roles: self.population.iter().map(|i| i.role()).collect(),
            final_status: self.population.iter().map(|i| i.status()).collect(),
            infectors: self.population.iter().map(|i| i.infector()).collect(),
            secondary_infections: self.population.secondary_infections().to_vec(),
            new_infections_per_step: self.new_infections_per_step,
            max_distances: self.max_distances,
        }
    }
}
