//! Per-individual epidemiological state for one trial.
//!
//! Each individual moves monotonically Susceptible → Infectious → Removed. Roles are drawn once
//! at creation and never change. Every S → I transition records its infector and credits that
//! infector with one secondary infection, so the secondary-infection tally always sums to the
//! number of transmissions so far.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::{Domain, Point, PATIENT_ZERO};
use crate::error::{invalid, SimulationError};
use crate::kernel::Role;
use crate::parameters::PatientZeroRole;
use crate::trace;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InfectionStatus {
    Susceptible,
    Infectious,
    Removed,
}

impl InfectionStatus {
    /// True for anyone who has been infected at some point.
    #[must_use]
    pub fn ever_infected(self) -> bool {
        self != InfectionStatus::Susceptible
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Individual {
    id: usize,
    position: Point,
    role: Role,
    status: InfectionStatus,
    infectious_age: u32,
    infector: Option<usize>,
}

impl Individual {
    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    #[must_use]
    pub fn position(&self) -> Point {
        self.position
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn status(&self) -> InfectionStatus {
        self.status
    }

    /// Number of steps in which this individual has had the chance to transmit.
    #[must_use]
    pub fn infectious_age(&self) -> u32 {
        self.infectious_age
    }

    /// Who infected this individual. `None` for patient zero and for anyone never infected.
    #[must_use]
    pub fn infector(&self) -> Option<usize> {
        self.infector
    }
}

#[derive(Clone, Debug)]
pub struct Population {
    individuals: Vec<Individual>,
    secondary_infections: Vec<usize>,
    // Currently infectious ids, ascending.
    infectious: Vec<usize>,
}

impl Population {
    /// Creates one individual per position in `domain`. Each individual is a superspreader with
    /// probability `lambda`, except that patient zero is forced normal under
    /// `PatientZeroRole::Normal`. Patient zero starts Infectious, everyone else Susceptible.
    ///
    /// # Errors
    /// Returns `SimulationError::InvalidParameter` if `lambda` lies outside `[0, 1]`.
    pub fn new<R: Rng>(
        domain: &Domain,
        lambda: f64,
        patient_zero_role: PatientZeroRole,
        rng: &mut R,
    ) -> Result<Self, SimulationError> {
        if !(0.0..=1.0).contains(&lambda) {
            return invalid(format!("lambda must lie in [0, 1], got {lambda}"));
        }

        let individuals: Vec<Individual> = domain
            .positions()
            .iter()
            .enumerate()
            .map(|(id, &position)| {
                let role = if id == PATIENT_ZERO && patient_zero_role == PatientZeroRole::Normal {
                    Role::Normal
                } else {
                    Role::from(rng.random_bool(lambda))
                };
                let status = if id == PATIENT_ZERO {
                    InfectionStatus::Infectious
                } else {
                    InfectionStatus::Susceptible
                };
                Individual {
                    id,
                    position,
                    role,
                    status,
                    infectious_age: 0,
                    infector: None,
                }
            })
            .collect();

        trace!(
            "created population of {} with {} superspreaders",
            individuals.len(),
            individuals
                .iter()
                .filter(|individual| individual.role.is_superspreader())
                .count()
        );

        Ok(Population {
            secondary_infections: vec![0; individuals.len()],
            individuals,
            infectious: vec![PATIENT_ZERO],
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    #[must_use]
    pub fn individual(&self, id: usize) -> &Individual {
        &self.individuals[id]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Individual> {
        self.individuals.iter()
    }

    #[must_use]
    pub fn status(&self, id: usize) -> InfectionStatus {
        self.individuals[id].status
    }

    #[must_use]
    pub fn role(&self, id: usize) -> Role {
        self.individuals[id].role
    }

    /// Currently infectious ids in ascending order.
    #[must_use]
    pub fn infectious(&self) -> &[usize] {
        &self.infectious
    }

    #[must_use]
    pub fn has_infectious(&self) -> bool {
        !self.infectious.is_empty()
    }

    #[must_use]
    pub fn secondary_infections(&self) -> &[usize] {
        &self.secondary_infections
    }

    /// Moves `target` from Susceptible to Infectious, crediting `infector`. Returns false and
    /// changes nothing if `target` is not Susceptible or `infector` is not Infectious.
    pub fn infect(&mut self, target: usize, infector: usize) -> bool {
        if self.individuals[target].status != InfectionStatus::Susceptible
            || self.individuals[infector].status != InfectionStatus::Infectious
        {
            return false;
        }
        let individual = &mut self.individuals[target];
        individual.status = InfectionStatus::Infectious;
        individual.infectious_age = 0;
        individual.infector = Some(infector);
        self.secondary_infections[infector] += 1;

        let position = self.infectious.partition_point(|&id| id < target);
        self.infectious.insert(position, target);
        true
    }

    /// Moves `id` from Infectious to Removed. Returns false and changes nothing otherwise.
    pub fn remove(&mut self, id: usize) -> bool {
        if self.individuals[id].status != InfectionStatus::Infectious {
            return false;
        }
        self.individuals[id].status = InfectionStatus::Removed;
        self.infectious.retain(|&other| other != id);
        true
    }

    /// Every infectious individual that has already had one step to transmit recovers with
    /// probability `gamma`. Returns the number removed.
    pub fn attempt_recoveries<R: Rng>(&mut self, gamma: f64, rng: &mut R) -> usize {
        let individuals = &mut self.individuals;
        let before = self.infectious.len();
        self.infectious.retain(|&id| {
            let individual = &mut individuals[id];
            if individual.infectious_age >= 1 && rng.random_bool(gamma) {
                individual.status = InfectionStatus::Removed;
                false
            } else {
                true
            }
        });
        before - self.infectious.len()
    }

    /// Ages every currently infectious individual by one step. Call this after they have had
    /// their chance to transmit and before the step's new infections are applied.
    pub fn advance_infectious_age(&mut self) {
        for &id in &self.infectious {
            self.individuals[id].infectious_age += 1;
        }
    }

    /// Number of individuals that are Infectious or Removed.
    #[must_use]
    pub fn ever_infected(&self) -> usize {
        self.individuals
            .iter()
            .filter(|individual| individual.status.ever_infected())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use super::*;

    fn population(n: usize, lambda: f64, patient_zero_role: PatientZeroRole) -> Population {
        let mut rng = SmallRng::seed_from_u64(11);
        let domain = Domain::place_uniform(n, 10.0, 1.0, &mut rng).unwrap();
        Population::new(&domain, lambda, patient_zero_role, &mut rng).unwrap()
    }

    #[test]
    fn starts_with_patient_zero_infectious() {
        let population = population(50, 0.3, PatientZeroRole::Drawn);
        assert_eq!(population.infectious(), &[PATIENT_ZERO]);
        assert_eq!(population.status(PATIENT_ZERO), InfectionStatus::Infectious);
        assert_eq!(population.individual(PATIENT_ZERO).infector(), None);
        assert_eq!(population.ever_infected(), 1);
        assert!(population
            .iter()
            .skip(1)
            .all(|individual| individual.status() == InfectionStatus::Susceptible));
        assert_eq!(population.secondary_infections().iter().sum::<usize>(), 0);
    }

    #[test]
    fn role_draw_follows_lambda() {
        let none = population(300, 0.0, PatientZeroRole::Drawn);
        assert!(none.iter().all(|individual| individual.role() == Role::Normal));

        let all = population(300, 1.0, PatientZeroRole::Drawn);
        assert!(all.iter().all(|individual| individual.role() == Role::Superspreader));

        let forced = population(300, 1.0, PatientZeroRole::Normal);
        assert_eq!(forced.role(PATIENT_ZERO), Role::Normal);
        assert!(forced
            .iter()
            .skip(1)
            .all(|individual| individual.role() == Role::Superspreader));

        let some = population(2000, 0.2, PatientZeroRole::Drawn);
        let superspreaders = some.iter().filter(|i| i.role().is_superspreader()).count();
        assert!((300..500).contains(&superspreaders));
    }

    #[test]
    fn rejects_lambda_out_of_range() {
        let mut rng = SmallRng::seed_from_u64(0);
        let domain = Domain::place_uniform(5, 10.0, 1.0, &mut rng).unwrap();
        for lambda in [-0.1, 1.1, f64::NAN] {
            assert!(matches!(
                Population::new(&domain, lambda, PatientZeroRole::Drawn, &mut rng),
                Err(SimulationError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn transitions_are_monotone_and_attributed() {
        let mut population = population(10, 0.0, PatientZeroRole::Drawn);

        assert!(population.infect(3, PATIENT_ZERO));
        assert!(population.infect(1, PATIENT_ZERO));
        assert!(population.infect(7, 3));
        assert_eq!(population.infectious(), &[0, 1, 3, 7]);
        assert_eq!(population.individual(7).infector(), Some(3));

        // Already infectious, and a susceptible cannot infect.
        assert!(!population.infect(3, 1));
        assert!(!population.infect(5, 6));

        assert!(population.remove(3));
        assert!(!population.remove(3));
        assert_eq!(population.status(3), InfectionStatus::Removed);
        // Removed individuals are never reinfected and never transmit.
        assert!(!population.infect(3, 1));
        assert!(!population.infect(4, 3));

        assert_eq!(population.secondary_infections()[PATIENT_ZERO], 2);
        assert_eq!(population.secondary_infections()[3], 1);
        assert_eq!(population.secondary_infections().iter().sum::<usize>(), 3);
        assert_eq!(population.ever_infected(), 4);
    }

    #[test]
    fn recovery_waits_one_step() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut population = population(4, 0.0, PatientZeroRole::Drawn);

        // Nobody has been infectious for a full step yet.
        assert_eq!(population.attempt_recoveries(1.0, &mut rng), 0);
        population.advance_infectious_age();
        assert_eq!(population.individual(PATIENT_ZERO).infectious_age(), 1);

        assert!(population.infect(2, PATIENT_ZERO));
        assert_eq!(population.attempt_recoveries(1.0, &mut rng), 1);
        assert_eq!(population.infectious(), &[2]);
        assert_eq!(population.status(PATIENT_ZERO), InfectionStatus::Removed);
    }

    #[test]
    fn transmitting_steps_are_geometric() {
        let mut rng = SmallRng::seed_from_u64(17);
        let n = 4000;
        let mut population = population(n, 0.0, PatientZeroRole::Drawn);
        for target in 1..n {
            assert!(population.infect(target, PATIENT_ZERO));
        }

        let mut steps = 0;
        while population.has_infectious() && steps < 500 {
            population.attempt_recoveries(0.5, &mut rng);
            population.advance_infectious_age();
            steps += 1;
        }
        assert!(!population.has_infectious());

        // Removed individuals keep the number of steps in which they could transmit.
        let ages: Vec<u32> = population.iter().map(Individual::infectious_age).collect();
        assert!(ages.iter().all(|&age| age >= 1));
        let mean = f64::from(ages.iter().sum::<u32>()) / f64::from(u32::try_from(n).unwrap());
        assert!((mean - 2.0).abs() < 0.15, "mean transmitting steps {mean}");
        #[allow(clippy::cast_precision_loss)]
        let single = ages.iter().filter(|&&age| age == 1).count() as f64 / n as f64;
        assert!((single - 0.5).abs() < 0.05, "fraction with one step {single}");
    }

    #[test]
    fn zero_gamma_never_recovers() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut population = population(4, 0.0, PatientZeroRole::Drawn);
        for _ in 0..100 {
            population.advance_infectious_age();
            assert_eq!(population.attempt_recoveries(0.0, &mut rng), 0);
        }
        assert!(population.has_infectious());
    }
}
