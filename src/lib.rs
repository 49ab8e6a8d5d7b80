//! A spatial SIR epidemic engine for comparing superspreader hypotheses
//!
//! Individuals are scattered uniformly over a square domain. Patient zero sits at the origin and
//! infects neighbours through a distance-dependent transmission kernel. A fraction λ of the
//! population are superspreaders, and the two model variants disagree about what that means:
//! * **Strong Infectiousness**: superspreaders reach as far as everyone else but transmit with
//!   the peak probability across their whole contact disk.
//! * **Hub**: superspreaders transmit like everyone else but over a larger contact radius.
//!
//! A trial advances in discrete steps and records how many new infections each step produced,
//! how far the epidemic front got from the origin, and who infected whom. The analysis layer
//! runs many trials through [`Simulation::run_simulation`] or [`run_batch`] to build
//! percolation and critical-density curves, and queries the kernel directly through
//! [`Simulation::infection_probability`].
//!
//! The engine is organised as:
//! * [`kernel`]: the transmission probability as a function of distance and role.
//! * [`domain`]: positions and the cell grid answering radius queries.
//! * [`population`]: per-individual status, role and infection attribution.
//! * [`trial`]: the stepped Monte-Carlo trial and its [`TrialResult`].
//! * [`batch`]: independent, deterministically seeded trials over worker threads.
pub mod batch;
pub mod domain;
pub mod error;
pub mod kernel;
pub mod log;
pub mod parameters;
pub mod population;
pub mod runner;
pub mod simulation;
pub mod trial;

pub use batch::{run_batch, trial_seed, BatchConfig};
pub use domain::{Domain, Point, PATIENT_ZERO};
pub use error::SimulationError;
pub use kernel::{Kernel, ModelVariant, Role};
pub use crate::log::{
    debug, disable_logging, enable_logging, error, info, remove_module_filter, set_log_level,
    set_module_filter, set_module_filters, trace, warn, LevelFilter,
};
pub use parameters::{Parameters, ParametersBuilder, PatientZeroRole};
pub use population::{InfectionStatus, Individual, Population};
pub use simulation::Simulation;
pub use trial::{Trial, TrialResult, DEFAULT_MAX_STEPS, PERCOLATION_THRESHOLD};

// Re-export for use in user code.
pub use rand;
