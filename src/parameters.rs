//! Model parameters shared by every trial: contact radii, peak transmission probability,
//! recovery probability and domain size.
//!
//! Parameters are an explicit immutable value handed to the engine, so trials with different
//! parameters can run side by side. Build them with [`ParametersBuilder`] or load them from a
//! JSON file with [`Parameters::from_json_file`]; both reject out-of-range values.

use std::path::Path;

use derive_builder::{Builder, UninitializedFieldError};
use serde::{Deserialize, Serialize};

use crate::error::{invalid, SimulationError};

pub const DEFAULT_R0: f64 = 1.0;
/// With `rs = √6 · r0` the Hub superspreader's spatially integrated transmission potential is six
/// times a normal individual's, the same ratio as a Strong-Infectiousness superspreader.
pub const DEFAULT_RS: f64 = 2.449_489_742_783_178;
pub const DEFAULT_W0: f64 = 1.0;
pub const DEFAULT_GAMMA: f64 = 0.5;
/// Default domain side length, in multiples of `r0`.
pub const DEFAULT_SIDE_LENGTH_FACTOR: f64 = 10.0;

/// Whether the index case takes part in the superspreader draw.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PatientZeroRole {
    /// Patient zero is a superspreader with probability λ, like everyone else.
    #[default]
    Drawn,
    /// Patient zero is always a normal individual.
    Normal,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Builder)]
#[builder(build_fn(private, name = "fallible_build", error = "SimulationError"))]
#[serde(default)]
pub struct Parameters {
    /// Contact radius of a normal individual (and of a Strong-Infectiousness superspreader).
    #[builder(default = "DEFAULT_R0")]
    pub r0: f64,

    /// Contact radius of a Hub superspreader.
    #[builder(default = "DEFAULT_RS")]
    pub rs: f64,

    /// Peak per-step transmission probability.
    #[builder(default = "DEFAULT_W0")]
    pub w0: f64,

    /// Per-step recovery probability.
    #[builder(default = "DEFAULT_GAMMA")]
    pub gamma: f64,

    /// Side length of the square domain. `None` means `10 · r0`.
    #[builder(default, setter(strip_option))]
    pub side_length: Option<f64>,

    #[builder(default)]
    pub patient_zero_role: PatientZeroRole,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            r0: DEFAULT_R0,
            rs: DEFAULT_RS,
            w0: DEFAULT_W0,
            gamma: DEFAULT_GAMMA,
            side_length: None,
            patient_zero_role: PatientZeroRole::Drawn,
        }
    }
}

impl From<UninitializedFieldError> for SimulationError {
    fn from(error: UninitializedFieldError) -> Self {
        SimulationError::InvalidParameter(error.to_string())
    }
}

impl ParametersBuilder {
    /// Builds and validates the parameters.
    ///
    /// # Errors
    /// Returns `SimulationError::InvalidParameter` if any value is out of range.
    pub fn build(&self) -> Result<Parameters, SimulationError> {
        let parameters = self.fallible_build()?;
        parameters.validate()?;
        Ok(parameters)
    }
}

fn check_probability(name: &str, value: f64) -> Result<(), SimulationError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        invalid(format!("{name} must lie in [0, 1], got {value}"))
    }
}

impl Parameters {
    /// Loads parameters from a JSON object. Missing keys take their default values.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if a value is out of range.
    pub fn from_json_file(path: &Path) -> Result<Parameters, SimulationError> {
        let contents = std::fs::read_to_string(path)?;
        let parameters: Parameters = serde_json::from_str(&contents)?;
        parameters.validate()?;
        Ok(parameters)
    }

    /// Checks every value against its valid range.
    ///
    /// # Errors
    /// Returns `SimulationError::InvalidParameter` naming the first offending value.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if !(self.r0.is_finite() && self.r0 > 0.0) {
            return invalid(format!("r0 must be positive, got {}", self.r0));
        }
        if !(self.rs.is_finite() && self.rs > self.r0) {
            return invalid(format!(
                "rs must be greater than r0 ({}), got {}",
                self.r0, self.rs
            ));
        }
        check_probability("w0", self.w0)?;
        check_probability("gamma", self.gamma)?;
        if let Some(side_length) = self.side_length {
            if !(side_length.is_finite() && side_length > 0.0) {
                return invalid(format!("side length must be positive, got {side_length}"));
            }
        }
        Ok(())
    }

    /// The domain side length `L`.
    #[must_use]
    pub fn side_length(&self) -> f64 {
        self.side_length
            .unwrap_or(DEFAULT_SIDE_LENGTH_FACTOR * self.r0)
    }
}
