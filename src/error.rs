use std::fmt::{self, Debug, Display};
use std::io;

/// Provides `SimulationError` and maps to other errors to
/// convert to a `SimulationError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum SimulationError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    /// A configuration value was rejected at construction time. Values are
    /// never clamped into range.
    InvalidParameter(String),
    SimulationError(String),
}

impl From<io::Error> for SimulationError {
    fn from(error: io::Error) -> Self {
        SimulationError::IoError(error)
    }
}

impl From<serde_json::Error> for SimulationError {
    fn from(error: serde_json::Error) -> Self {
        SimulationError::JsonError(error)
    }
}

impl From<String> for SimulationError {
    fn from(error: String) -> Self {
        SimulationError::SimulationError(error)
    }
}

impl From<&str> for SimulationError {
    fn from(error: &str) -> Self {
        SimulationError::SimulationError(error.to_string())
    }
}

impl std::error::Error for SimulationError {}

impl Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SimulationError::InvalidParameter(message) => {
                write!(f, "Invalid parameter: {message}")?;
            }
            _ => write!(f, "Error: {self:?}")?,
        }
        Ok(())
    }
}

/// Shorthand for rejecting a configuration value.
pub(crate) fn invalid<T>(message: impl Into<String>) -> Result<T, SimulationError> {
    Err(SimulationError::InvalidParameter(message.into()))
}
