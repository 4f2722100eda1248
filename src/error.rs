use std::fmt::{self, Display};
use std::io;

use crate::world::{AgentId, LocationId};

/// Provides `MalariaError` and maps other errors to
/// convert to a `MalariaError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum MalariaError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    CsvError(csv::Error),
    /// A location lookup fell outside the index. This means the index and the agents
    /// referring to it disagree, so it is never defaulted.
    InvalidLocationId(String),
    /// An occupancy insertion was attempted on a full location.
    CapacityExceeded {
        location: LocationId,
        agent: AgentId,
        capacity: usize,
    },
    /// A configuration value outside its sane bounds.
    ConfigOutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    /// An operation that requires a live agent was applied to a tombstoned slot.
    DeadAgent(AgentId),
    ReportError(String),
    MalariaError(String),
}

impl MalariaError {
    /// `true` for errors that indicate the world state can no longer be trusted.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MalariaError::InvalidLocationId(_) | MalariaError::DeadAgent(_)
        )
    }
}

impl From<io::Error> for MalariaError {
    fn from(error: io::Error) -> Self {
        MalariaError::IoError(error)
    }
}

impl From<serde_json::Error> for MalariaError {
    fn from(error: serde_json::Error) -> Self {
        MalariaError::JsonError(error)
    }
}

impl From<csv::Error> for MalariaError {
    fn from(error: csv::Error) -> Self {
        MalariaError::CsvError(error)
    }
}

impl From<String> for MalariaError {
    fn from(error: String) -> Self {
        MalariaError::MalariaError(error)
    }
}

impl From<&str> for MalariaError {
    fn from(error: &str) -> Self {
        MalariaError::MalariaError(error.to_string())
    }
}

impl std::error::Error for MalariaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MalariaError::IoError(error) => Some(error),
            MalariaError::JsonError(error) => Some(error),
            MalariaError::CsvError(error) => Some(error),
            _ => None,
        }
    }
}

impl Display for MalariaError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MalariaError::IoError(error) => write!(f, "I/O error: {error}"),
            MalariaError::JsonError(error) => write!(f, "JSON error: {error}"),
            MalariaError::CsvError(error) => write!(f, "CSV error: {error}"),
            MalariaError::InvalidLocationId(message) => {
                write!(f, "invalid location id: {message}")
            }
            MalariaError::CapacityExceeded {
                location,
                agent,
                capacity,
            } => write!(
                f,
                "{location} is at capacity ({capacity}); dropped occupant {agent}"
            ),
            MalariaError::ConfigOutOfRange {
                name,
                value,
                min,
                max,
            } => write!(
                f,
                "configuration value `{name}` = {value} is outside [{min}, {max}]"
            ),
            MalariaError::DeadAgent(agent) => write!(f, "{agent} is dead"),
            MalariaError::ReportError(message) => write!(f, "report error: {message}"),
            MalariaError::MalariaError(message) => write!(f, "{message}"),
        }
    }
}
