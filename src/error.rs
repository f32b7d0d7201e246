//! Error types for the unit commitment engine

use thiserror::Error;
use unitcommit_dispatch::DispatchError;

/// Unit commitment errors
///
/// Only configuration and usage mistakes are errors. Infeasible periods and
/// runs that never find a feasible schedule are reported as data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UcError {
    /// A generating unit breaks its invariants
    #[error("Invalid unit {unit}: {reason}")]
    InvalidUnit { unit: String, reason: String },

    /// Demand/reserve series is malformed
    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),

    /// GA parameters are out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Chromosome dimensions do not match the fleet and horizon
    #[error("Chromosome shape {units}x{periods} does not match fleet {expected_units}x{expected_periods}")]
    ShapeMismatch {
        units: usize,
        periods: usize,
        expected_units: usize,
        expected_periods: usize,
    },

    /// The engine has already produced its final answer
    #[error("Engine already terminated")]
    EngineTerminated,

    /// Generator data rejected by the dispatch solver
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}

pub type UcResult<T> = Result<T, UcError>;
