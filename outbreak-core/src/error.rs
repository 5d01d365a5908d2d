//! Error types for simulation construction and execution.

use thiserror::Error;

use crate::invariants::InvariantViolation;

/// Errors that can occur while building or running a simulation.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Constructor input failed validation
    #[error("Invalid parameter: {reason}")]
    InvalidParameter {
        /// What was wrong with the input
        reason: String,
    },

    /// Operation is not allowed in the current run phase
    #[error("Invalid state: {reason}")]
    InvalidState {
        /// Why the operation was rejected
        reason: String,
    },

    /// Internal invariant broke during the event loop
    #[error("Invariant violated: {0}")]
    InvariantViolated(InvariantViolation),

    /// Batch worker task panicked or was cancelled
    #[error("Simulation task failed: {reason}")]
    TaskFailed {
        /// Join error reported by the runtime
        reason: String,
    },
}

impl SimulationError {
    pub(crate) fn invalid_parameter(reason: impl Into<String>) -> Self {
        SimulationError::InvalidParameter {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_state(reason: impl Into<String>) -> Self {
        SimulationError::InvalidState {
            reason: reason.into(),
        }
    }

    /// Checks if this error was caused by caller input or call order.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            SimulationError::InvalidParameter { .. } | SimulationError::InvalidState { .. }
        )
    }
}

impl From<InvariantViolation> for SimulationError {
    fn from(violation: InvariantViolation) -> Self {
        SimulationError::InvariantViolated(violation)
    }
}

/// Result type for simulation operations.
pub type Result<T> = std::result::Result<T, SimulationError>;
