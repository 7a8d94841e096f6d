use std::fmt;

use crate::types::Seat;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A response for a seat that is not eligible in the active phase, a
    /// duplicate response, or a response tagged with a stale epoch.
    ProtocolViolation { seat: Seat, message: String },
    /// A claim that is not among the operations offered to the seat, or a
    /// win that does not meet the configured minimum.
    IllegalClaim { seat: Seat, message: String },
    /// Round state or phase bookkeeping is inconsistent. Fatal for the round.
    InvariantViolation { message: String },
    /// Seats that never reported ready before the loading deadline.
    LoadFailure { missing: Vec<Seat> },
    /// Settings or seat list rejected at construction.
    InvalidConfig { message: String },
}

impl EngineError {
    pub fn invariant(message: impl Into<String>) -> Self {
        EngineError::InvariantViolation {
            message: message.into(),
        }
    }

    pub fn protocol(seat: Seat, message: impl Into<String>) -> Self {
        EngineError::ProtocolViolation {
            seat,
            message: message.into(),
        }
    }

    /// Fatal errors abort the round and surface to the room owner.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::InvariantViolation { .. }
                | EngineError::LoadFailure { .. }
                | EngineError::InvalidConfig { .. }
        )
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::ProtocolViolation { seat, message } => {
                write!(f, "Protocol violation by seat {}: {}", seat, message)
            }
            EngineError::IllegalClaim { seat, message } => {
                write!(f, "Illegal claim by seat {}: {}", seat, message)
            }
            EngineError::InvariantViolation { message } => {
                write!(f, "Invariant violation: {}", message)
            }
            EngineError::LoadFailure { missing } => {
                write!(f, "Load failure: seats {:?} never became ready", missing)
            }
            EngineError::InvalidConfig { message } => {
                write!(f, "Invalid configuration: {}", message)
            }
        }
    }
}

impl std::error::Error for EngineError {}

pub type EngineResult<T> = Result<T, EngineError>;
