//! Error types for the SLA engine.

use thiserror::Error;

/// Result type alias for SLA engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in SLA engine operations.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid calendar: {0}")]
    InvalidCalendar(String),

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    // Clock errors
    #[error("Invalid transition: cannot {action} ticket {ticket_id} while {state}")]
    InvalidTransition {
        ticket_id: String,
        state: String,
        action: &'static str,
    },

    #[error("Calendar {calendar_id} has no open window within {days} days")]
    CalendarExhausted { calendar_id: u64, days: u32 },

    #[error("SLA clock not found: {0}")]
    ClockNotFound(String),

    #[error("SLA clock already exists: {0}")]
    ClockAlreadyExists(String),

    #[error("Version conflict on ticket {ticket_id}: expected {expected}, found {actual}")]
    VersionConflict {
        ticket_id: String,
        expected: u64,
        actual: u64,
    },

    // Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the failure is an optimistic-concurrency conflict worth retrying.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::VersionConflict { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_message() {
        let err = Error::InvalidTransition {
            ticket_id: "INC-1".to_string(),
            state: "paused".to_string(),
            action: "pause",
        };
        assert_eq!(
            err.to_string(),
            "Invalid transition: cannot pause ticket INC-1 while paused"
        );
    }

    #[test]
    fn test_conflict_detection() {
        let conflict = Error::VersionConflict {
            ticket_id: "INC-1".to_string(),
            expected: 1,
            actual: 2,
        };
        assert!(conflict.is_conflict());
        assert!(!Error::Internal("boom".to_string()).is_conflict());
    }
}
