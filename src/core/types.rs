//! Common types used across the SLA engine.

use serde::{Deserialize, Serialize};

/// Timestamp wrapper for consistent serialization. Always UTC-normalized.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Identifier of a business calendar (office-hours record).
pub type CalendarId = u64;

/// Identifier of a user location that may be assigned a calendar.
pub type LocationId = u64;

/// Ticket identifier (e.g. `INC0001234`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TicketId(pub String);

impl TicketId {
    /// Create a new ticket ID.
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }

    /// Get the ID string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TicketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TicketId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Convert fractional hours into a duration with millisecond precision.
///
/// Returns `None` when the value is not finite or does not fit a duration.
pub fn hours_to_duration(hours: f64) -> Option<chrono::Duration> {
    let millis = (hours * 3_600_000.0).round();
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return None;
    }
    chrono::Duration::try_milliseconds(millis as i64)
}
