//! Priority policies.
//!
//! Maps priority codes to respond/resolve durations.

use crate::core::{hours_to_duration, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Ticket priority.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    /// Critical
    P1,
    /// High
    P2,
    /// Moderate
    P3,
    /// Low
    P4,
    /// Planning
    P5,
}

/// Urgency or impact rating used to derive a priority.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    /// Low
    Low,
    /// Medium
    Medium,
    /// High
    High,
}

impl Priority {
    /// Derive a priority from urgency and impact.
    pub fn from_matrix(urgency: Rating, impact: Rating) -> Self {
        use Rating::*;
        match (urgency, impact) {
            (High, High) => Priority::P1,
            (High, Medium) | (Medium, High) => Priority::P2,
            (High, Low) | (Medium, Medium) | (Low, High) => Priority::P3,
            (Medium, Low) | (Low, Medium) => Priority::P4,
            (Low, Low) => Priority::P5,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::P1 => write!(f, "P1"),
            Priority::P2 => write!(f, "P2"),
            Priority::P3 => write!(f, "P3"),
            Priority::P4 => write!(f, "P4"),
            Priority::P5 => write!(f, "P5"),
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "P1" => Ok(Priority::P1),
            "P2" => Ok(Priority::P2),
            "P3" => Ok(Priority::P3),
            "P4" => Ok(Priority::P4),
            "P5" => Ok(Priority::P5),
            _ => Err(Error::ConfigurationMissing(format!("priority {s}"))),
        }
    }
}

impl std::str::FromStr for Rating {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Rating::Low),
            "medium" => Ok(Rating::Medium),
            "high" => Ok(Rating::High),
            _ => Err(Error::DeserializationError(format!("invalid rating: {s}"))),
        }
    }
}

/// Respond/resolve targets for a priority.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriorityPolicy {
    /// Priority code
    pub priority: Priority,
    /// Hours until first response is due
    pub respond_hours: f64,
    /// Hours until resolution is due
    pub resolve_hours: f64,
    /// Wall-clock deadlines, ignoring the business calendar
    #[serde(default)]
    pub always_on: bool,
}

impl PriorityPolicy {
    /// Create a business-hours policy.
    pub fn new(priority: Priority, respond_hours: f64, resolve_hours: f64) -> Self {
        Self {
            priority,
            respond_hours,
            resolve_hours,
            always_on: false,
        }
    }

    /// Mark the policy as always-on (24/7).
    pub fn always_on(mut self) -> Self {
        self.always_on = true;
        self
    }

    /// Check that both durations are non-negative and representable.
    pub fn validate(&self) -> Result<()> {
        for (label, hours) in [("respond", self.respond_hours), ("resolve", self.resolve_hours)] {
            if hours < 0.0 || hours_to_duration(hours).is_none() {
                return Err(Error::InvalidDuration(format!(
                    "{} {label} hours must be a non-negative number in range, got {hours}",
                    self.priority
                )));
            }
        }
        Ok(())
    }
}

/// Read-only priority-to-duration table.
#[derive(Clone, Debug, Default)]
pub struct PolicyTable {
    policies: HashMap<Priority, PriorityPolicy>,
}

impl PolicyTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock table: P1/P2 around the clock, P3-P5 in business hours.
    pub fn standard() -> Self {
        let mut table = Self::new();
        for policy in Self::standard_policies() {
            table.policies.insert(policy.priority, policy);
        }
        table
    }

    /// The stock policies as a list.
    pub fn standard_policies() -> Vec<PriorityPolicy> {
        vec![
            PriorityPolicy::new(Priority::P1, 0.5, 2.0).always_on(),
            PriorityPolicy::new(Priority::P2, 2.0, 4.0).always_on(),
            PriorityPolicy::new(Priority::P3, 4.0, 16.0),
            PriorityPolicy::new(Priority::P4, 16.0, 32.0),
            PriorityPolicy::new(Priority::P5, 32.0, 48.0),
        ]
    }

    /// Add or replace a policy.
    pub fn insert(&mut self, policy: PriorityPolicy) -> Result<()> {
        policy.validate()?;
        self.policies.insert(policy.priority, policy);
        Ok(())
    }

    /// Get the policy for a priority.
    pub fn get(&self, priority: Priority) -> Result<&PriorityPolicy> {
        self.policies
            .get(&priority)
            .ok_or_else(|| Error::ConfigurationMissing(format!("priority policy {priority}")))
    }

    /// Look up a policy by its code string.
    pub fn get_by_code(&self, code: &str) -> Result<&PriorityPolicy> {
        self.get(code.parse()?)
    }

    /// Number of policies.
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}
