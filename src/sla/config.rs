//! SLA engine configuration.
//!
//! Loaded from JSON; the default is the stock single-office installation.

use crate::calendar::{BusinessCalendar, CalendarRegistry, OpenWindow, DEFAULT_CALENDAR_ID};
use crate::core::{CalendarId, Error, LocationId, Result};
use crate::monitoring::logging::LoggerConfig;
use crate::sla::policy::{PolicyTable, PriorityPolicy};
use crate::sla::projector::DEFAULT_MAX_PROJECTION_DAYS;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Engine configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SlaConfig {
    /// Calendar used when a location has none assigned
    pub default_calendar_id: CalendarId,
    /// Calendar days a single projection may scan before giving up
    pub max_projection_days: u32,
    /// Optimistic retries per transition on version conflict
    pub max_transition_retries: u32,
    /// Tickets evaluated concurrently by the breach sweep
    pub sweep_concurrency: usize,
    /// Business calendars
    pub calendars: Vec<BusinessCalendar>,
    /// Location -> calendar assignments
    pub location_calendars: HashMap<LocationId, CalendarId>,
    /// Priority policies
    pub priorities: Vec<PriorityPolicy>,
    /// Logging
    pub logging: LoggerConfig,
}

impl SlaConfig {
    /// Parse a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::DeserializationError(e.to_string()))
    }

    /// Read a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The seeded head-office calendar: Brisbane, 08:00-17:00 weekdays,
    /// Queensland holidays.
    pub fn head_office() -> BusinessCalendar {
        let mut calendar =
            BusinessCalendar::new(DEFAULT_CALENDAR_ID, "HQ", Tz::Australia__Brisbane, "AU")
                .with_subdivision("QLD");
        if let Some(window) = OpenWindow::hm((8, 0), (17, 0)) {
            calendar = calendar.with_window(window);
        }
        calendar
    }

    /// Check calendars, policies and limits.
    pub fn validate(&self) -> Result<()> {
        self.registry()?;
        self.policy_table()?;
        if self.max_projection_days == 0 {
            return Err(Error::InvalidConfiguration(
                "max_projection_days must be at least 1".to_string(),
            ));
        }
        if self.sweep_concurrency == 0 {
            return Err(Error::InvalidConfiguration(
                "sweep_concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the calendar registry. The default calendar must be present.
    pub fn registry(&self) -> Result<CalendarRegistry> {
        let mut registry = CalendarRegistry::new(self.default_calendar_id);
        for calendar in &self.calendars {
            registry.register(calendar.clone())?;
        }
        registry.default_calendar()?;
        for (location, calendar) in &self.location_calendars {
            registry.assign(*location, *calendar)?;
        }
        Ok(registry)
    }

    /// Build the priority table.
    pub fn policy_table(&self) -> Result<PolicyTable> {
        let mut table = PolicyTable::new();
        for policy in &self.priorities {
            table.insert(policy.clone())?;
        }
        Ok(table)
    }
}

impl Default for SlaConfig {
    fn default() -> Self {
        Self {
            default_calendar_id: DEFAULT_CALENDAR_ID,
            max_projection_days: DEFAULT_MAX_PROJECTION_DAYS,
            max_transition_retries: 3,
            sweep_concurrency: 16,
            calendars: vec![Self::head_office()],
            location_calendars: HashMap::new(),
            priorities: PolicyTable::standard_policies(),
            logging: LoggerConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sla::policy::Priority;

    #[test]
    fn test_default_config() {
        let config = SlaConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_calendar_id, 1);
        assert_eq!(config.calendars[0].timezone, Tz::Australia__Brisbane);
        assert_eq!(config.priorities.len(), 5);
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "default_calendar_id": 7,
            "calendars": [{
                "id": 7,
                "name": "London",
                "timezone": "Europe/London",
                "country_code": "GB",
                "windows": [
                    {"open": "09:00:00", "close": "12:30:00"},
                    {"open": "13:30:00", "close": "17:30:00"}
                ]
            }],
            "priorities": [
                {"priority": "P1", "respond_hours": 0.25, "resolve_hours": 4, "always_on": true},
                {"priority": "P3", "respond_hours": 8, "resolve_hours": 24}
            ]
        }"#;
        let config = SlaConfig::from_json_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_transition_retries, 3);

        let registry = config.registry().unwrap();
        assert_eq!(registry.default_calendar().unwrap().windows.len(), 2);

        let table = config.policy_table().unwrap();
        assert!(table.get(Priority::P1).unwrap().always_on);
        assert!(table.get(Priority::P2).is_err());
    }

    #[test]
    fn test_unknown_timezone_rejected() {
        let json = r#"{"calendars": [{
            "id": 1, "name": "X", "timezone": "Mars/Olympus",
            "country_code": "AU", "windows": []
        }]}"#;
        assert!(matches!(
            SlaConfig::from_json_str(json),
            Err(Error::DeserializationError(_))
        ));
    }

    #[test]
    fn test_missing_default_calendar() {
        let config = SlaConfig {
            default_calendar_id: 42,
            ..SlaConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::ConfigurationMissing(_))
        ));
    }

    #[test]
    fn test_zero_limits_rejected() {
        let config = SlaConfig {
            sweep_concurrency: 0,
            ..SlaConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfiguration(_))
        ));

        let config = SlaConfig {
            max_projection_days: 0,
            ..SlaConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_location_assignment_must_exist() {
        let mut config = SlaConfig::default();
        config.location_calendars.insert(5, 99);
        assert!(config.registry().is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let config = SlaConfig::default();
        let json = config.to_json().unwrap();
        let back = SlaConfig::from_json_str(&json).unwrap();
        assert_eq!(back.calendars, config.calendars);
        assert_eq!(back.priorities, config.priorities);
    }

    #[test]
    fn test_from_missing_file() {
        assert!(matches!(
            SlaConfig::from_file("/nonexistent/sla.json"),
            Err(Error::Io(_))
        ));
    }
}
