//! Calendar lookup by location.

use crate::calendar::business::BusinessCalendar;
use crate::core::{CalendarId, Error, LocationId, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Calendar ID applied when a location has no calendar assigned.
pub const DEFAULT_CALENDAR_ID: CalendarId = 1;

/// Registry of business calendars and location assignments.
#[derive(Clone, Debug)]
pub struct CalendarRegistry {
    /// Calendars by ID
    calendars: HashMap<CalendarId, Arc<BusinessCalendar>>,
    /// Location -> calendar assignments
    locations: HashMap<LocationId, CalendarId>,
    /// Fallback calendar
    default_id: CalendarId,
}

impl CalendarRegistry {
    /// Create an empty registry with the given default calendar ID.
    pub fn new(default_id: CalendarId) -> Self {
        Self {
            calendars: HashMap::new(),
            locations: HashMap::new(),
            default_id,
        }
    }

    /// Register a calendar after validating it.
    pub fn register(&mut self, calendar: BusinessCalendar) -> Result<()> {
        calendar.validate()?;
        if calendar.windows.is_empty() {
            warn!(
                calendar_id = calendar.id,
                name = %calendar.name,
                "Calendar has no open windows; business-time projections will exhaust"
            );
        }
        debug!(calendar_id = calendar.id, timezone = %calendar.timezone, "Registered calendar");
        self.calendars.insert(calendar.id, Arc::new(calendar));
        Ok(())
    }

    /// Assign a calendar to a location.
    pub fn assign(&mut self, location_id: LocationId, calendar_id: CalendarId) -> Result<()> {
        if !self.calendars.contains_key(&calendar_id) {
            return Err(Error::ConfigurationMissing(format!(
                "calendar {calendar_id} for location {location_id}"
            )));
        }
        self.locations.insert(location_id, calendar_id);
        Ok(())
    }

    /// Get a calendar by ID.
    pub fn get(&self, calendar_id: CalendarId) -> Result<Arc<BusinessCalendar>> {
        self.calendars
            .get(&calendar_id)
            .cloned()
            .ok_or_else(|| Error::ConfigurationMissing(format!("business calendar {calendar_id}")))
    }

    /// Resolve the calendar for a location, falling back to the default.
    pub fn for_location(&self, location_id: Option<LocationId>) -> Result<Arc<BusinessCalendar>> {
        let calendar_id = location_id
            .and_then(|id| self.locations.get(&id).copied())
            .unwrap_or(self.default_id);
        self.get(calendar_id)
    }

    /// The default calendar.
    pub fn default_calendar(&self) -> Result<Arc<BusinessCalendar>> {
        self.get(self.default_id)
    }

    /// Number of registered calendars.
    pub fn len(&self) -> usize {
        self.calendars.len()
    }

    /// Whether no calendars are registered.
    pub fn is_empty(&self) -> bool {
        self.calendars.is_empty()
    }
}

impl Default for CalendarRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_CALENDAR_ID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::business::OpenWindow;
    use chrono_tz::{Australia::Brisbane, Europe::London};

    fn registry() -> CalendarRegistry {
        let mut registry = CalendarRegistry::default();
        registry
            .register(
                BusinessCalendar::new(1, "HQ", Brisbane, "AU")
                    .with_window(OpenWindow::hm((8, 0), (17, 0)).unwrap()),
            )
            .unwrap();
        registry
            .register(
                BusinessCalendar::new(2, "London", London, "GB")
                    .with_window(OpenWindow::hm((9, 0), (17, 30)).unwrap()),
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_location_falls_back_to_default() {
        let registry = registry();
        assert_eq!(registry.for_location(None).unwrap().id, 1);
        assert_eq!(registry.for_location(Some(77)).unwrap().id, 1);
    }

    #[test]
    fn test_location_assignment() {
        let mut registry = registry();
        registry.assign(10, 2).unwrap();
        assert_eq!(registry.for_location(Some(10)).unwrap().name, "London");
    }

    #[test]
    fn test_assign_unknown_calendar() {
        let mut registry = registry();
        assert!(matches!(
            registry.assign(10, 99),
            Err(Error::ConfigurationMissing(_))
        ));
    }

    #[test]
    fn test_missing_default() {
        let registry = CalendarRegistry::default();
        assert!(registry.is_empty());
        assert!(matches!(
            registry.for_location(None),
            Err(Error::ConfigurationMissing(_))
        ));
    }

    #[test]
    fn test_register_rejects_invalid() {
        let mut registry = CalendarRegistry::default();
        let bad = BusinessCalendar::new(1, "Bad", Brisbane, "AU")
            .with_window(OpenWindow::hm((12, 0), (9, 0)).unwrap());
        assert!(registry.register(bad).is_err());
        assert_eq!(registry.len(), 0);
    }
}
