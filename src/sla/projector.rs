//! Deadline projection: "add N business hours".

use crate::calendar::{BusinessCalendar, HolidayCalendar};
use crate::core::{hours_to_duration, Error, Result, Timestamp};
use crate::sla::policy::PriorityPolicy;
use chrono::Duration;

/// Default scan limit for a single projection.
pub const DEFAULT_MAX_PROJECTION_DAYS: u32 = 730;

/// Projects instants forward through a calendar's open windows.
///
/// Cost is linear in the number of calendar days crossed.
pub struct BusinessTimeProjector<'a> {
    calendar: &'a BusinessCalendar,
    holidays: &'a dyn HolidayCalendar,
    max_days: u32,
}

impl<'a> BusinessTimeProjector<'a> {
    /// Create a projector over a calendar.
    pub fn new(calendar: &'a BusinessCalendar, holidays: &'a dyn HolidayCalendar) -> Self {
        Self {
            calendar,
            holidays,
            max_days: DEFAULT_MAX_PROJECTION_DAYS,
        }
    }

    /// Set the maximum number of calendar days a projection may scan.
    pub fn with_max_days(mut self, max_days: u32) -> Self {
        self.max_days = max_days;
        self
    }

    /// Calendar the projector walks.
    pub fn calendar(&self) -> &BusinessCalendar {
        self.calendar
    }

    /// The instant reached after `hours` of business time from `start`.
    ///
    /// With `always_on` the calendar is ignored and the result is plain
    /// wall-clock addition. A start outside business hours first snaps to the
    /// next window opening without consuming budget, so `hours = 0` may still
    /// move `start` forward.
    pub fn project(&self, start: Timestamp, hours: f64, always_on: bool) -> Result<Timestamp> {
        let budget = budget(hours)?;
        if always_on {
            return start.checked_add_signed(budget).ok_or_else(|| {
                Error::InvalidDuration(format!("{hours} hours from {start} is out of range"))
            });
        }
        self.project_duration(start, budget)
    }

    /// Project a business-time duration from `start`.
    pub fn project_duration(&self, start: Timestamp, budget: Duration) -> Result<Timestamp> {
        let mut remaining = budget;
        for span in self.calendar.walk(start, self.holidays, self.max_days) {
            let span = span?;
            let available = span.duration();
            if remaining <= available {
                return Ok(span.start + remaining);
            }
            remaining = remaining - available;
        }
        // The walk only ends without a window once the date range runs out.
        Err(Error::CalendarExhausted {
            calendar_id: self.calendar.id,
            days: self.max_days,
        })
    }

    /// Snap an instant to the next open instant (identity inside a window).
    pub fn snap(&self, start: Timestamp) -> Result<Timestamp> {
        self.project_duration(start, Duration::zero())
    }

    /// Respond-by and resolve-by deadlines for a policy from `start`.
    pub fn deadlines(
        &self,
        start: Timestamp,
        policy: &PriorityPolicy,
    ) -> Result<(Timestamp, Timestamp)> {
        let respond_by = self.project(start, policy.respond_hours, policy.always_on)?;
        let resolve_by = self.project(start, policy.resolve_hours, policy.always_on)?;
        Ok((respond_by, resolve_by))
    }
}

fn budget(hours: f64) -> Result<Duration> {
    if hours < 0.0 {
        return Err(Error::InvalidDuration(format!(
            "business hours must be a non-negative number, got {hours}"
        )));
    }
    hours_to_duration(hours).ok_or_else(|| {
        Error::InvalidDuration(format!("business hours out of range, got {hours}"))
    })
}
