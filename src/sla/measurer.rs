//! Elapsed business time between two instants (outage reporting).

use crate::calendar::{BusinessCalendar, HolidayCalendar};
use crate::core::{Error, Result, Timestamp};
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Minutes in a reporting business day. Fixed regardless of the calendar's
/// actual window length.
pub const BUSINESS_DAY_MINUTES: f64 = 480.0;

/// Amount of business time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BusinessDuration {
    /// Business time in milliseconds
    millis: i64,
}

impl BusinessDuration {
    /// No business time.
    pub fn zero() -> Self {
        Self { millis: 0 }
    }

    /// Wrap a duration.
    pub fn from_duration(duration: Duration) -> Self {
        Self {
            millis: duration.num_milliseconds(),
        }
    }

    /// As a chrono duration.
    pub fn as_duration(&self) -> Duration {
        Duration::milliseconds(self.millis)
    }

    /// Whole minutes (truncated).
    pub fn minutes(&self) -> i64 {
        self.millis / 60_000
    }

    /// Exact minutes including the sub-minute remainder.
    pub fn minutes_f64(&self) -> f64 {
        self.millis as f64 / 60_000.0
    }

    /// Hours as whole minutes / 60.
    pub fn hours(&self) -> f64 {
        self.minutes() as f64 / 60.0
    }

    /// Business days as whole minutes / 480.
    pub fn days(&self) -> f64 {
        self.minutes() as f64 / BUSINESS_DAY_MINUTES
    }
}

/// Sums the overlap between an interval and a calendar's open windows.
pub struct BusinessTimeMeasurer<'a> {
    calendar: &'a BusinessCalendar,
    holidays: &'a dyn HolidayCalendar,
}

impl<'a> BusinessTimeMeasurer<'a> {
    /// Create a measurer over a calendar.
    pub fn new(calendar: &'a BusinessCalendar, holidays: &'a dyn HolidayCalendar) -> Self {
        Self { calendar, holidays }
    }

    /// Business time within `[start, end)`. Zero when `end <= start`.
    pub fn measure(&self, start: Timestamp, end: Timestamp) -> Result<BusinessDuration> {
        if end <= start {
            return Ok(BusinessDuration::zero());
        }

        // Scan every local day the interval touches, plus slack for the
        // timezone shift between the UTC span and local dates.
        let span_days = (end - start).num_days().max(0) as u64 + 2;
        let max_days = u32::try_from(span_days).unwrap_or(u32::MAX);

        let mut total = Duration::zero();
        for span in self.calendar.walk(start, self.holidays, max_days) {
            let span = match span {
                Ok(span) => span,
                Err(Error::CalendarExhausted { .. }) => break,
                Err(e) => return Err(e),
            };
            if span.start >= end {
                break;
            }
            total = total + (span.end.min(end) - span.start);
        }
        Ok(BusinessDuration::from_duration(total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{BuiltinHolidays, NoHolidays, OpenWindow};
    use crate::sla::projector::BusinessTimeProjector;
    use chrono::{TimeZone, Utc};
    use chrono_tz::Australia::Brisbane;

    fn brisbane(y: i32, m: u32, d: u32, h: u32, min: u32) -> Timestamp {
        Brisbane
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn nine_to_five() -> BusinessCalendar {
        BusinessCalendar::new(1, "HQ", Brisbane, "AU")
            .with_subdivision("QLD")
            .with_window(OpenWindow::hm((9, 0), (17, 0)).unwrap())
    }

    #[test]
    fn test_reversed_interval_is_zero() {
        let cal = nine_to_five();
        let measurer = BusinessTimeMeasurer::new(&cal, &NoHolidays);
        let t = brisbane(2024, 6, 12, 10, 0);
        assert_eq!(measurer.measure(t, t).unwrap(), BusinessDuration::zero());
        assert_eq!(
            measurer
                .measure(t, t - Duration::hours(3))
                .unwrap()
                .minutes(),
            0
        );
    }

    #[test]
    fn test_same_day_overlap() {
        let cal = nine_to_five();
        let measurer = BusinessTimeMeasurer::new(&cal, &NoHolidays);
        let elapsed = measurer
            .measure(brisbane(2024, 6, 12, 7, 0), brisbane(2024, 6, 12, 11, 30))
            .unwrap();
        assert_eq!(elapsed.minutes(), 150);
        assert_eq!(elapsed.hours(), 2.5);
    }

    #[test]
    fn test_outage_over_weekend() {
        let cal = nine_to_five();
        let measurer = BusinessTimeMeasurer::new(&cal, &NoHolidays);
        // Friday 16:00 to Monday 10:00: 1h + 1h
        let elapsed = measurer
            .measure(brisbane(2024, 6, 14, 16, 0), brisbane(2024, 6, 17, 10, 0))
            .unwrap();
        assert_eq!(elapsed.minutes(), 120);
    }

    #[test]
    fn test_days_use_eight_hour_convention() {
        let cal = BusinessCalendar::new(3, "Long", Brisbane, "AU")
            .with_window(OpenWindow::hm((7, 0), (19, 0)).unwrap());
        let measurer = BusinessTimeMeasurer::new(&cal, &NoHolidays);
        // One full 12h day is 1.5 reporting days.
        let elapsed = measurer
            .measure(brisbane(2024, 6, 12, 0, 0), brisbane(2024, 6, 13, 0, 0))
            .unwrap();
        assert_eq!(elapsed.minutes(), 720);
        assert_eq!(elapsed.days(), 1.5);
    }

    #[test]
    fn test_holiday_excluded() {
        let cal = nine_to_five();
        let holidays = BuiltinHolidays::new();
        let measurer = BusinessTimeMeasurer::new(&cal, &holidays);
        // Christmas week 2024: Wed 25 and Thu 26 are holidays.
        let elapsed = measurer
            .measure(brisbane(2024, 12, 24, 9, 0), brisbane(2024, 12, 28, 0, 0))
            .unwrap();
        assert_eq!(elapsed.minutes(), 2 * 480);
    }

    #[test]
    fn test_multi_month_span() {
        let cal = nine_to_five();
        let measurer = BusinessTimeMeasurer::new(&cal, &NoHolidays);
        // June 2024 has 20 weekdays.
        let elapsed = measurer
            .measure(brisbane(2024, 6, 1, 0, 0), brisbane(2024, 7, 1, 0, 0))
            .unwrap();
        assert_eq!(elapsed.minutes(), 20 * 480);
    }

    #[test]
    fn test_round_trip_with_projector() {
        let cal = nine_to_five();
        let holidays = BuiltinHolidays::new();
        let projector = BusinessTimeProjector::new(&cal, &holidays);
        let measurer = BusinessTimeMeasurer::new(&cal, &holidays);

        let starts = [
            brisbane(2024, 6, 14, 15, 0),
            brisbane(2024, 6, 15, 3, 0),
            brisbane(2024, 3, 28, 16, 40),
            brisbane(2024, 12, 23, 12, 5),
        ];
        for start in starts {
            for hours in [0.0, 0.5, 4.0, 16.0, 32.0, 48.0] {
                let end = projector.project(start, hours, false).unwrap();
                let elapsed = measurer.measure(start, end).unwrap();
                assert_eq!(elapsed.minutes_f64(), hours * 60.0, "start {start} hours {hours}");
            }
        }
    }

    #[test]
    fn test_empty_calendar_measures_zero() {
        let cal = BusinessCalendar::new(9, "Closed", Brisbane, "AU");
        let measurer = BusinessTimeMeasurer::new(&cal, &NoHolidays);
        let elapsed = measurer
            .measure(brisbane(2024, 6, 1, 0, 0), brisbane(2024, 6, 30, 0, 0))
            .unwrap();
        assert_eq!(elapsed, BusinessDuration::zero());
    }
}
