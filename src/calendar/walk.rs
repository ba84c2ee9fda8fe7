//! Window-by-window traversal of business time.

use crate::calendar::business::BusinessCalendar;
use crate::calendar::holiday::HolidayCalendar;
use crate::core::{Error, Result, Timestamp};
use chrono::NaiveDate;
use std::collections::VecDeque;

/// A half-open span of instants `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    /// First instant of the span
    pub start: Timestamp,
    /// First instant after the span
    pub end: Timestamp,
}

impl Span {
    /// Length of the span.
    pub fn duration(&self) -> chrono::Duration {
        self.end - self.start
    }

    /// Whether the span contains an instant.
    pub fn contains(&self, instant: Timestamp) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// Iterator over successive open windows at or after a starting instant.
///
/// The first window is clipped to start at the starting instant. Yields
/// `Error::CalendarExhausted` once `max_days` calendar days have been scanned
/// without the caller stopping, then ends.
pub struct WindowWalk<'a> {
    calendar: &'a BusinessCalendar,
    holidays: &'a dyn HolidayCalendar,
    cursor: Timestamp,
    next_date: Option<NaiveDate>,
    pending: VecDeque<Span>,
    days_scanned: u32,
    max_days: u32,
    done: bool,
}

impl<'a> WindowWalk<'a> {
    pub(crate) fn new(
        calendar: &'a BusinessCalendar,
        holidays: &'a dyn HolidayCalendar,
        from: Timestamp,
        max_days: u32,
    ) -> Self {
        Self {
            calendar,
            holidays,
            cursor: from,
            next_date: Some(calendar.local_date(from)),
            pending: VecDeque::new(),
            days_scanned: 0,
            max_days,
            done: false,
        }
    }

    /// Calendar days examined so far.
    pub fn days_scanned(&self) -> u32 {
        self.days_scanned
    }
}

impl Iterator for WindowWalk<'_> {
    type Item = Result<Span>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            while let Some(span) = self.pending.pop_front() {
                if span.end <= self.cursor {
                    continue;
                }
                let start = span.start.max(self.cursor);
                self.cursor = span.end;
                return Some(Ok(Span {
                    start,
                    end: span.end,
                }));
            }

            if self.done {
                return None;
            }
            let Some(date) = self.next_date else {
                self.done = true;
                return None;
            };
            if self.days_scanned >= self.max_days {
                self.done = true;
                return Some(Err(Error::CalendarExhausted {
                    calendar_id: self.calendar.id,
                    days: self.max_days,
                }));
            }

            self.pending
                .extend(self.calendar.windows_on(date, self.holidays));
            self.days_scanned += 1;
            self.next_date = date.succ_opt();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::business::OpenWindow;
    use crate::calendar::holiday::NoHolidays;
    use chrono::{TimeZone, Utc};
    use chrono_tz::Australia::Brisbane;

    fn brisbane(y: i32, m: u32, d: u32, h: u32, min: u32) -> Timestamp {
        Brisbane
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn split_shift() -> BusinessCalendar {
        BusinessCalendar::new(1, "Split", Brisbane, "AU")
            .with_window(OpenWindow::hm((8, 0), (12, 0)).unwrap())
            .with_window(OpenWindow::hm((13, 0), (17, 0)).unwrap())
    }

    #[test]
    fn test_walk_clips_first_window() {
        let cal = split_shift();
        // Wednesday 10:30
        let mut walk = cal.walk(brisbane(2024, 6, 12, 10, 30), &NoHolidays, 10);
        let first = walk.next().unwrap().unwrap();
        assert_eq!(first.start, brisbane(2024, 6, 12, 10, 30));
        assert_eq!(first.end, brisbane(2024, 6, 12, 12, 0));
        let second = walk.next().unwrap().unwrap();
        assert_eq!(second.start, brisbane(2024, 6, 12, 13, 0));
    }

    #[test]
    fn test_walk_skips_weekend() {
        let cal = split_shift();
        // Friday 17:00 -> next window is Monday 08:00
        let mut walk = cal.walk(brisbane(2024, 6, 14, 17, 0), &NoHolidays, 10);
        let next = walk.next().unwrap().unwrap();
        assert_eq!(next.start, brisbane(2024, 6, 17, 8, 0));
    }

    #[test]
    fn test_walk_exhausts_empty_calendar() {
        let cal = BusinessCalendar::new(9, "Closed", Brisbane, "AU");
        let mut walk = cal.walk(brisbane(2024, 6, 12, 9, 0), &NoHolidays, 5);
        match walk.next() {
            Some(Err(Error::CalendarExhausted { calendar_id, days })) => {
                assert_eq!(calendar_id, 9);
                assert_eq!(days, 5);
            }
            other => panic!("expected exhaustion, got {:?}", other),
        }
        assert!(walk.next().is_none());
        assert_eq!(walk.days_scanned(), 5);
    }

    #[test]
    fn test_span_contains() {
        let span = Span {
            start: brisbane(2024, 6, 12, 9, 0),
            end: brisbane(2024, 6, 12, 17, 0),
        };
        assert!(span.contains(brisbane(2024, 6, 12, 9, 0)));
        assert!(!span.contains(brisbane(2024, 6, 12, 17, 0)));
        assert_eq!(span.duration(), chrono::Duration::hours(8));
    }
}
