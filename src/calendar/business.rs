//! Business calendars.
//!
//! A named operating-hours policy: timezone, open windows per weekday,
//! holiday jurisdiction and site closures. Saturday and Sunday are never
//! business days.

use crate::calendar::holiday::HolidayCalendar;
use crate::calendar::walk::{Span, WindowWalk};
use crate::core::{CalendarId, Error, Result, Timestamp};
use chrono::{
    Datelike, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc, Weekday,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// A contiguous open period within a business day.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenWindow {
    /// Local opening time
    pub open: NaiveTime,
    /// Local closing time
    pub close: NaiveTime,
}

impl OpenWindow {
    /// Create a window from hour/minute pairs.
    pub fn hm(open: (u32, u32), close: (u32, u32)) -> Option<Self> {
        Some(Self {
            open: NaiveTime::from_hms_opt(open.0, open.1, 0)?,
            close: NaiveTime::from_hms_opt(close.0, close.1, 0)?,
        })
    }

    /// Length of the window.
    pub fn length(&self) -> chrono::Duration {
        self.close - self.open
    }
}

/// A site-specific closure observed on top of public holidays.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteClosure {
    /// Closure name
    pub name: String,
    /// Date (YYYY-MM-DD)
    pub date: NaiveDate,
    /// Repeats every year on the same month and day
    #[serde(default)]
    pub recurring: bool,
}

impl SiteClosure {
    /// Whether the closure applies to `date`.
    pub fn applies_to(&self, date: NaiveDate) -> bool {
        if self.recurring {
            self.date.month() == date.month() && self.date.day() == date.day()
        } else {
            self.date == date
        }
    }
}

/// An operating-hours policy for a location.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BusinessCalendar {
    /// Calendar ID
    pub id: CalendarId,
    /// Location name
    pub name: String,
    /// IANA timezone the windows are expressed in
    pub timezone: Tz,
    /// ISO 3166 country code for holiday lookup
    pub country_code: String,
    /// State/province for regional holidays
    #[serde(default)]
    pub subdivision: Option<String>,
    /// Open windows, sorted and non-overlapping
    pub windows: Vec<OpenWindow>,
    /// Additional closures
    #[serde(default)]
    pub closures: Vec<SiteClosure>,
}

impl BusinessCalendar {
    /// Create a calendar with no open windows.
    pub fn new(id: CalendarId, name: &str, timezone: Tz, country_code: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            timezone,
            country_code: country_code.to_string(),
            subdivision: None,
            windows: Vec::new(),
            closures: Vec::new(),
        }
    }

    /// Set the holiday subdivision.
    pub fn with_subdivision(mut self, subdivision: &str) -> Self {
        self.subdivision = Some(subdivision.to_string());
        self
    }

    /// Add an open window.
    pub fn with_window(mut self, window: OpenWindow) -> Self {
        self.windows.push(window);
        self
    }

    /// Add a site closure.
    pub fn with_closure(mut self, closure: SiteClosure) -> Self {
        self.closures.push(closure);
        self
    }

    /// Check the window invariants: each window opens before it closes, and
    /// windows are sorted without overlap.
    pub fn validate(&self) -> Result<()> {
        if self.country_code.trim().is_empty() {
            return Err(Error::InvalidCalendar(format!(
                "calendar {} has no country code",
                self.id
            )));
        }
        for window in &self.windows {
            if window.open >= window.close {
                return Err(Error::InvalidCalendar(format!(
                    "calendar {}: window {}-{} does not open before it closes",
                    self.id, window.open, window.close
                )));
            }
        }
        for pair in self.windows.windows(2) {
            if pair[0].close > pair[1].open {
                return Err(Error::InvalidCalendar(format!(
                    "calendar {}: window {}-{} overlaps or precedes {}-{}",
                    self.id, pair[1].open, pair[1].close, pair[0].open, pair[0].close
                )));
            }
        }
        Ok(())
    }

    /// Total open time on a full business day.
    pub fn daily_open_time(&self) -> chrono::Duration {
        self.windows
            .iter()
            .fold(chrono::Duration::zero(), |acc, w| acc + w.length())
    }

    /// The calendar-local date of an instant.
    pub fn local_date(&self, instant: Timestamp) -> NaiveDate {
        instant.with_timezone(&self.timezone).date_naive()
    }

    /// Whether `date` is a business day (weekday, not a holiday or closure).
    pub fn is_business_day(&self, date: NaiveDate, holidays: &dyn HolidayCalendar) -> bool {
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }
        if self.closures.iter().any(|c| c.applies_to(date)) {
            return false;
        }
        !holidays.is_holiday(date, &self.country_code, self.subdivision.as_deref())
    }

    /// Open windows on a local date as UTC spans. Empty on non-business days.
    pub fn windows_on(&self, date: NaiveDate, holidays: &dyn HolidayCalendar) -> Vec<Span> {
        if !self.is_business_day(date, holidays) {
            return Vec::new();
        }
        self.windows
            .iter()
            .map(|w| Span {
                start: self.local_instant(date.and_time(w.open)),
                end: self.local_instant(date.and_time(w.close)),
            })
            .filter(|span| span.start < span.end)
            .collect()
    }

    /// Whether an instant falls inside an open window.
    pub fn is_open_at(&self, instant: Timestamp, holidays: &dyn HolidayCalendar) -> bool {
        self.windows_on(self.local_date(instant), holidays)
            .iter()
            .any(|span| span.contains(instant))
    }

    /// Walk open windows forward from `from`, scanning at most `max_days`
    /// calendar days.
    pub fn walk<'a>(
        &'a self,
        from: Timestamp,
        holidays: &'a dyn HolidayCalendar,
        max_days: u32,
    ) -> WindowWalk<'a> {
        WindowWalk::new(self, holidays, from, max_days)
    }

    /// Resolve a local wall-clock time to a UTC instant.
    ///
    /// Ambiguous times (DST fall-back) take the earlier instant. Times in a
    /// DST gap use the offset in force before the gap.
    fn local_instant(&self, naive: NaiveDateTime) -> Timestamp {
        match self.timezone.from_local_datetime(&naive) {
            LocalResult::Single(t) => t.with_timezone(&Utc),
            LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
            LocalResult::None => {
                let before = naive - chrono::Duration::days(1);
                let offset = self.timezone.offset_from_utc_datetime(&before).fix();
                let utc = naive - chrono::Duration::seconds(i64::from(offset.local_minus_utc()));
                Utc.from_utc_datetime(&utc)
            }
        }
    }
}
