//! Public holiday lookup.
//!
//! Rule-based holiday sets per country and subdivision. Each year's set is
//! computed once and cached for the lifetime of the provider.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, warn};

/// Source of non-business dates for a jurisdiction.
pub trait HolidayCalendar: Send + Sync {
    /// Whether `date` is a public holiday in the given country/subdivision.
    ///
    /// Unknown jurisdictions observe no holidays.
    fn is_holiday(&self, date: NaiveDate, country_code: &str, subdivision: Option<&str>) -> bool;
}

/// A holiday calendar that observes nothing. Useful for calendars with no
/// jurisdiction and in tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoHolidays;

impl HolidayCalendar for NoHolidays {
    fn is_holiday(&self, _: NaiveDate, _: &str, _: Option<&str>) -> bool {
        false
    }
}

/// A named public holiday.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    /// Observed date
    pub date: NaiveDate,
    /// Display name
    pub name: String,
}

type JurisdictionKey = (String, Option<String>);

/// Built-in rule set for AU (national, QLD, NSW, VIC), GB (England) and US
/// (federal) holidays.
pub struct BuiltinHolidays {
    /// Computed sets keyed by jurisdiction and year
    cache: RwLock<HashMap<(JurisdictionKey, i32), Arc<HashSet<NaiveDate>>>>,
    /// Jurisdictions already reported as unknown
    warned: Mutex<HashSet<JurisdictionKey>>,
}

enum Lookup {
    Known(Vec<Holiday>),
    UnknownSubdivision(Vec<Holiday>),
    UnknownCountry,
}

impl BuiltinHolidays {
    /// Create a new provider with an empty cache.
    pub fn new() -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            warned: Mutex::new(HashSet::new()),
        }
    }

    /// Whether the country has a built-in rule set.
    pub fn supports(country_code: &str) -> bool {
        matches!(country_code.to_ascii_uppercase().as_str(), "AU" | "GB" | "UK" | "US")
    }

    /// List the named holidays of a year, sorted by date.
    pub fn holidays_in(
        &self,
        year: i32,
        country_code: &str,
        subdivision: Option<&str>,
    ) -> Vec<Holiday> {
        let key = jurisdiction_key(country_code, subdivision);
        match compute(year, &key) {
            Lookup::Known(days) => days,
            Lookup::UnknownSubdivision(days) => {
                self.warn_once(&key);
                days
            }
            Lookup::UnknownCountry => {
                self.warn_once(&key);
                Vec::new()
            }
        }
    }

    fn dates_for(&self, year: i32, key: &JurisdictionKey) -> Arc<HashSet<NaiveDate>> {
        let cache_key = (key.clone(), year);
        {
            let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(dates) = cache.get(&cache_key) {
                return Arc::clone(dates);
            }
        }

        let holidays = match compute(year, key) {
            Lookup::Known(days) => days,
            Lookup::UnknownSubdivision(days) => {
                self.warn_once(key);
                days
            }
            Lookup::UnknownCountry => {
                self.warn_once(key);
                Vec::new()
            }
        };
        debug!(
            country = %key.0,
            subdivision = ?key.1,
            year,
            count = holidays.len(),
            "Loaded holiday set"
        );

        let dates: Arc<HashSet<NaiveDate>> =
            Arc::new(holidays.into_iter().map(|h| h.date).collect());
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        Arc::clone(cache.entry(cache_key).or_insert(dates))
    }

    fn warn_once(&self, key: &JurisdictionKey) {
        let mut warned = self.warned.lock().unwrap_or_else(|e| e.into_inner());
        if warned.insert(key.clone()) {
            warn!(
                country = %key.0,
                subdivision = ?key.1,
                "Unknown holiday jurisdiction; observing national or no holidays"
            );
        }
    }
}

impl Default for BuiltinHolidays {
    fn default() -> Self {
        Self::new()
    }
}

impl HolidayCalendar for BuiltinHolidays {
    fn is_holiday(&self, date: NaiveDate, country_code: &str, subdivision: Option<&str>) -> bool {
        let key = jurisdiction_key(country_code, subdivision);
        self.dates_for(date.year(), &key).contains(&date)
    }
}

fn jurisdiction_key(country_code: &str, subdivision: Option<&str>) -> JurisdictionKey {
    (
        country_code.trim().to_ascii_uppercase(),
        subdivision
            .map(|s| s.trim().to_ascii_uppercase())
            .filter(|s| !s.is_empty()),
    )
}

fn compute(year: i32, key: &JurisdictionKey) -> Lookup {
    let subdivision = key.1.as_deref();
    let (mut days, subdivision_known) = match key.0.as_str() {
        "AU" => australia(year, subdivision),
        "GB" | "UK" => england(year, subdivision),
        "US" => united_states(year, subdivision),
        _ => return Lookup::UnknownCountry,
    };

    // Observed substitutes may spill across the year boundary.
    days.retain(|h| h.date.year() == year);
    days.sort_by_key(|h| h.date);

    if subdivision_known {
        Lookup::Known(days)
    } else {
        Lookup::UnknownSubdivision(days)
    }
}

struct HolidayList(Vec<Holiday>);

impl HolidayList {
    fn new() -> Self {
        Self(Vec::new())
    }

    fn add(&mut self, name: &str, date: Option<NaiveDate>) {
        if let Some(date) = date {
            self.0.push(Holiday {
                date,
                name: name.to_string(),
            });
        }
    }

    /// Add a fixed-date holiday, plus a Monday substitute when it falls on a
    /// weekend.
    fn add_with_monday_substitute(&mut self, name: &str, date: Option<NaiveDate>) {
        self.add(name, date);
        if let Some(date) = date {
            let shift = match date.weekday() {
                Weekday::Sat => 2,
                Weekday::Sun => 1,
                _ => return,
            };
            self.add(&format!("{name} (observed)"), Some(date + Duration::days(shift)));
        }
    }

    /// Christmas and Boxing Day with the Commonwealth substitution rule:
    /// weekend days roll to the next free weekday.
    fn add_christmas_and_boxing_day(&mut self, year: i32) {
        let christmas = NaiveDate::from_ymd_opt(year, 12, 25);
        let boxing = NaiveDate::from_ymd_opt(year, 12, 26);
        self.add("Christmas Day", christmas);
        self.add("Boxing Day", boxing);

        let Some(christmas) = christmas else { return };
        match christmas.weekday() {
            Weekday::Fri => {
                self.add("Boxing Day (observed)", Some(christmas + Duration::days(3)));
            }
            Weekday::Sat => {
                self.add("Christmas Day (observed)", Some(christmas + Duration::days(2)));
                self.add("Boxing Day (observed)", Some(christmas + Duration::days(3)));
            }
            Weekday::Sun => {
                self.add("Christmas Day (observed)", Some(christmas + Duration::days(2)));
            }
            _ => {}
        }
    }

    fn into_inner(self) -> Vec<Holiday> {
        self.0
    }
}

fn australia(year: i32, subdivision: Option<&str>) -> (Vec<Holiday>, bool) {
    let easter = easter_sunday(year);
    let mut days = HolidayList::new();

    days.add_with_monday_substitute("New Year's Day", NaiveDate::from_ymd_opt(year, 1, 1));
    days.add_with_monday_substitute("Australia Day", NaiveDate::from_ymd_opt(year, 1, 26));
    days.add("Good Friday", easter.map(|e| e - Duration::days(2)));
    days.add("Easter Monday", easter.map(|e| e + Duration::days(1)));
    days.add("ANZAC Day", NaiveDate::from_ymd_opt(year, 4, 25));
    days.add_christmas_and_boxing_day(year);

    let known = match subdivision {
        None => true,
        Some("QLD") => {
            days.add("Easter Saturday", easter.map(|e| e - Duration::days(1)));
            days.add("Easter Sunday", easter);
            days.add("Labour Day", nth_weekday(year, 5, Weekday::Mon, 1));
            days.add("Sovereign's Birthday", nth_weekday(year, 10, Weekday::Mon, 1));
            true
        }
        Some("NSW") => {
            days.add("Easter Saturday", easter.map(|e| e - Duration::days(1)));
            days.add("Easter Sunday", easter);
            days.add("Sovereign's Birthday", nth_weekday(year, 6, Weekday::Mon, 2));
            days.add("Labour Day", nth_weekday(year, 10, Weekday::Mon, 1));
            true
        }
        Some("VIC") => {
            days.add("Labour Day", nth_weekday(year, 3, Weekday::Mon, 2));
            days.add("Easter Saturday", easter.map(|e| e - Duration::days(1)));
            days.add("Easter Sunday", easter);
            days.add("Sovereign's Birthday", nth_weekday(year, 6, Weekday::Mon, 2));
            days.add("Melbourne Cup Day", nth_weekday(year, 11, Weekday::Tue, 1));
            true
        }
        Some(_) => false,
    };

    (days.into_inner(), known)
}

fn england(year: i32, subdivision: Option<&str>) -> (Vec<Holiday>, bool) {
    let easter = easter_sunday(year);
    let mut days = HolidayList::new();

    days.add_with_monday_substitute("New Year's Day", NaiveDate::from_ymd_opt(year, 1, 1));
    days.add("Good Friday", easter.map(|e| e - Duration::days(2)));
    days.add("Easter Monday", easter.map(|e| e + Duration::days(1)));
    days.add("Early May Bank Holiday", nth_weekday(year, 5, Weekday::Mon, 1));
    days.add("Spring Bank Holiday", last_weekday(year, 5, Weekday::Mon));
    days.add("Summer Bank Holiday", last_weekday(year, 8, Weekday::Mon));
    days.add_christmas_and_boxing_day(year);

    (days.into_inner(), matches!(subdivision, None | Some("ENG")))
}

fn united_states(year: i32, subdivision: Option<&str>) -> (Vec<Holiday>, bool) {
    let mut days = HolidayList::new();

    let mut fixed = |name: &str, month: u32, day: u32| {
        let date = NaiveDate::from_ymd_opt(year, month, day);
        days.add(name, date);
        if let Some(observed) = date.and_then(us_observed) {
            days.add(&format!("{name} (observed)"), Some(observed));
        }
    };
    fixed("New Year's Day", 1, 1);
    if year >= 2021 {
        fixed("Juneteenth National Independence Day", 6, 19);
    }
    fixed("Independence Day", 7, 4);
    fixed("Veterans Day", 11, 11);
    fixed("Christmas Day", 12, 25);

    // A Saturday New Year's Day is observed on the last day of this year.
    if let Some(observed) = NaiveDate::from_ymd_opt(year + 1, 1, 1).and_then(us_observed) {
        days.add("New Year's Day (observed)", Some(observed));
    }

    days.add("Martin Luther King Jr. Day", nth_weekday(year, 1, Weekday::Mon, 3));
    days.add("Washington's Birthday", nth_weekday(year, 2, Weekday::Mon, 3));
    days.add("Memorial Day", last_weekday(year, 5, Weekday::Mon));
    days.add("Labor Day", nth_weekday(year, 9, Weekday::Mon, 1));
    days.add("Columbus Day", nth_weekday(year, 10, Weekday::Mon, 2));
    days.add("Thanksgiving", nth_weekday(year, 11, Weekday::Thu, 4));

    // Federal set only; state holidays are not modelled.
    (days.into_inner(), subdivision.is_none())
}

/// US federal observance: Saturday moves to Friday, Sunday to Monday.
fn us_observed(date: NaiveDate) -> Option<NaiveDate> {
    match date.weekday() {
        Weekday::Sat => Some(date - Duration::days(1)),
        Weekday::Sun => Some(date + Duration::days(1)),
        _ => None,
    }
}

/// Gregorian Easter Sunday (anonymous Gregorian algorithm).
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u8) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, n)
}

fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let mut day = NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()?;
    while day.weekday() != weekday {
        day = day.pred_opt()?;
    }
    Some(day)
}
