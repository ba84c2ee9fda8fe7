//! Business Calendar Module
//!
//! Provides the operating-hours model SLA time accrues against:
//! - Public holiday lookup per country/subdivision
//! - Business calendars with split-shift open windows
//! - Window-by-window traversal of business time
//! - Calendar lookup by location

pub mod business;
pub mod holiday;
pub mod registry;
pub mod walk;

pub use business::{BusinessCalendar, OpenWindow, SiteClosure};
pub use holiday::{BuiltinHolidays, Holiday, HolidayCalendar, NoHolidays};
pub use registry::{CalendarRegistry, DEFAULT_CALENDAR_ID};
pub use walk::{Span, WindowWalk};
