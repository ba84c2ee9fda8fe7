//! SLA Module
//!
//! Provides the ticket SLA clock:
//! - Priority policies and deadline projection over business hours
//! - Business-time measurement between two instants
//! - The per-ticket clock state machine, its persistence and the breach sweep

pub mod clock;
pub mod config;
pub mod measurer;
pub mod policy;
pub mod projector;
pub mod report;
pub mod service;
pub mod store;

pub use clock::{BreachChange, ClockState, PauseEvent, SlaClock};
pub use config::SlaConfig;
pub use measurer::{BusinessDuration, BusinessTimeMeasurer, BUSINESS_DAY_MINUTES};
pub use policy::{PolicyTable, Priority, PriorityPolicy, Rating};
pub use projector::{BusinessTimeProjector, DEFAULT_MAX_PROJECTION_DAYS};
pub use report::{pause_history, OutageReport, PauseHistoryEntry, SlaStatus};
pub use service::{SlaClockService, SweepSummary};
pub use store::{ClockStore, InMemoryClockStore, VersionedClock};
