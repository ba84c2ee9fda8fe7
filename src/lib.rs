//! # slaclock - SLA deadlines over business hours
//!
//! Computes and tracks service-level deadlines for support tickets:
//! - **Calendar**: per-site business windows, time zones and public holidays
//! - **SLA**: deadline projection, business-time measurement and the
//!   pausable per-ticket clock with breach detection
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use slaclock::core::TicketId;
//! use slaclock::sla::{Priority, SlaClockService, SlaConfig};
//!
//! #[tokio::main]
//! async fn main() -> slaclock::Result<()> {
//!     let service = SlaClockService::in_memory(SlaConfig::default())?;
//!     let clock = service
//!         .open_clock(TicketId::new("INC-1001"), Priority::P3, chrono::Utc::now(), None)
//!         .await?;
//!     println!("Respond by {}", clock.respond_by());
//!     Ok(())
//! }
//! ```

pub mod calendar;
pub mod core;
pub mod monitoring;
pub mod sla;

pub use core::error::{Error, Result};
