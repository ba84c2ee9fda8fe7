//! Monitoring Module
//!
//! Provides observability for the SLA engine:
//! - Structured logging via `tracing`

pub mod logging;

pub use logging::{init_tracing, LogFormat, LogLevel, LoggerConfig};
