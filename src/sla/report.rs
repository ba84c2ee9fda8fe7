//! SLA reporting.
//!
//! Read-only views of a clock for display and audit: current status, pause
//! history and outage duration.

use crate::core::{CalendarId, Result, TicketId, Timestamp};
use crate::sla::clock::{ClockState, PauseEvent, SlaClock};
use crate::sla::measurer::BusinessDuration;
use crate::sla::policy::Priority;
use serde::{Deserialize, Serialize};

/// Snapshot of a ticket's SLA position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlaStatus {
    /// Ticket ID
    pub ticket_id: TicketId,
    /// Priority
    pub priority: Priority,
    /// First-response deadline
    pub respond_by: Timestamp,
    /// Resolution deadline
    pub resolve_by: Timestamp,
    /// First response recorded
    pub responded: bool,
    /// Response deadline breached
    pub response_breach: bool,
    /// Resolution recorded
    pub resolved: bool,
    /// Resolve deadline breached
    pub resolve_breach: bool,
    /// Clock paused
    pub paused: bool,
    /// Clock state
    pub state: ClockState,
}

impl From<&SlaClock> for SlaStatus {
    fn from(clock: &SlaClock) -> Self {
        Self {
            ticket_id: clock.ticket_id().clone(),
            priority: clock.priority(),
            respond_by: clock.respond_by(),
            resolve_by: clock.resolve_by(),
            responded: clock.responded(),
            response_breach: clock.response_breach(),
            resolved: clock.resolved(),
            resolve_breach: clock.resolve_breach(),
            paused: clock.is_paused(),
            state: clock.state(),
        }
    }
}

impl SlaStatus {
    /// Render as JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Render as text, deadlines formatted with `datetime_format`.
    pub fn to_text(&self, datetime_format: &str) -> String {
        let flag = |breached: bool| if breached { "BREACHED" } else { "ok" };
        let mut output = String::new();

        output.push_str(&format!("SLA Status: {} ({})\n", self.ticket_id, self.priority));
        output.push_str(&format!(
            "Respond by: {} [{}]{}\n",
            self.respond_by.format(datetime_format),
            flag(self.response_breach),
            if self.responded { " responded" } else { "" }
        ));
        output.push_str(&format!(
            "Resolve by: {} [{}]{}\n",
            self.resolve_by.format(datetime_format),
            flag(self.resolve_breach),
            if self.resolved { " resolved" } else { "" }
        ));
        if self.paused {
            output.push_str("Clock: PAUSED\n");
        }
        output
    }
}

/// One row of the pause audit trail.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PauseHistoryEntry {
    /// When the clock stopped
    pub paused_at: Timestamp,
    /// When it restarted (None while still paused)
    pub resumed_at: Option<Timestamp>,
    /// Whole seconds paused (None while still paused)
    pub duration_seconds: Option<i64>,
    /// Pause reason
    pub reason: String,
    /// Who paused the clock
    pub actor: String,
}

impl From<&PauseEvent> for PauseHistoryEntry {
    fn from(event: &PauseEvent) -> Self {
        Self {
            paused_at: event.paused_at,
            resumed_at: event.resumed_at,
            duration_seconds: event.duration_seconds.map(|s| s.round() as i64),
            reason: event.reason.clone(),
            actor: event.actor.clone(),
        }
    }
}

/// Pause history, newest first.
pub fn pause_history(clock: &SlaClock) -> Vec<PauseHistoryEntry> {
    let mut history: Vec<PauseHistoryEntry> =
        clock.pauses().iter().map(PauseHistoryEntry::from).collect();
    history.sort_by(|a, b| b.paused_at.cmp(&a.paused_at));
    history
}

/// Business time lost to an outage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutageReport {
    /// Calendar the outage was measured against
    pub calendar_id: CalendarId,
    /// Outage start
    pub start: Timestamp,
    /// Outage end
    pub end: Timestamp,
    /// Whole business minutes
    pub minutes: i64,
    /// Business hours (minutes / 60)
    pub hours: f64,
    /// Business days (minutes / 480)
    pub days: f64,
}

impl OutageReport {
    /// Build from a measured duration.
    pub fn new(
        calendar_id: CalendarId,
        start: Timestamp,
        end: Timestamp,
        elapsed: BusinessDuration,
    ) -> Self {
        Self {
            calendar_id,
            start,
            end,
            minutes: elapsed.minutes(),
            hours: elapsed.hours(),
            days: elapsed.days(),
        }
    }

    /// Render as text.
    pub fn to_text(&self) -> String {
        format!(
            "Outage {} - {}: {} business minutes ({:.2} hours, {:.2} days)\n",
            self.start, self.end, self.minutes, self.hours, self.days
        )
    }
}
