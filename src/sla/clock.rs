//! Per-ticket SLA clock.
//!
//! Holds deadlines, pause history and breach flags. Every mutation goes
//! through an explicit transition so the invariants below always hold:
//! - `respond_by` and `resolve_by` are never earlier than `created_at`
//! - at most one pause is open at a time
//! - `responded_at`/`resolved_at` are stamped once and never restamped

use crate::core::{CalendarId, Error, Result, TicketId, Timestamp};
use crate::sla::policy::{Priority, PriorityPolicy};
use crate::sla::projector::BusinessTimeProjector;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Clock state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockState {
    /// Accruing SLA time
    Running,
    /// Stopped, awaiting resume
    Paused,
    /// Ticket resolved or closed; breach flags frozen
    Closed,
}

impl std::fmt::Display for ClockState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClockState::Running => write!(f, "running"),
            ClockState::Paused => write!(f, "paused"),
            ClockState::Closed => write!(f, "closed"),
        }
    }
}

/// One pause/resume cycle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PauseEvent {
    /// Event ID
    pub id: Uuid,
    /// Ticket the pause belongs to
    pub ticket_id: TicketId,
    /// When the clock stopped
    pub paused_at: Timestamp,
    /// When the clock restarted (None while open)
    pub resumed_at: Option<Timestamp>,
    /// Why the clock was paused
    pub reason: String,
    /// Who paused it
    pub actor: String,
    /// Pause length in seconds, set on resume
    pub duration_seconds: Option<f64>,
}

impl PauseEvent {
    /// Whether the pause is still open.
    pub fn is_open(&self) -> bool {
        self.resumed_at.is_none()
    }

    /// Raw wall-clock length of a closed pause.
    pub fn duration(&self) -> Option<Duration> {
        self.resumed_at.map(|resumed| resumed - self.paused_at)
    }
}

/// Outcome of a breach evaluation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BreachChange {
    /// Response breach newly raised
    pub response_raised: bool,
    /// Resolve breach newly raised
    pub resolve_raised: bool,
}

impl BreachChange {
    /// Whether any flag changed.
    pub fn any(&self) -> bool {
        self.response_raised || self.resolve_raised
    }
}

/// SLA clock for a single ticket.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlaClock {
    pub(crate) ticket_id: TicketId,
    pub(crate) calendar_id: CalendarId,
    pub(crate) priority: Priority,
    pub(crate) created_at: Timestamp,
    pub(crate) respond_by: Timestamp,
    pub(crate) resolve_by: Timestamp,
    pub(crate) responded_at: Option<Timestamp>,
    pub(crate) resolved_at: Option<Timestamp>,
    pub(crate) state: ClockState,
    pub(crate) response_breach: bool,
    pub(crate) resolve_breach: bool,
    pub(crate) pauses: Vec<PauseEvent>,
}

impl SlaClock {
    /// Start a clock at ticket creation.
    pub fn create(
        ticket_id: TicketId,
        created_at: Timestamp,
        policy: &PriorityPolicy,
        projector: &BusinessTimeProjector<'_>,
    ) -> Result<Self> {
        let (respond_by, resolve_by) = projector.deadlines(created_at, policy)?;
        info!(
            ticket_id = %ticket_id,
            priority = %policy.priority,
            %respond_by,
            %resolve_by,
            "SLA clock started"
        );
        Ok(Self {
            ticket_id,
            calendar_id: projector.calendar().id,
            priority: policy.priority,
            created_at,
            respond_by,
            resolve_by,
            responded_at: None,
            resolved_at: None,
            state: ClockState::Running,
            response_breach: false,
            resolve_breach: false,
            pauses: Vec::new(),
        })
    }

    /// Ticket ID.
    pub fn ticket_id(&self) -> &TicketId {
        &self.ticket_id
    }

    /// Calendar the deadlines were projected through.
    pub fn calendar_id(&self) -> CalendarId {
        self.calendar_id
    }

    /// Current priority.
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Creation instant.
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// First-response deadline.
    pub fn respond_by(&self) -> Timestamp {
        self.respond_by
    }

    /// Resolution deadline.
    pub fn resolve_by(&self) -> Timestamp {
        self.resolve_by
    }

    /// When the first response was recorded.
    pub fn responded_at(&self) -> Option<Timestamp> {
        self.responded_at
    }

    /// When resolution was recorded.
    pub fn resolved_at(&self) -> Option<Timestamp> {
        self.resolved_at
    }

    /// Whether the first response was recorded.
    pub fn responded(&self) -> bool {
        self.responded_at.is_some()
    }

    /// Whether resolution was recorded.
    pub fn resolved(&self) -> bool {
        self.resolved_at.is_some()
    }

    /// Current state.
    pub fn state(&self) -> ClockState {
        self.state
    }

    /// Whether the clock is paused.
    pub fn is_paused(&self) -> bool {
        self.state == ClockState::Paused
    }

    /// Response deadline breached.
    pub fn response_breach(&self) -> bool {
        self.response_breach
    }

    /// Resolve deadline breached.
    pub fn resolve_breach(&self) -> bool {
        self.resolve_breach
    }

    /// Pause history, oldest first.
    pub fn pauses(&self) -> &[PauseEvent] {
        &self.pauses
    }

    /// The open pause, if any.
    pub fn open_pause(&self) -> Option<&PauseEvent> {
        self.pauses.iter().rev().find(|p| p.is_open())
    }

    /// Sum of closed pause durations.
    pub fn total_paused(&self) -> Duration {
        self.pauses
            .iter()
            .filter_map(PauseEvent::duration)
            .fold(Duration::zero(), |acc, d| acc + d)
    }

    /// Stop the clock. Legal only while running.
    pub fn pause(&mut self, reason: &str, actor: &str, now: Timestamp) -> Result<&PauseEvent> {
        self.require(ClockState::Running, "pause")?;

        self.pauses.push(PauseEvent {
            id: Uuid::new_v4(),
            ticket_id: self.ticket_id.clone(),
            paused_at: now,
            resumed_at: None,
            reason: reason.to_string(),
            actor: actor.to_string(),
            duration_seconds: None,
        });
        self.state = ClockState::Paused;
        info!(ticket_id = %self.ticket_id, reason, actor, "SLA clock paused");

        self.pauses
            .last()
            .ok_or_else(|| Error::Internal("pause event vanished".to_string()))
    }

    /// Restart the clock, pushing both deadlines forward by the raw pause
    /// length. Legal only while paused.
    pub fn resume(&mut self, now: Timestamp) -> Result<Duration> {
        self.require(ClockState::Paused, "resume")?;
        let paused = self.close_open_pause(now)?;
        self.state = ClockState::Running;
        info!(
            ticket_id = %self.ticket_id,
            paused_seconds = paused.num_seconds(),
            respond_by = %self.respond_by,
            resolve_by = %self.resolve_by,
            "SLA clock resumed"
        );
        Ok(paused)
    }

    /// Record the first response. Returns false if it was already recorded.
    pub fn mark_responded(&mut self, now: Timestamp) -> Result<bool> {
        if self.responded_at.is_some() {
            return Ok(false);
        }
        if self.state == ClockState::Closed {
            return Err(self.invalid("mark responded"));
        }
        self.responded_at = Some(now);
        info!(ticket_id = %self.ticket_id, responded_at = %now, "SLA response recorded");
        Ok(true)
    }

    /// Record resolution and close the clock. An open pause is resumed first.
    /// Sets `resolve_breach` from the deadline at this moment. Returns false
    /// if resolution was already recorded.
    pub fn mark_resolved(&mut self, now: Timestamp) -> Result<bool> {
        if self.resolved_at.is_some() {
            return Ok(false);
        }
        match self.state {
            ClockState::Closed => return Err(self.invalid("mark resolved")),
            ClockState::Paused => {
                self.close_open_pause(now)?;
            }
            ClockState::Running => {}
        }
        self.resolved_at = Some(now);
        self.resolve_breach = now > self.resolve_by;
        self.state = ClockState::Closed;
        info!(
            ticket_id = %self.ticket_id,
            resolved_at = %now,
            resolve_breach = self.resolve_breach,
            "SLA resolution recorded"
        );
        Ok(true)
    }

    /// Close the clock without resolution (e.g. ticket cancelled).
    pub fn close(&mut self, now: Timestamp) -> Result<()> {
        match self.state {
            ClockState::Closed => return Err(self.invalid("close")),
            ClockState::Paused => {
                self.close_open_pause(now)?;
            }
            ClockState::Running => {}
        }
        self.state = ClockState::Closed;
        info!(ticket_id = %self.ticket_id, "SLA clock closed");
        Ok(())
    }

    /// Recompute deadlines for a new priority from the original creation
    /// time, then add back all closed pause time.
    pub fn change_priority(
        &mut self,
        policy: &PriorityPolicy,
        projector: &BusinessTimeProjector<'_>,
    ) -> Result<()> {
        if self.state == ClockState::Closed {
            return Err(self.invalid("change priority"));
        }
        let (respond_by, resolve_by) = projector.deadlines(self.created_at, policy)?;
        let paused = self.total_paused();
        let respond_by = shifted(respond_by, paused)?;
        let resolve_by = shifted(resolve_by, paused)?;

        let previous = self.priority;
        self.priority = policy.priority;
        self.calendar_id = projector.calendar().id;
        self.respond_by = respond_by;
        self.resolve_by = resolve_by;
        info!(
            ticket_id = %self.ticket_id,
            from = %previous,
            to = %policy.priority,
            respond_by = %self.respond_by,
            resolve_by = %self.resolve_by,
            "SLA priority changed"
        );
        Ok(())
    }

    /// Raise breach flags for deadlines passed at `now`. Only running clocks
    /// are evaluated, and flags are never cleared here.
    pub fn evaluate_breaches(&mut self, now: Timestamp) -> BreachChange {
        let mut change = BreachChange::default();
        if self.state != ClockState::Running {
            return change;
        }
        if !self.response_breach && !self.responded() && now > self.respond_by {
            self.response_breach = true;
            change.response_raised = true;
        }
        if !self.resolve_breach && !self.resolved() && now > self.resolve_by {
            self.resolve_breach = true;
            change.resolve_raised = true;
        }
        change
    }

    fn close_open_pause(&mut self, now: Timestamp) -> Result<Duration> {
        let open = self
            .pauses
            .iter_mut()
            .rev()
            .find(|p| p.is_open())
            .ok_or_else(|| Error::InvalidTransition {
                ticket_id: self.ticket_id.to_string(),
                state: "paused without an open pause".to_string(),
                action: "resume",
            })?;

        // Clock skew between writers must not pull deadlines backwards.
        let resumed_at = now.max(open.paused_at);
        let paused = resumed_at - open.paused_at;
        let respond_by = shifted(self.respond_by, paused)?;
        let resolve_by = shifted(self.resolve_by, paused)?;

        open.resumed_at = Some(resumed_at);
        open.duration_seconds = Some(paused.num_milliseconds() as f64 / 1000.0);
        self.respond_by = respond_by;
        self.resolve_by = resolve_by;
        Ok(paused)
    }

    fn require(&self, expected: ClockState, action: &'static str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &'static str) -> Error {
        Error::InvalidTransition {
            ticket_id: self.ticket_id.to_string(),
            state: self.state.to_string(),
            action,
        }
    }
}

fn shifted(deadline: Timestamp, by: Duration) -> Result<Timestamp> {
    deadline.checked_add_signed(by).ok_or_else(|| {
        Error::InvalidDuration(format!("deadline {deadline} shifted by {by} is out of range"))
    })
}
