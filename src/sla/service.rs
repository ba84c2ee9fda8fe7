//! SLA clock orchestration.
//!
//! Resolves calendars and priority policies, runs clock transitions as
//! versioned read-modify-write cycles against a `ClockStore`, and sweeps open
//! clocks for breaches.

use crate::calendar::{BuiltinHolidays, BusinessCalendar, CalendarRegistry, HolidayCalendar};
use crate::core::{Error, LocationId, Result, TicketId, Timestamp};
use crate::sla::clock::{BreachChange, SlaClock};
use crate::sla::config::SlaConfig;
use crate::sla::measurer::BusinessTimeMeasurer;
use crate::sla::policy::{PolicyTable, Priority, PriorityPolicy};
use crate::sla::projector::BusinessTimeProjector;
use crate::sla::report::{pause_history, OutageReport, PauseHistoryEntry, SlaStatus};
use crate::sla::store::{ClockStore, InMemoryClockStore};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of one breach sweep.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepSummary {
    /// Open clocks examined
    pub evaluated: usize,
    /// Response breaches raised this sweep
    pub response_breaches: usize,
    /// Resolve breaches raised this sweep
    pub resolve_breaches: usize,
    /// Clocks that could not be evaluated
    pub failed: usize,
}

/// Entry point for the ticket layer.
pub struct SlaClockService {
    config: SlaConfig,
    calendars: CalendarRegistry,
    policies: PolicyTable,
    holidays: Arc<dyn HolidayCalendar>,
    store: Arc<dyn ClockStore>,
}

impl SlaClockService {
    /// Build a service from configuration.
    pub fn new(
        config: SlaConfig,
        holidays: Arc<dyn HolidayCalendar>,
        store: Arc<dyn ClockStore>,
    ) -> Result<Self> {
        config.validate()?;
        let calendars = config.registry()?;
        let policies = config.policy_table()?;
        info!(
            calendars = calendars.len(),
            priorities = policies.len(),
            default_calendar = config.default_calendar_id,
            "SLA clock service ready"
        );
        Ok(Self {
            config,
            calendars,
            policies,
            holidays,
            store,
        })
    }

    /// Service with built-in holidays and an in-memory store.
    pub fn in_memory(config: SlaConfig) -> Result<Self> {
        Self::new(
            config,
            Arc::new(BuiltinHolidays::new()),
            Arc::new(InMemoryClockStore::new()),
        )
    }

    /// Active configuration.
    pub fn config(&self) -> &SlaConfig {
        &self.config
    }

    /// Policy for a priority.
    pub fn policy(&self, priority: Priority) -> Result<&PriorityPolicy> {
        self.policies.get(priority)
    }

    /// Calendar for a location, or the default calendar.
    pub fn calendar_for(&self, location: Option<LocationId>) -> Result<Arc<BusinessCalendar>> {
        self.calendars.for_location(location)
    }

    fn projector<'a>(&'a self, calendar: &'a BusinessCalendar) -> BusinessTimeProjector<'a> {
        BusinessTimeProjector::new(calendar, self.holidays.as_ref())
            .with_max_days(self.config.max_projection_days)
    }

    /// Deadlines a new ticket would get, without creating a clock.
    pub fn preview_deadlines(
        &self,
        location: Option<LocationId>,
        priority: Priority,
        start: Timestamp,
    ) -> Result<(Timestamp, Timestamp)> {
        let calendar = self.calendar_for(location)?;
        let policy = self.policy(priority)?;
        self.projector(&calendar).deadlines(start, policy)
    }

    /// Whether `instant` counts as covered time for a priority at a location.
    pub fn is_business_time(
        &self,
        location: Option<LocationId>,
        priority: Priority,
        instant: Timestamp,
    ) -> Result<bool> {
        if self.policy(priority)?.always_on {
            return Ok(true);
        }
        let calendar = self.calendar_for(location)?;
        Ok(calendar.is_open_at(instant, self.holidays.as_ref()))
    }

    /// Start the clock for a new ticket.
    pub async fn open_clock(
        &self,
        ticket_id: TicketId,
        priority: Priority,
        created_at: Timestamp,
        location: Option<LocationId>,
    ) -> Result<SlaClock> {
        let calendar = self.calendar_for(location)?;
        let policy = self.policy(priority)?;
        let clock = SlaClock::create(ticket_id, created_at, policy, &self.projector(&calendar))?;
        self.store.insert(clock.clone()).await?;
        Ok(clock)
    }

    /// Current clock for a ticket.
    pub async fn clock(&self, ticket_id: &TicketId) -> Result<SlaClock> {
        self.store
            .load(ticket_id)
            .await?
            .map(|record| record.clock)
            .ok_or_else(|| Error::ClockNotFound(ticket_id.to_string()))
    }

    /// Stop the clock.
    pub async fn pause(
        &self,
        ticket_id: &TicketId,
        reason: &str,
        actor: &str,
        now: Timestamp,
    ) -> Result<SlaClock> {
        let (clock, _) = self
            .apply(ticket_id, "pause", |clock| clock.pause(reason, actor, now).map(|_| ()))
            .await?;
        Ok(clock)
    }

    /// Restart the clock, shifting both deadlines by the pause length.
    pub async fn resume(&self, ticket_id: &TicketId, now: Timestamp) -> Result<SlaClock> {
        let (clock, _) = self
            .apply(ticket_id, "resume", |clock| clock.resume(now))
            .await?;
        Ok(clock)
    }

    /// Record the first response. Repeats keep the original timestamp.
    pub async fn mark_responded(&self, ticket_id: &TicketId, now: Timestamp) -> Result<SlaClock> {
        let (clock, _) = self
            .apply(ticket_id, "mark responded", |clock| clock.mark_responded(now))
            .await?;
        Ok(clock)
    }

    /// Record resolution and close the clock. Repeats keep the original
    /// timestamp.
    pub async fn mark_resolved(&self, ticket_id: &TicketId, now: Timestamp) -> Result<SlaClock> {
        let (clock, _) = self
            .apply(ticket_id, "mark resolved", |clock| clock.mark_resolved(now))
            .await?;
        Ok(clock)
    }

    /// Close the clock without resolution.
    pub async fn close(&self, ticket_id: &TicketId, now: Timestamp) -> Result<SlaClock> {
        let (clock, _) = self
            .apply(ticket_id, "close", |clock| clock.close(now))
            .await?;
        Ok(clock)
    }

    /// Re-project deadlines for a new priority from the original creation
    /// time.
    pub async fn change_priority(
        &self,
        ticket_id: &TicketId,
        priority: Priority,
    ) -> Result<SlaClock> {
        let policy = self.policy(priority)?;
        let (clock, _) = self
            .apply(ticket_id, "change priority", |clock| {
                let calendar = self.calendars.get(clock.calendar_id())?;
                clock.change_priority(policy, &self.projector(&calendar))
            })
            .await?;
        Ok(clock)
    }

    /// Status snapshot for display.
    pub async fn status(&self, ticket_id: &TicketId) -> Result<SlaStatus> {
        Ok(SlaStatus::from(&self.clock(ticket_id).await?))
    }

    /// Pause audit trail, newest first.
    pub async fn pause_history(&self, ticket_id: &TicketId) -> Result<Vec<PauseHistoryEntry>> {
        Ok(pause_history(&self.clock(ticket_id).await?))
    }

    /// Business time lost between two instants at a location.
    pub fn measure_outage(
        &self,
        location: Option<LocationId>,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<OutageReport> {
        let calendar = self.calendar_for(location)?;
        let elapsed = BusinessTimeMeasurer::new(&calendar, self.holidays.as_ref()).measure(start, end)?;
        Ok(OutageReport::new(calendar.id, start, end, elapsed))
    }

    /// Raise breach flags on every open clock whose deadlines have passed.
    ///
    /// Idempotent for a given `now`; clocks are evaluated concurrently and
    /// each update goes through the same versioned write as transitions.
    pub async fn evaluate_breaches(&self, now: Timestamp) -> Result<SweepSummary> {
        let open = self.store.list_open().await?;
        let outcomes: Vec<(TicketId, Result<BreachChange>)> = stream::iter(open)
            .map(|ticket_id| async move {
                let outcome = self
                    .apply(&ticket_id, "evaluate breaches", |clock| {
                        Ok(clock.evaluate_breaches(now))
                    })
                    .await
                    .map(|(_, change)| change);
                (ticket_id, outcome)
            })
            .buffer_unordered(self.config.sweep_concurrency)
            .collect()
            .await;

        let mut summary = SweepSummary::default();
        for (ticket_id, outcome) in outcomes {
            match outcome {
                Ok(change) => {
                    summary.evaluated += 1;
                    if change.response_raised {
                        summary.response_breaches += 1;
                    }
                    if change.resolve_raised {
                        summary.resolve_breaches += 1;
                    }
                    if change.any() {
                        info!(
                            ticket_id = %ticket_id,
                            response = change.response_raised,
                            resolve = change.resolve_raised,
                            "SLA breach raised"
                        );
                    }
                }
                // Removed between listing and evaluation.
                Err(Error::ClockNotFound(_)) => {}
                Err(e) => {
                    summary.failed += 1;
                    warn!(ticket_id = %ticket_id, error = %e, "Breach evaluation failed");
                }
            }
        }

        info!(
            evaluated = summary.evaluated,
            response_breaches = summary.response_breaches,
            resolve_breaches = summary.resolve_breaches,
            failed = summary.failed,
            "Breach sweep complete"
        );
        Ok(summary)
    }

    /// Load, mutate and compare-and-swap a clock, retrying on version
    /// conflicts. Unchanged clocks are not written back.
    async fn apply<T, F>(
        &self,
        ticket_id: &TicketId,
        action: &'static str,
        mut transition: F,
    ) -> Result<(SlaClock, T)>
    where
        F: FnMut(&mut SlaClock) -> Result<T>,
    {
        let mut attempt = 0;
        loop {
            let record = self
                .store
                .load(ticket_id)
                .await?
                .ok_or_else(|| Error::ClockNotFound(ticket_id.to_string()))?;

            let mut clock = record.clock.clone();
            let output = match transition(&mut clock) {
                Ok(output) => output,
                Err(e) => {
                    warn!(ticket_id = %ticket_id, action, error = %e, "SLA transition rejected");
                    return Err(e);
                }
            };
            if clock == record.clock {
                return Ok((clock, output));
            }

            match self.store.compare_and_swap(clock.clone(), record.version).await {
                Ok(version) => {
                    debug!(ticket_id = %ticket_id, action, version, "SLA clock stored");
                    return Ok((clock, output));
                }
                Err(e) if e.is_conflict() && attempt < self.config.max_transition_retries => {
                    attempt += 1;
                    debug!(ticket_id = %ticket_id, action, attempt, "Version conflict, retrying");
                }
                Err(e) => {
                    warn!(ticket_id = %ticket_id, action, error = %e, "SLA clock write failed");
                    return Err(e);
                }
            }
        }
    }
}
