//! Clock persistence.
//!
//! The engine is stateless between calls: clocks live in a `ClockStore` and
//! every transition is a versioned read-modify-write against it.

use crate::core::{Error, Result, TicketId};
use crate::sla::clock::{ClockState, SlaClock};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// A clock together with its optimistic-concurrency version.
#[derive(Clone, Debug, PartialEq)]
pub struct VersionedClock {
    /// Stored clock
    pub clock: SlaClock,
    /// Incremented on every successful write
    pub version: u64,
}

/// Storage for SLA clocks.
#[async_trait]
pub trait ClockStore: Send + Sync {
    /// Load a clock by ticket ID.
    async fn load(&self, ticket_id: &TicketId) -> Result<Option<VersionedClock>>;

    /// Insert a new clock at version 1.
    ///
    /// Fails with `ClockAlreadyExists` if the ticket already has one.
    async fn insert(&self, clock: SlaClock) -> Result<u64>;

    /// Replace a clock if its stored version still equals `expected`.
    ///
    /// Returns the new version, or `VersionConflict` if another writer got
    /// there first.
    async fn compare_and_swap(&self, clock: SlaClock, expected: u64) -> Result<u64>;

    /// Ticket IDs of clocks that are not closed.
    async fn list_open(&self) -> Result<Vec<TicketId>>;

    /// Number of stored clocks.
    async fn count(&self) -> Result<u64>;
}

/// In-process clock store.
#[derive(Default)]
pub struct InMemoryClockStore {
    clocks: RwLock<HashMap<TicketId, VersionedClock>>,
}

impl InMemoryClockStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClockStore for InMemoryClockStore {
    async fn load(&self, ticket_id: &TicketId) -> Result<Option<VersionedClock>> {
        let clocks = self.clocks.read().await;
        Ok(clocks.get(ticket_id).cloned())
    }

    async fn insert(&self, clock: SlaClock) -> Result<u64> {
        let mut clocks = self.clocks.write().await;
        let ticket_id = clock.ticket_id().clone();
        if clocks.contains_key(&ticket_id) {
            return Err(Error::ClockAlreadyExists(ticket_id.to_string()));
        }
        clocks.insert(ticket_id, VersionedClock { clock, version: 1 });
        Ok(1)
    }

    async fn compare_and_swap(&self, clock: SlaClock, expected: u64) -> Result<u64> {
        let mut clocks = self.clocks.write().await;
        let ticket_id = clock.ticket_id().clone();
        let stored = clocks
            .get_mut(&ticket_id)
            .ok_or_else(|| Error::ClockNotFound(ticket_id.to_string()))?;

        if stored.version != expected {
            return Err(Error::VersionConflict {
                ticket_id: ticket_id.to_string(),
                expected,
                actual: stored.version,
            });
        }
        stored.clock = clock;
        stored.version += 1;
        Ok(stored.version)
    }

    async fn list_open(&self) -> Result<Vec<TicketId>> {
        let clocks = self.clocks.read().await;
        let mut open: Vec<TicketId> = clocks
            .values()
            .filter(|v| v.clock.state() != ClockState::Closed)
            .map(|v| v.clock.ticket_id().clone())
            .collect();
        open.sort();
        Ok(open)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.clocks.read().await.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{BusinessCalendar, NoHolidays, OpenWindow};
    use crate::sla::policy::{Priority, PriorityPolicy};
    use crate::sla::projector::BusinessTimeProjector;
    use chrono::{TimeZone, Utc};
    use chrono_tz::Australia::Brisbane;

    fn clock(id: &str) -> SlaClock {
        let cal = BusinessCalendar::new(1, "HQ", Brisbane, "AU")
            .with_window(OpenWindow::hm((9, 0), (17, 0)).unwrap());
        let projector = BusinessTimeProjector::new(&cal, &NoHolidays);
        let created = Utc.with_ymd_and_hms(2024, 6, 17, 0, 0, 0).unwrap();
        SlaClock::create(
            TicketId::new(id),
            created,
            &PriorityPolicy::new(Priority::P3, 4.0, 16.0),
            &projector,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_load() {
        let store = InMemoryClockStore::new();
        assert_eq!(store.insert(clock("INC-1")).await.unwrap(), 1);

        let loaded = store.load(&TicketId::new("INC-1")).await.unwrap().unwrap();
        assert_eq!(loaded.version, 1);
        assert_eq!(store.count().await.unwrap(), 1);
        assert!(store.load(&TicketId::new("INC-2")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_insert() {
        let store = InMemoryClockStore::new();
        store.insert(clock("INC-1")).await.unwrap();
        assert!(matches!(
            store.insert(clock("INC-1")).await,
            Err(Error::ClockAlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_compare_and_swap_conflict() {
        let store = InMemoryClockStore::new();
        store.insert(clock("INC-1")).await.unwrap();

        assert_eq!(store.compare_and_swap(clock("INC-1"), 1).await.unwrap(), 2);
        let err = store.compare_and_swap(clock("INC-1"), 1).await.unwrap_err();
        assert!(matches!(
            err,
            Error::VersionConflict {
                expected: 1,
                actual: 2,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_list_open_excludes_closed() {
        let store = InMemoryClockStore::new();
        store.insert(clock("INC-2")).await.unwrap();
        let mut closed = clock("INC-1");
        closed.close(Utc::now()).unwrap();
        store.insert(closed).await.unwrap();

        let open = store.list_open().await.unwrap();
        assert_eq!(open, vec![TicketId::new("INC-2")]);
    }

    #[test]
    fn test_store_usable_from_sync_code() {
        let store = InMemoryClockStore::new();
        tokio_test::block_on(async {
            store.insert(clock("INC-9")).await.unwrap();
            assert_eq!(store.list_open().await.unwrap().len(), 1);
        });
    }
}
