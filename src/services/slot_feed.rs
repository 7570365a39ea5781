use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;

use crate::models::{BookedInterval, Slot, WorkSchedule};
use crate::services::availability::{available_slots, SlotQuery};

/// Source of already-booked intervals for one professional on one date.
///
/// Implementations must return only that professional's appointments for
/// that date; the feed hands the result to the availability engine without
/// re-filtering (the interval shape carries no professional id).
#[async_trait]
pub trait BookingSource: Send + Sync {
    async fn bookings_on(
        &self,
        professional_id: &str,
        date: NaiveDate,
    ) -> anyhow::Result<Vec<BookedInterval>>;
}

/// Database-backed source used by the availability endpoint, scoped to the
/// authenticated tenant.
pub struct SqliteBookingSource {
    db: Arc<Mutex<Connection>>,
    tenant_id: String,
}

impl SqliteBookingSource {
    pub fn new(db: Arc<Mutex<Connection>>, tenant_id: String) -> Self {
        Self { db, tenant_id }
    }
}

#[async_trait]
impl BookingSource for SqliteBookingSource {
    async fn bookings_on(
        &self,
        professional_id: &str,
        date: NaiveDate,
    ) -> anyhow::Result<Vec<BookedInterval>> {
        let db = self.db.lock().unwrap();
        crate::db::queries::booked_intervals_on(&db, &self.tenant_id, professional_id, date)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedState {
    /// No professional selected. The source is never queried and the slot
    /// list is empty without ever passing through Loading.
    Disabled,
    /// A bookings fetch is in flight; no slots are reported from partial
    /// data.
    Loading,
    Ready(Vec<Slot>),
    /// The bookings fetch failed. Surfaced explicitly instead of being
    /// treated as "no bookings", which would report every slot as free.
    Failed(String),
}

impl FeedState {
    pub fn slots(&self) -> &[Slot] {
        match self {
            FeedState::Ready(slots) => slots,
            _ => &[],
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, FeedState::Loading)
    }
}

/// The parameters one availability computation is keyed on. Any change to
/// them supersedes whatever fetch is still in flight.
#[derive(Debug, Clone)]
pub struct FeedKey {
    pub professional_id: Option<String>,
    pub schedule: Option<WorkSchedule>,
    pub date: NaiveDate,
    pub duration_minutes: i64,
}

/// Availability query wrapper: decides whether the bookings fetch happens
/// at all, exposes a loading state while it is pending, and discards stale
/// responses when the key has moved on. Each `refresh` bumps a generation
/// counter; a resolution is applied only if its generation is still
/// current.
pub struct SlotFeed {
    state: Mutex<FeedState>,
    generation: AtomicU64,
}

impl Default for SlotFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl SlotFeed {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FeedState::Disabled),
            generation: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> FeedState {
        self.state.lock().unwrap().clone()
    }

    pub async fn refresh<S: BookingSource + ?Sized>(
        &self,
        source: &S,
        key: FeedKey,
        now: NaiveDateTime,
    ) {
        let my_gen = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let Some(professional_id) = key.professional_id else {
            self.apply_if_current(my_gen, FeedState::Disabled);
            return;
        };

        self.apply_if_current(my_gen, FeedState::Loading);

        let fetched = source.bookings_on(&professional_id, key.date).await;

        let next = match fetched {
            Ok(booked) => {
                let query = SlotQuery {
                    date: key.date,
                    schedule: key.schedule.as_ref(),
                    duration_minutes: key.duration_minutes,
                    now,
                };
                FeedState::Ready(available_slots(&query, &booked))
            }
            Err(e) => FeedState::Failed(e.to_string()),
        };
        self.apply_if_current(my_gen, next);
    }

    fn apply_if_current(&self, my_gen: u64, next: FeedState) {
        let mut state = self.state.lock().unwrap();
        if self.generation.load(Ordering::SeqCst) == my_gen {
            *state = next;
        } else {
            tracing::debug!(generation = my_gen, "discarding superseded slot feed update");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    use chrono::NaiveTime;
    use tokio::sync::oneshot;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 16).unwrap()
    }

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn schedule() -> WorkSchedule {
        WorkSchedule {
            work_start: NaiveTime::from_hms_opt(9, 0, 0),
            work_end: NaiveTime::from_hms_opt(12, 0, 0),
            lunch_start: None,
            lunch_end: None,
        }
    }

    fn key(professional: Option<&str>) -> FeedKey {
        FeedKey {
            professional_id: professional.map(str::to_string),
            schedule: Some(schedule()),
            date: date(),
            duration_minutes: 60,
        }
    }

    struct FixedSource {
        booked: Vec<BookedInterval>,
        calls: AtomicUsize,
    }

    impl FixedSource {
        fn new(booked: Vec<BookedInterval>) -> Self {
            Self {
                booked,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl BookingSource for FixedSource {
        async fn bookings_on(
            &self,
            _professional_id: &str,
            _date: NaiveDate,
        ) -> anyhow::Result<Vec<BookedInterval>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.booked.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl BookingSource for FailingSource {
        async fn bookings_on(
            &self,
            _professional_id: &str,
            _date: NaiveDate,
        ) -> anyhow::Result<Vec<BookedInterval>> {
            Err(anyhow::anyhow!("bookings query failed"))
        }
    }

    /// Each call pops a receiver and waits for the test to release it,
    /// so the test controls which fetch resolves first.
    struct GatedSource {
        gates: Mutex<VecDeque<oneshot::Receiver<Vec<BookedInterval>>>>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl BookingSource for GatedSource {
        async fn bookings_on(
            &self,
            _professional_id: &str,
            _date: NaiveDate,
        ) -> anyhow::Result<Vec<BookedInterval>> {
            let gate = self.gates.lock().unwrap().pop_front().unwrap();
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(gate.await?)
        }
    }

    #[tokio::test]
    async fn test_no_professional_is_disabled_and_never_fetches() {
        let source = FixedSource::new(vec![]);
        let feed = SlotFeed::new();

        feed.refresh(&source, key(None), dt("2025-06-16 00:00")).await;

        let state = feed.snapshot();
        assert_eq!(state, FeedState::Disabled);
        assert!(state.slots().is_empty());
        assert!(!state.is_loading());
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_ready_with_computed_slots() {
        let source = FixedSource::new(vec![BookedInterval {
            start: dt("2025-06-16 10:00"),
            end: dt("2025-06-16 11:00"),
        }]);
        let feed = SlotFeed::new();

        feed.refresh(&source, key(Some("pro-1")), dt("2025-06-16 00:00"))
            .await;

        match feed.snapshot() {
            FeedState::Ready(slots) => {
                let labels: Vec<_> = slots.iter().map(|s| s.label.as_str()).collect();
                assert_eq!(labels, vec!["09:00", "11:00"]);
            }
            other => panic!("expected Ready, got {other:?}"),
        }
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_surfaced_not_swallowed() {
        let feed = SlotFeed::new();

        feed.refresh(&FailingSource, key(Some("pro-1")), dt("2025-06-16 00:00"))
            .await;

        match feed.snapshot() {
            FeedState::Failed(msg) => assert!(msg.contains("bookings query failed")),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_professional_cleared_resets_to_disabled() {
        let source = FixedSource::new(vec![]);
        let feed = SlotFeed::new();

        feed.refresh(&source, key(Some("pro-1")), dt("2025-06-16 00:00"))
            .await;
        assert!(matches!(feed.snapshot(), FeedState::Ready(_)));

        feed.refresh(&source, key(None), dt("2025-06-16 00:00")).await;
        assert_eq!(feed.snapshot(), FeedState::Disabled);
    }

    #[tokio::test]
    async fn test_stale_resolution_is_discarded() {
        let (tx_old, rx_old) = oneshot::channel();
        let (tx_new, rx_new) = oneshot::channel();
        let calls = Arc::new(AtomicUsize::new(0));
        let source = Arc::new(GatedSource {
            gates: Mutex::new(VecDeque::from([rx_old, rx_new])),
            calls: Arc::clone(&calls),
        });
        let feed = Arc::new(SlotFeed::new());

        let first = {
            let feed = Arc::clone(&feed);
            let source = Arc::clone(&source);
            tokio::spawn(async move {
                feed.refresh(source.as_ref(), key(Some("pro-1")), dt("2025-06-16 00:00"))
                    .await;
            })
        };
        // Wait until the first fetch holds its gate before superseding it.
        while calls.load(Ordering::SeqCst) < 1 {
            tokio::task::yield_now().await;
        }
        assert!(feed.snapshot().is_loading());

        let second = {
            let feed = Arc::clone(&feed);
            let source = Arc::clone(&source);
            tokio::spawn(async move {
                feed.refresh(source.as_ref(), key(Some("pro-1")), dt("2025-06-16 00:00"))
                    .await;
            })
        };
        while calls.load(Ordering::SeqCst) < 2 {
            tokio::task::yield_now().await;
        }

        // Newer fetch resolves with an empty day.
        tx_new.send(vec![]).unwrap();
        second.await.unwrap();
        assert_eq!(feed.snapshot().slots().len(), 3);

        // The abandoned fetch resolves late with a fully booked day; its
        // result must not overwrite the newer one.
        tx_old
            .send(vec![BookedInterval {
                start: dt("2025-06-16 09:00"),
                end: dt("2025-06-16 12:00"),
            }])
            .unwrap();
        first.await.unwrap();
        assert_eq!(feed.snapshot().slots().len(), 3);
    }
}
