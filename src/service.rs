/// Application facade composing the habit and record stores
///
/// `HabitService` is the write path for completion state and the subscription
/// point for observable reads. It owns the store behind an async mutex, so
/// overlapping toggles for the same (habit, day) are serialized instead of
/// racing, and it notifies subscribers after each committed write.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use futures::Stream;
use tokio::sync::{broadcast, mpsc, watch, Mutex};

use crate::domain::{day, Habit, HabitDraft, HabitId, HabitRecord};
use crate::storage::{HabitStore, SqliteStore, StorageError};
use crate::ServiceError;

/// Capacity of the change broadcast; lagged subscribers re-query rather
/// than replaying missed events, so this only needs to absorb bursts.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Snapshots buffered per live query before backpressure applies
const LIVE_QUERY_BUFFER: usize = 8;

/// A committed write, published to subscribers after the store call returns
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// The habit set changed (create, update, archive, delete)
    Habits,
    /// A completion record was written or removed
    Records { habit_id: HabitId, timestamp: i64 },
}

struct ServiceInner {
    store: Mutex<SqliteStore>,
    habits_tx: watch::Sender<Vec<Habit>>,
    changes_tx: broadcast::Sender<Change>,
}

/// The application facade: composed habit + record stores with observable reads
///
/// Cloning is cheap and every clone shares the same store and subscriber set.
#[derive(Clone)]
pub struct HabitService {
    inner: Arc<ServiceInner>,
}

impl HabitService {
    /// Open the database at `path` and prime the habit snapshot
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, ServiceError> {
        Self::with_store(SqliteStore::open(path)?)
    }

    /// In-memory service, used by tests
    pub fn open_in_memory() -> Result<Self, ServiceError> {
        Self::with_store(SqliteStore::open_in_memory()?)
    }

    /// Wrap an already-opened store
    pub fn with_store(store: SqliteStore) -> Result<Self, ServiceError> {
        let initial = store.list_habits(false)?;
        let (habits_tx, _) = watch::channel(initial);
        let (changes_tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);

        Ok(Self {
            inner: Arc::new(ServiceInner {
                store: Mutex::new(store),
                habits_tx,
                changes_tx,
            }),
        })
    }

    // Habit operations

    /// Create a habit from a draft; returns the store-assigned id
    pub async fn add_habit(&self, draft: HabitDraft) -> Result<HabitId, ServiceError> {
        let id = {
            let store = self.inner.store.lock().await;
            let id = store.create_habit(&draft)?;
            self.refresh_habits(&store)?;
            id
        };
        self.publish(Change::Habits);
        Ok(id)
    }

    /// Persist edits to an existing habit
    pub async fn update_habit(&self, habit: &Habit) -> Result<(), ServiceError> {
        {
            let store = self.inner.store.lock().await;
            store.update_habit(habit)?;
            self.refresh_habits(&store)?;
        }
        self.publish(Change::Habits);
        Ok(())
    }

    /// Soft-archive or restore a habit; its records are untouched
    pub async fn set_archived(&self, id: HabitId, archived: bool) -> Result<(), ServiceError> {
        {
            let store = self.inner.store.lock().await;
            store.set_archived(id, archived)?;
            self.refresh_habits(&store)?;
        }
        self.publish(Change::Habits);
        Ok(())
    }

    /// Hard-delete a habit together with its records
    pub async fn delete_habit(&self, id: HabitId) -> Result<(), ServiceError> {
        {
            let store = self.inner.store.lock().await;
            store.delete_habit(id)?;
            self.refresh_habits(&store)?;
        }
        self.publish(Change::Habits);
        Ok(())
    }

    /// Point lookup; an unknown id yields `None`
    pub async fn get_habit_by_id(&self, id: HabitId) -> Result<Option<Habit>, ServiceError> {
        let store = self.inner.store.lock().await;
        Ok(store.get_habit(id)?)
    }

    /// One-shot habit listing
    pub async fn list_habits(&self, include_archived: bool) -> Result<Vec<Habit>, ServiceError> {
        let store = self.inner.store.lock().await;
        Ok(store.list_habits(include_archived)?)
    }

    /// Observable list of active habits: the receiver holds the current
    /// snapshot and is notified on every habit change. Subscribers are
    /// independent; dropping the receiver detaches it.
    pub fn all_habits(&self) -> watch::Receiver<Vec<Habit>> {
        self.inner.habits_tx.subscribe()
    }

    // Completion operations

    /// The sole write path for completion state
    ///
    /// Converts the calendar date to the canonical start-of-day timestamp,
    /// then upserts (completed) or deletes (not completed). Toggling off a
    /// day with no record is a silent no-op.
    pub async fn toggle_completion(
        &self,
        habit_id: HabitId,
        date: NaiveDate,
        completed: bool,
        value: f64,
        note: Option<String>,
    ) -> Result<(), ServiceError> {
        let timestamp = day::start_of_day_millis(date);
        {
            let store = self.inner.store.lock().await;
            if completed {
                let record = HabitRecord::for_date(habit_id, date, value, note)?;
                store.upsert_record(&record)?;
            } else {
                store.delete_record(habit_id, timestamp)?;
            }
        }
        self.publish(Change::Records {
            habit_id,
            timestamp,
        });
        Ok(())
    }

    /// Check a habit off for a date with the default value and no note
    pub async fn mark_done(&self, habit_id: HabitId, date: NaiveDate) -> Result<(), ServiceError> {
        self.toggle_completion(habit_id, date, true, 1.0, None).await
    }

    // Record queries
    //
    // All date->timestamp conversion happens here, exactly once per call,
    // through `domain::day`, so every call site agrees on day boundaries.

    /// Records across all habits with timestamps in `[start, end]` (epoch ms)
    pub async fn records_in_range(
        &self,
        start: i64,
        end: i64,
    ) -> Result<Vec<HabitRecord>, ServiceError> {
        let store = self.inner.store.lock().await;
        Ok(store.records_in_range(start, end)?)
    }

    /// Per-habit range query
    pub async fn records_in_range_for(
        &self,
        habit_id: HabitId,
        start: i64,
        end: i64,
    ) -> Result<Vec<HabitRecord>, ServiceError> {
        let store = self.inner.store.lock().await;
        Ok(store.records_in_range_for(habit_id, start, end)?)
    }

    /// Records for a single local calendar day, across all habits
    pub async fn records_for_date(&self, date: NaiveDate) -> Result<Vec<HabitRecord>, ServiceError> {
        let (start, end) = day::day_range_millis(date);
        self.records_in_range(start, end).await
    }

    /// Every record for one habit
    pub async fn records_for_habit(&self, habit_id: HabitId) -> Result<Vec<HabitRecord>, ServiceError> {
        let store = self.inner.store.lock().await;
        Ok(store.records_for_habit(habit_id)?)
    }

    /// Records across all habits in the trailing `days`-day window ending today
    pub async fn recent_records(&self, days: u32) -> Result<Vec<HabitRecord>, ServiceError> {
        let today = day::today();
        let start = day::start_of_day_millis(today - Duration::days(days as i64 - 1));
        let end = day::day_range_millis(today).1;
        self.records_in_range(start, end).await
    }

    // Subscriptions

    /// Raw change feed; every committed write publishes one event
    pub fn subscribe(&self) -> broadcast::Receiver<Change> {
        self.inner.changes_tx.subscribe()
    }

    /// Live per-habit record query: emits the current result immediately and
    /// a fresh snapshot after every relevant change. Dropping the stream
    /// stops the backing task.
    pub fn watch_records_for_habit(
        &self,
        habit_id: HabitId,
    ) -> impl Stream<Item = Vec<HabitRecord>> {
        self.spawn_live_query(RecordFilter::Habit(habit_id))
    }

    /// Live range query across all habits (inclusive epoch-ms bounds)
    pub fn watch_records_in_range(
        &self,
        start: i64,
        end: i64,
    ) -> impl Stream<Item = Vec<HabitRecord>> {
        self.spawn_live_query(RecordFilter::Range { start, end })
    }

    fn publish(&self, change: Change) {
        // An error only means there are currently no subscribers
        let _ = self.inner.changes_tx.send(change);
    }

    /// Rebuild the watch snapshot from the store; caller holds the lock
    fn refresh_habits(&self, store: &SqliteStore) -> Result<(), StorageError> {
        let habits = store.list_habits(false)?;
        self.inner.habits_tx.send_replace(habits);
        Ok(())
    }

    fn spawn_live_query(&self, filter: RecordFilter) -> impl Stream<Item = Vec<HabitRecord>> {
        let (tx, rx) = mpsc::channel(LIVE_QUERY_BUFFER);
        let inner = Arc::clone(&self.inner);
        let mut changes = self.inner.changes_tx.subscribe();

        tokio::spawn(async move {
            loop {
                let snapshot = {
                    let store = inner.store.lock().await;
                    filter.run(&store)
                };
                let snapshot = match snapshot {
                    Ok(records) => records,
                    Err(e) => {
                        tracing::warn!("Live query failed, closing stream: {}", e);
                        break;
                    }
                };

                if tx.send(snapshot).await.is_err() {
                    break; // subscriber dropped the stream
                }

                // Wait for a change that can affect this query, or for the
                // subscriber to go away
                loop {
                    tokio::select! {
                        _ = tx.closed() => return,
                        received = changes.recv() => match received {
                            Ok(change) if filter.is_affected_by(&change) => break,
                            Ok(_) => continue,
                            // Missed events: re-query to be safe
                            Err(broadcast::error::RecvError::Lagged(_)) => break,
                            Err(broadcast::error::RecvError::Closed) => return,
                        },
                    }
                }
            }
        });

        futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|records| (records, rx))
        })
    }
}

/// What a live record query is interested in
enum RecordFilter {
    Habit(HabitId),
    Range { start: i64, end: i64 },
}

impl RecordFilter {
    fn run(&self, store: &SqliteStore) -> Result<Vec<HabitRecord>, StorageError> {
        match self {
            RecordFilter::Habit(habit_id) => store.records_for_habit(*habit_id),
            RecordFilter::Range { start, end } => store.records_in_range(*start, *end),
        }
    }

    fn is_affected_by(&self, change: &Change) -> bool {
        match (self, change) {
            // Habit deletes cascade into records, so habit changes always count
            (_, Change::Habits) => true,
            (RecordFilter::Habit(watched), Change::Records { habit_id, .. }) => watched == habit_id,
            (RecordFilter::Range { start, end }, Change::Records { timestamp, .. }) => {
                *timestamp >= *start && *timestamp <= *end
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::day;
    use futures::StreamExt;
    use tokio::time::{timeout, Duration as TokioDuration};

    fn service() -> HabitService {
        HabitService::open_in_memory().unwrap()
    }

    fn a_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[tokio::test]
    async fn test_toggle_on_off_on_leaves_one_record() {
        let service = service();
        let id = service.add_habit(HabitDraft::new("Run")).await.unwrap();
        let date = a_date();

        service.toggle_completion(id, date, true, 1.0, None).await.unwrap();
        service.toggle_completion(id, date, false, 1.0, None).await.unwrap();
        service.toggle_completion(id, date, true, 1.0, None).await.unwrap();

        let records = service.records_for_habit(id).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date(), date);
    }

    #[tokio::test]
    async fn test_toggle_off_without_record_is_noop() {
        let service = service();
        let id = service.add_habit(HabitDraft::new("Run")).await.unwrap();

        service
            .toggle_completion(id, a_date(), false, 1.0, None)
            .await
            .unwrap();

        assert!(service.records_for_habit(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_delete_uses_same_day_normalization() {
        // A record written through toggle must be deletable through toggle;
        // both sides share the canonical conversion.
        let service = service();
        let id = service.add_habit(HabitDraft::new("Run")).await.unwrap();
        let date = a_date();

        service.toggle_completion(id, date, true, 1.0, None).await.unwrap();
        service.toggle_completion(id, date, false, 1.0, None).await.unwrap();

        assert!(service.records_for_habit(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_records_for_date_matches_toggled_day() {
        let service = service();
        let id = service.add_habit(HabitDraft::new("Run")).await.unwrap();
        let date = a_date();

        service
            .toggle_completion(id, date, true, 30.0, Some("felt good".into()))
            .await
            .unwrap();

        let records = service.records_for_date(date).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value, 30.0);

        let other_day = service
            .records_for_date(date + Duration::days(1))
            .await
            .unwrap();
        assert!(other_day.is_empty());
    }

    #[tokio::test]
    async fn test_habit_watch_sees_changes() {
        let service = service();
        let mut habits = service.all_habits();
        assert!(habits.borrow().is_empty());

        let id = service.add_habit(HabitDraft::new("Run")).await.unwrap();
        habits.changed().await.unwrap();
        assert_eq!(habits.borrow().len(), 1);

        service.set_archived(id, true).await.unwrap();
        habits.changed().await.unwrap();
        // Archived habits drop out of the active snapshot
        assert!(habits.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_change_feed_reports_record_writes() {
        let service = service();
        let id = service.add_habit(HabitDraft::new("Run")).await.unwrap();
        let mut changes = service.subscribe();
        let date = a_date();

        service.toggle_completion(id, date, true, 1.0, None).await.unwrap();

        let change = changes.recv().await.unwrap();
        assert_eq!(
            change,
            Change::Records {
                habit_id: id,
                timestamp: day::start_of_day_millis(date),
            }
        );
    }

    #[tokio::test]
    async fn test_live_query_emits_snapshot_then_updates() {
        let service = service();
        let id = service.add_habit(HabitDraft::new("Run")).await.unwrap();

        let mut stream = Box::pin(service.watch_records_for_habit(id));

        let initial = timeout(TokioDuration::from_secs(1), stream.next())
            .await
            .expect("initial snapshot")
            .unwrap();
        assert!(initial.is_empty());

        service
            .toggle_completion(id, a_date(), true, 1.0, None)
            .await
            .unwrap();

        let updated = timeout(TokioDuration::from_secs(1), stream.next())
            .await
            .expect("update after toggle")
            .unwrap();
        assert_eq!(updated.len(), 1);
    }

    #[tokio::test]
    async fn test_live_query_ignores_other_habits() {
        let service = service();
        let watched = service.add_habit(HabitDraft::new("Run")).await.unwrap();
        let other = service.add_habit(HabitDraft::new("Read")).await.unwrap();

        let mut stream = Box::pin(service.watch_records_for_habit(watched));
        let _initial = timeout(TokioDuration::from_secs(1), stream.next())
            .await
            .expect("initial snapshot");

        service
            .toggle_completion(other, a_date(), true, 1.0, None)
            .await
            .unwrap();

        // No emission for an unrelated habit's record
        let quiet = timeout(TokioDuration::from_millis(100), stream.next()).await;
        assert!(quiet.is_err());
    }

    #[tokio::test]
    async fn test_concurrent_toggles_same_day_leave_one_record() {
        let service = service();
        let id = service.add_habit(HabitDraft::new("Run")).await.unwrap();
        let date = a_date();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service.toggle_completion(id, date, true, 1.0, None).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let records = service.records_for_habit(id).await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_recent_records_span_trailing_window() {
        let service = service();
        let id = service.add_habit(HabitDraft::new("Run")).await.unwrap();
        let today = day::today();

        service.mark_done(id, today).await.unwrap();
        service.mark_done(id, today - Duration::days(5)).await.unwrap();
        service.mark_done(id, today - Duration::days(40)).await.unwrap();

        let recent = service.recent_records(30).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert!(recent.iter().all(|r| r.date() > today - Duration::days(30)));
    }

    #[tokio::test]
    async fn test_live_range_query_tracks_writes_in_window() {
        let service = service();
        let id = service.add_habit(HabitDraft::new("Run")).await.unwrap();

        let inside = a_date();
        let outside = inside + Duration::days(10);
        let (start, end) = day::day_range_millis(inside);

        let mut stream = Box::pin(service.watch_records_in_range(start, end));
        let initial = timeout(TokioDuration::from_secs(1), stream.next())
            .await
            .expect("initial snapshot")
            .unwrap();
        assert!(initial.is_empty());

        // A write outside the window is not a relevant change
        service.mark_done(id, outside).await.unwrap();
        let quiet = timeout(TokioDuration::from_millis(100), stream.next()).await;
        assert!(quiet.is_err());

        service.mark_done(id, inside).await.unwrap();
        let updated = timeout(TokioDuration::from_secs(1), stream.next())
            .await
            .expect("update after in-window write")
            .unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].date(), inside);
    }

    #[tokio::test]
    async fn test_delete_habit_purges_records() {
        let service = service();
        let id = service.add_habit(HabitDraft::new("Run")).await.unwrap();
        service.toggle_completion(id, a_date(), true, 1.0, None).await.unwrap();

        service.delete_habit(id).await.unwrap();

        assert!(service.get_habit_by_id(id).await.unwrap().is_none());
        let (start, end) = day::day_range_millis(a_date());
        assert!(service.records_in_range(start, end).await.unwrap().is_empty());
    }
}
