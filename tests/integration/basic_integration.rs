/// End-to-end tests through the service facade
use tendensee::*;
use tempfile::NamedTempFile;

use chrono::{Duration, NaiveDate};
use futures::StreamExt;

fn a_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
}

#[tokio::test]
async fn test_create_then_get_round_trip() {
    let service = HabitService::open_in_memory().expect("service");

    let draft = HabitDraft {
        title: "Meditate".to_string(),
        description: "Ten quiet minutes".to_string(),
        goal_target: 10.0,
        ..HabitDraft::default()
    };
    let id = service.add_habit(draft.clone()).await.expect("add");

    let habit = service
        .get_habit_by_id(id)
        .await
        .expect("lookup")
        .expect("present");

    assert_eq!(habit.id, id);
    assert_eq!(habit.title, draft.title);
    assert_eq!(habit.description, draft.description);
    assert_eq!(habit.goal_target, draft.goal_target);
    assert!(habit.created_at <= habit.last_modified);
}

#[tokio::test]
async fn test_unknown_habit_is_absent_not_error() {
    let service = HabitService::open_in_memory().expect("service");
    let missing = service.get_habit_by_id(HabitId(404)).await.expect("lookup");
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_database_persists_across_reopen() {
    let temp_file = NamedTempFile::new().expect("temp file");
    let db_path = temp_file.path().to_path_buf();

    let id = {
        let service = HabitService::open(&db_path).expect("first open");
        let id = service
            .add_habit(HabitDraft::new("Journal"))
            .await
            .expect("add");
        service.mark_done(id, a_date()).await.expect("mark done");
        id
    };

    let service = HabitService::open(&db_path).expect("second open");
    let habit = service
        .get_habit_by_id(id)
        .await
        .expect("lookup")
        .expect("present after reopen");
    assert_eq!(habit.title, "Journal");

    let records = service.records_for_habit(id).await.expect("records");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].date(), a_date());
}

#[tokio::test]
async fn test_toggle_idempotence_end_to_end() {
    let service = HabitService::open_in_memory().expect("service");
    let id = service.add_habit(HabitDraft::new("Run")).await.expect("add");
    let date = a_date();

    for completed in [true, false, true] {
        service
            .toggle_completion(id, date, completed, 1.0, None)
            .await
            .expect("toggle");
    }

    let records = service.records_for_habit(id).await.expect("records");
    assert_eq!(records.len(), 1, "on/off/on must leave exactly one record");
}

#[tokio::test]
async fn test_stats_over_stored_records() {
    let service = HabitService::open_in_memory().expect("service");
    let id = service.add_habit(HabitDraft::new("Run")).await.expect("add");

    let base = a_date();
    for offset in [0, 1, 2, 8, 9] {
        service
            .mark_done(id, base - Duration::days(offset))
            .await
            .expect("mark done");
    }

    let records = service.records_for_habit(id).await.expect("records");
    assert_eq!(stats::current_streak_on(&records, base), 3);
    assert_eq!(stats::best_streak(&records), 3);

    let rate = stats::completion_rate_on(&records, 7, base);
    assert!((rate - 300.0 / 7.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_observable_habits_and_records() {
    let service = HabitService::open_in_memory().expect("service");
    let mut habits = service.all_habits();
    assert!(habits.borrow().is_empty());

    let id = service.add_habit(HabitDraft::new("Run")).await.expect("add");
    habits.changed().await.expect("habit change");
    assert_eq!(habits.borrow().len(), 1);

    let mut records = Box::pin(service.watch_records_for_habit(id));
    let initial = records.next().await.expect("initial snapshot");
    assert!(initial.is_empty());

    service.mark_done(id, a_date()).await.expect("mark done");
    let updated = records.next().await.expect("update");
    assert_eq!(updated.len(), 1);

    // Dropping the stream stops further emissions for this subscriber
    drop(records);
    service
        .toggle_completion(id, a_date(), false, 1.0, None)
        .await
        .expect("toggle off still works");
}

#[tokio::test]
async fn test_archive_excludes_from_active_list_but_keeps_history() {
    let service = HabitService::open_in_memory().expect("service");
    let id = service.add_habit(HabitDraft::new("Run")).await.expect("add");
    service.mark_done(id, a_date()).await.expect("mark done");

    service.set_archived(id, true).await.expect("archive");

    assert!(service.list_habits(false).await.expect("active").is_empty());
    assert_eq!(service.list_habits(true).await.expect("all").len(), 1);
    assert_eq!(service.records_for_habit(id).await.expect("records").len(), 1);

    service.set_archived(id, false).await.expect("restore");
    assert_eq!(service.list_habits(false).await.expect("active").len(), 1);
}
