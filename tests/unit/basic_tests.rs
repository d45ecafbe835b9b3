/// Basic unit tests to verify core functionality
use tendensee::*;
use tempfile::NamedTempFile;

use chrono::NaiveDate;

#[test]
fn test_habit_draft_defaults() {
    let draft = HabitDraft::new("Morning Run");
    assert_eq!(draft.scheduling, SchedulingType::Daily);
    assert_eq!(draft.goal_type, GoalType::AtLeast);
    assert_eq!(draft.goal_target, 1.0);
    assert!(draft.validate().is_ok());
}

#[test]
fn test_invalid_draft_rejected() {
    assert!(HabitDraft::new("").validate().is_err());

    let mut weekly = HabitDraft::new("Gym");
    weekly.scheduling = SchedulingType::Weekly;
    weekly.frequency = 9;
    assert!(weekly.validate().is_err());
}

#[test]
fn test_record_day_normalization() {
    let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let record = HabitRecord::for_date(HabitId(1), date, 1.0, None).unwrap();
    assert_eq!(record.timestamp, day::start_of_day_millis(date));
    assert_eq!(record.date(), date);
}

#[test]
fn test_storage_creation_on_disk() {
    let temp_file = NamedTempFile::new().expect("Failed to create temp file");
    let storage = SqliteStore::open(temp_file.path());
    assert!(storage.is_ok());
}

#[test]
fn test_stats_empty_inputs() {
    assert_eq!(stats::current_streak(&[]), 0);
    assert_eq!(stats::best_streak(&[]), 0);
    assert_eq!(stats::completion_rate(&[], 7), 0.0);
    assert_eq!(stats::strength(&[]), 0);
}

#[test]
fn test_habit_serializes_to_json() {
    let habit = Habit::from_existing(
        HabitId(1),
        "Read".to_string(),
        String::new(),
        0xFF4C_AF50,
        SchedulingType::Daily,
        1,
        String::new(),
        GoalType::AtLeast,
        30.0,
        1_700_000_000_000,
        1_700_000_000_000,
        false,
    );

    let json = serde_json::to_string(&habit).expect("serialize");
    let back: Habit = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, habit);
}

#[test]
fn test_service_creation() {
    let temp_file = NamedTempFile::new().expect("Failed to create temp file");
    let service = HabitService::open(temp_file.path());
    assert!(service.is_ok());
}

#[test]
fn test_service_add_and_list_blocking() {
    let service = HabitService::open_in_memory().expect("service");
    let id = tokio_test::block_on(service.add_habit(HabitDraft::new("Run"))).expect("add");
    let habits = tokio_test::block_on(service.list_habits(false)).expect("list");
    assert_eq!(habits.len(), 1);
    assert_eq!(habits[0].id, id);
}
