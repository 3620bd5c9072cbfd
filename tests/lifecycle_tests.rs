use chrono::NaiveDate;

use rollcall::db::{NewStudent, Store};
use rollcall::models::attendance::{AttendanceOrder, AttendanceQuery, AttendanceStatus};
use rollcall::services::LifecycleService;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn test_store() -> Store {
    Store::new("sqlite::memory:")
        .await
        .expect("Failed to open in-memory store")
}

async fn seed_student(store: &Store, roll: &str, issue_valid: &str) {
    let inserted = store
        .insert_student(NewStudent {
            roll: roll.to_string(),
            name: "Test Student".to_string(),
            branch: "CSE".to_string(),
            dob: date(2003, 1, 1),
            issue_valid: issue_valid.to_string(),
            pin_hash: "not-a-real-hash".to_string(),
            photo_url: format!("/photos/{roll}.jpg"),
            photo_handle: format!("{roll}.jpg"),
            issued_at: date(2021, 8, 1),
        })
        .await
        .unwrap();
    assert!(inserted);
}

async fn attendance_for(store: &Store, roll: &str) -> Vec<(NaiveDate, String)> {
    store
        .list_attendance(&AttendanceQuery {
            roll: roll.to_string(),
            status: None,
            from: date(2000, 1, 1),
            to: date(2100, 1, 1),
            order_by: Some(AttendanceOrder::Date),
        })
        .await
        .unwrap()
        .into_iter()
        .map(|r| (r.date, r.status))
        .collect()
}

#[tokio::test]
async fn sweep_marks_every_unmarked_student_absent_exactly_once() {
    let store = test_store().await;
    let lifecycle = LifecycleService::new(store.clone());
    let today = date(2024, 3, 15);

    seed_student(&store, "CS21B001", "21-24").await;
    seed_student(&store, "CS21B002", "21-24").await;
    seed_student(&store, "CS21B003", "21-24").await;

    // One student scanned in before the sweep.
    let marked = store
        .insert_attendance_if_absent(
            "CS21B002",
            today,
            AttendanceStatus::Present,
            Some("09:00:00".to_string()),
        )
        .await
        .unwrap();
    assert!(marked);

    let inserted = lifecycle.sweep_absentees(today).await.unwrap();
    assert_eq!(inserted, 2);

    // The Present mark survives the sweep.
    let rows = attendance_for(&store, "CS21B002").await;
    assert_eq!(rows, vec![(today, "Present".to_string())]);
    let rows = attendance_for(&store, "CS21B001").await;
    assert_eq!(rows, vec![(today, "Absent".to_string())]);

    // Re-running the sweep writes nothing.
    let inserted = lifecycle.sweep_absentees(today).await.unwrap();
    assert_eq!(inserted, 0);
}

#[tokio::test]
async fn duplicate_mark_never_writes_a_second_row() {
    let store = test_store().await;
    let today = date(2024, 3, 15);
    seed_student(&store, "CS21B001", "21-24").await;

    let first = store
        .insert_attendance_if_absent("CS21B001", today, AttendanceStatus::Present, None)
        .await
        .unwrap();
    let second = store
        .insert_attendance_if_absent("CS21B001", today, AttendanceStatus::Present, None)
        .await
        .unwrap();

    assert!(first);
    assert!(!second);
    assert_eq!(attendance_for(&store, "CS21B001").await.len(), 1);
}

#[tokio::test]
async fn expiry_purges_strictly_after_december_31_of_the_end_year() {
    let store = test_store().await;
    let lifecycle = LifecycleService::new(store.clone());

    seed_student(&store, "CS21B001", "21-24").await;
    store
        .insert_attendance_if_absent(
            "CS21B001",
            date(2024, 12, 30),
            AttendanceStatus::Present,
            None,
        )
        .await
        .unwrap();

    // Still valid on the last day of the window.
    let deleted = lifecycle
        .purge_expired_students(date(2024, 12, 31))
        .await
        .unwrap();
    assert_eq!(deleted, 0);
    assert!(store.student_exists("CS21B001").await.unwrap());

    // Gone the day after, attendance included.
    let deleted = lifecycle
        .purge_expired_students(date(2025, 1, 1))
        .await
        .unwrap();
    assert_eq!(deleted, 1);
    assert!(!store.student_exists("CS21B001").await.unwrap());
    assert!(attendance_for(&store, "CS21B001").await.is_empty());
}

#[tokio::test]
async fn expiry_skips_unparsable_windows() {
    let store = test_store().await;
    let lifecycle = LifecycleService::new(store.clone());

    seed_student(&store, "CS21B001", "not-a-window").await;
    seed_student(&store, "CS21B002", "2018-2022").await;

    let deleted = lifecycle
        .purge_expired_students(date(2030, 1, 1))
        .await
        .unwrap();

    assert_eq!(deleted, 1);
    assert!(store.student_exists("CS21B001").await.unwrap());
    assert!(!store.student_exists("CS21B002").await.unwrap());
}

#[tokio::test]
async fn two_digit_windows_get_the_century_shim() {
    let store = test_store().await;
    let lifecycle = LifecycleService::new(store.clone());

    // "99-02" would be inverted under the shim (2099 > 2002), so it parses
    // as invalid and is never purged.
    seed_student(&store, "CS21B001", "99-02").await;
    seed_student(&store, "CS21B002", "19-22").await;

    let deleted = lifecycle
        .purge_expired_students(date(2023, 1, 1))
        .await
        .unwrap();

    assert_eq!(deleted, 1);
    assert!(store.student_exists("CS21B001").await.unwrap());
    assert!(!store.student_exists("CS21B002").await.unwrap());
}

#[tokio::test]
async fn retention_keeps_day_365_and_drops_day_366() {
    let store = test_store().await;
    let lifecycle = LifecycleService::new(store.clone());
    let today = date(2024, 3, 15);

    seed_student(&store, "CS21B001", "21-30").await;

    let day_365 = today - chrono::Days::new(365);
    let day_366 = today - chrono::Days::new(366);
    for d in [day_365, day_366, today] {
        store
            .insert_attendance_if_absent("CS21B001", d, AttendanceStatus::Present, None)
            .await
            .unwrap();
    }

    let deleted = lifecycle.purge_old_attendance(today, 365).await.unwrap();
    assert_eq!(deleted, 1);

    let remaining = attendance_for(&store, "CS21B001").await;
    let dates: Vec<NaiveDate> = remaining.into_iter().map(|(d, _)| d).collect();
    assert_eq!(dates, vec![day_365, today]);
}
