use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;

use rollcall::clients::LocalPhotoStore;
use rollcall::clock::FixedClock;
use rollcall::config::Config;
use rollcall::db::Store;
use rollcall::scheduler::Scheduler;
use rollcall::state::SharedState;

#[tokio::test]
async fn scheduler_starts_and_stops_cleanly() {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.scheduler.enabled = true;
    let scheduler_config = config.scheduler.clone();

    let store = Store::new(&config.general.database_path)
        .await
        .expect("Failed to open in-memory store");
    let photos = Arc::new(LocalPhotoStore::new(
        std::env::temp_dir().join("rollcall-scheduler-test-photos"),
    ));
    let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
    let state = SharedState::with_parts(
        config,
        store,
        Some(photos),
        Arc::new(FixedClock::at(today)),
    )
    .expect("Failed to wire state");

    let scheduler = Arc::new(Scheduler::new(state, scheduler_config));
    assert!(!scheduler.is_running().await);

    let runner = Arc::clone(&scheduler);
    let handle = tokio::spawn(async move { runner.start().await });

    // start() flips the flag before registering jobs; give it a moment.
    let mut started = false;
    for _ in 0..100 {
        if scheduler.is_running().await {
            started = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(started, "scheduler never reported running");

    scheduler.stop().await;
    assert!(!scheduler.is_running().await);

    // The cron runner polls its flag once a second; it must wind down well
    // within this window once stopped.
    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("scheduler did not shut down after stop");
    result.unwrap().unwrap();
}
