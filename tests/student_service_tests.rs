use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use rollcall::clients::{LocalPhotoStore, PhotoStore, PhotoStoreError, StoredPhoto};
use rollcall::clock::FixedClock;
use rollcall::config::Config;
use rollcall::db::{NewStudent, Store};
use rollcall::services::{CreateStudent, SeaOrmStudentService, StudentError, StudentService};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn test_store() -> Store {
    Store::new("sqlite::memory:")
        .await
        .expect("Failed to open in-memory store")
}

fn test_photo_dir() -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "rollcall-service-test-photos-{}",
        rollcall::db::repositories::admin::generate_token()
    ))
}

fn stored_photo_count(photo_dir: &std::path::Path) -> usize {
    std::fs::read_dir(photo_dir).map_or(0, Iterator::count)
}

/// A photo store that sneaks a row for the same roll into the database while
/// the upload is in flight, reproducing a concurrent create that wins the
/// primary-key race after the duplicate pre-check has already passed.
struct RacingPhotoStore {
    inner: LocalPhotoStore,
    store: Store,
    roll: String,
}

#[async_trait]
impl PhotoStore for RacingPhotoStore {
    async fn upload(&self, bytes: Vec<u8>, filename: &str) -> Result<StoredPhoto, PhotoStoreError> {
        let inserted = self
            .store
            .insert_student(NewStudent {
                roll: self.roll.clone(),
                name: "First Writer".to_string(),
                branch: "CSE".to_string(),
                dob: date(2003, 1, 1),
                issue_valid: "21-24".to_string(),
                pin_hash: "not-a-real-hash".to_string(),
                photo_url: "/photos/winner.jpg".to_string(),
                photo_handle: "winner.jpg".to_string(),
                issued_at: date(2024, 3, 15),
            })
            .await
            .map_err(|e| PhotoStoreError::Upload(e.to_string()))?;
        assert!(inserted, "the racing row should land first");

        self.inner.upload(bytes, filename).await
    }

    async fn delete(&self, handle: &str) -> Result<(), PhotoStoreError> {
        self.inner.delete(handle).await
    }
}

#[tokio::test]
async fn lost_create_race_deletes_the_uploaded_photo() {
    let store = test_store().await;
    let photo_dir = test_photo_dir();
    let photos = Arc::new(RacingPhotoStore {
        inner: LocalPhotoStore::new(photo_dir.clone()),
        store: store.clone(),
        roll: "CS21B001".to_string(),
    });

    let mut config = Config::default();
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    let service = SeaOrmStudentService::new(
        store.clone(),
        photos,
        Arc::new(FixedClock::at(date(2024, 3, 15))),
        config.security,
    );

    let result = service
        .create(CreateStudent {
            roll: "cs21b001".to_string(),
            name: "john doe".to_string(),
            branch: "CSE".to_string(),
            dob: date(2003, 1, 1),
            issue_valid: "21-24".to_string(),
            pin: "1234".to_string(),
            photo_bytes: b"photo bytes".to_vec(),
            photo_filename: "photo.jpg".to_string(),
        })
        .await;

    assert!(matches!(result, Err(StudentError::DuplicateRoll)));

    // The losing upload must not survive as an orphan asset.
    assert_eq!(stored_photo_count(&photo_dir), 0);

    // The winning row is untouched.
    let winner = store.get_student("CS21B001").await.unwrap().unwrap();
    assert_eq!(winner.name, "First Writer");
    assert_eq!(winner.photo_handle, "winner.jpg");
}
