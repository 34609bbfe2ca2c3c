// src/storage/mod.rs

//! Persistence behind typed stores.
//!
//! Every entity lives as a JSON blob under a string key in a `KeyValueStore`.
//! The backend (memory, JSON file, Postgres) is chosen at startup; the typed
//! stores on top of it never know which one they talk to.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::Mutex;

use crate::error::AppError;

pub mod assessments;
pub mod courses;
pub mod feedback;
pub mod file;
pub mod history;
pub mod memory;
pub mod postgres;
pub mod progress;
pub mod transactions;
pub mod users;

pub use assessments::AssessmentStore;
pub use courses::CourseStore;
pub use feedback::FeedbackStore;
pub use history::HistoryStore;
pub use progress::ProgressStore;
pub use transactions::TransactionStore;
pub use users::UserStore;

/// Storage keys.
pub mod keys {
    pub const USERS: &str = "users";
    pub const ASSESSMENTS: &str = "assessments";
    pub const ASSESSMENT_HISTORY: &str = "assessmentHistory";
    pub const TRANSACTIONS: &str = "transactions";
    pub const COURSES: &str = "courses";

    /// Signed-in record of one user.
    pub fn session(user_id: &str) -> String {
        format!("user_{}", user_id)
    }

    pub fn completed_lessons(user_id: &str, course_id: i64) -> String {
        format!("completedLessons_{}_{}", user_id, course_id)
    }

    pub fn purchased_courses(user_id: &str) -> String {
        format!("purchasedCourses_{}", user_id)
    }

    pub fn feedback(assessment_id: &str) -> String {
        format!("feedback_{}", assessment_id)
    }
}

/// String-keyed blob storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn set(&self, key: &str, value: String) -> Result<(), AppError>;
    async fn remove(&self, key: &str) -> Result<(), AppError>;
}

pub type SharedStore = Arc<dyn KeyValueStore>;

/// JSON (de)serialization over a `KeyValueStore`.
///
/// Writes are serialized through one lock so that read-modify-write cycles
/// issued by this process do not interleave.
#[derive(Clone)]
pub struct JsonStore {
    backend: SharedStore,
    write_lock: Arc<Mutex<()>>,
}

impl JsonStore {
    pub fn new(backend: SharedStore) -> Self {
        Self {
            backend,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AppError> {
        match self.backend.get(key).await? {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw).map(Some).map_err(|e| {
                tracing::error!("Malformed JSON under key '{}': {:?}", key, e);
                AppError::InternalServerError(format!("Corrupted data under '{}': {}", key, e))
            }),
        }
    }

    pub async fn load_or_default<T: DeserializeOwned + Default>(
        &self,
        key: &str,
    ) -> Result<T, AppError> {
        Ok(self.load(key).await?.unwrap_or_default())
    }

    pub async fn save<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        self.write(key, value).await
    }

    pub async fn remove(&self, key: &str) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        self.backend.remove(key).await
    }

    /// Loads the value under `key` (default if absent), applies `f` and writes
    /// it back. Nothing is written when `f` fails.
    pub async fn update<T, R, F>(&self, key: &str, f: F) -> Result<R, AppError>
    where
        T: DeserializeOwned + Serialize + Default + Send + Sync,
        R: Send,
        F: FnOnce(&mut T) -> Result<R, AppError> + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut value: T = self.load_or_default(key).await?;
        let result = f(&mut value)?;
        self.write(key, &value).await?;
        Ok(result)
    }

    async fn write<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<(), AppError> {
        let raw = serde_json::to_string(value)
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;
        self.backend.set(key, raw).await
    }
}

/// All typed stores, sharing one backend.
#[derive(Clone)]
pub struct Stores {
    pub users: UserStore,
    pub assessments: AssessmentStore,
    pub history: HistoryStore,
    pub transactions: TransactionStore,
    pub progress: ProgressStore,
    pub feedback: FeedbackStore,
    pub courses: CourseStore,
}

impl Stores {
    pub fn new(backend: SharedStore) -> Self {
        let json = JsonStore::new(backend);
        Self {
            users: UserStore::new(json.clone()),
            assessments: AssessmentStore::new(json.clone()),
            history: HistoryStore::new(json.clone()),
            transactions: TransactionStore::new(json.clone()),
            progress: ProgressStore::new(json.clone()),
            feedback: FeedbackStore::new(json.clone()),
            courses: CourseStore::new(json),
        }
    }

    /// In-memory stores, for tests and throwaway runs.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(memory::MemoryStore::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn malformed_blob_is_reported_not_panicked() {
        let backend = Arc::new(memory::MemoryStore::default());
        backend
            .set(keys::TRANSACTIONS, "{not json".to_string())
            .await
            .unwrap();

        let json = JsonStore::new(backend);
        let result: Result<Option<Vec<u32>>, _> = json.load(keys::TRANSACTIONS).await;

        match result {
            Err(AppError::InternalServerError(msg)) => assert!(msg.contains("transactions")),
            other => panic!("expected internal error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn failed_update_writes_nothing() {
        let json = JsonStore::new(Arc::new(memory::MemoryStore::default()));
        json.save("numbers", &vec![1u32]).await.unwrap();

        let result: Result<(), AppError> = json
            .update("numbers", |numbers: &mut Vec<u32>| {
                numbers.push(2);
                Err(AppError::BadRequest("nope".to_string()))
            })
            .await;
        assert!(result.is_err());

        let stored: Vec<u32> = json.load_or_default("numbers").await.unwrap();
        assert_eq!(stored, vec![1]);
    }

    #[test]
    fn keys_follow_storage_layout() {
        assert_eq!(keys::completed_lessons("42", 1), "completedLessons_42_1");
        assert_eq!(keys::purchased_courses("42"), "purchasedCourses_42");
        assert_eq!(keys::feedback("a1"), "feedback_a1");
        assert_eq!(keys::session("42"), "user_42");
    }
}
