// src/storage/history.rs

use super::{JsonStore, keys};
use crate::{error::AppError, models::history::HistoryEntry};

/// Append-only `assessmentHistory` list.
#[derive(Clone)]
pub struct HistoryStore {
    json: JsonStore,
}

impl HistoryStore {
    pub fn new(json: JsonStore) -> Self {
        Self { json }
    }

    pub async fn append(&self, entry: HistoryEntry) -> Result<(), AppError> {
        self.json
            .update(keys::ASSESSMENT_HISTORY, move |list: &mut Vec<HistoryEntry>| {
                list.push(entry);
                Ok(())
            })
            .await
    }

    pub async fn list(&self) -> Result<Vec<HistoryEntry>, AppError> {
        self.json.load_or_default(keys::ASSESSMENT_HISTORY).await
    }

    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<HistoryEntry>, AppError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|h| h.user_id == user_id)
            .collect())
    }
}
