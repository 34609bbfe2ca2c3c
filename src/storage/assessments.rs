// src/storage/assessments.rs

use super::{JsonStore, keys};
use crate::{error::AppError, models::assessment::Assessment};

/// The `assessments` list. No versioning; deletes do not cascade.
#[derive(Clone)]
pub struct AssessmentStore {
    json: JsonStore,
}

impl AssessmentStore {
    pub fn new(json: JsonStore) -> Self {
        Self { json }
    }

    pub async fn list(&self) -> Result<Vec<Assessment>, AppError> {
        self.json.load_or_default(keys::ASSESSMENTS).await
    }

    pub async fn get(&self, id: &str) -> Result<Option<Assessment>, AppError> {
        Ok(self.list().await?.into_iter().find(|a| a.id == id))
    }

    /// Replaces the assessment with the same id, or appends it.
    /// Returns `true` when it was newly created.
    pub async fn upsert(&self, assessment: Assessment) -> Result<bool, AppError> {
        self.json
            .update(keys::ASSESSMENTS, move |list: &mut Vec<Assessment>| {
                match list.iter_mut().find(|a| a.id == assessment.id) {
                    Some(existing) => {
                        *existing = assessment;
                        Ok(false)
                    }
                    None => {
                        list.push(assessment);
                        Ok(true)
                    }
                }
            })
            .await
    }

    /// Applies `f` to the stored assessment in one read-modify-write cycle.
    pub async fn modify<F>(&self, id: &str, f: F) -> Result<Assessment, AppError>
    where
        F: FnOnce(&mut Assessment) + Send,
    {
        self.json
            .update(keys::ASSESSMENTS, |list: &mut Vec<Assessment>| {
                let assessment = list
                    .iter_mut()
                    .find(|a| a.id == id)
                    .ok_or(AppError::NotFound("Assessment not found".to_string()))?;
                f(assessment);
                Ok(assessment.clone())
            })
            .await
    }

    /// Returns `false` if nothing was deleted.
    pub async fn delete(&self, id: &str) -> Result<bool, AppError> {
        self.json
            .update(keys::ASSESSMENTS, |list: &mut Vec<Assessment>| {
                let before = list.len();
                list.retain(|a| a.id != id);
                Ok(list.len() != before)
            })
            .await
    }
}
