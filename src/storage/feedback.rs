// src/storage/feedback.rs

use super::{JsonStore, keys};
use crate::{error::AppError, models::feedback::Feedback};

#[derive(Clone)]
pub struct FeedbackStore {
    json: JsonStore,
}

impl FeedbackStore {
    pub fn new(json: JsonStore) -> Self {
        Self { json }
    }

    pub async fn get(&self, assessment_id: &str) -> Result<Feedback, AppError> {
        self.json
            .load_or_default(&keys::feedback(assessment_id))
            .await
    }

    pub async fn update<F>(&self, assessment_id: &str, f: F) -> Result<Feedback, AppError>
    where
        F: FnOnce(&mut Feedback) + Send,
    {
        self.json
            .update(&keys::feedback(assessment_id), |feedback: &mut Feedback| {
                f(feedback);
                Ok(feedback.clone())
            })
            .await
    }
}
