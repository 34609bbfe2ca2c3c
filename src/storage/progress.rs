// src/storage/progress.rs

use super::{JsonStore, keys};
use crate::{error::AppError, models::course::CompletedLessons};

/// Course purchases and lesson completion, per user.
#[derive(Clone)]
pub struct ProgressStore {
    json: JsonStore,
}

impl ProgressStore {
    pub fn new(json: JsonStore) -> Self {
        Self { json }
    }

    pub async fn purchased_courses(&self, user_id: &str) -> Result<Vec<i64>, AppError> {
        self.json
            .load_or_default(&keys::purchased_courses(user_id))
            .await
    }

    /// Returns `false` if the course was already purchased.
    pub async fn add_purchase(&self, user_id: &str, course_id: i64) -> Result<bool, AppError> {
        self.json
            .update(&keys::purchased_courses(user_id), |ids: &mut Vec<i64>| {
                if ids.contains(&course_id) {
                    return Ok(false);
                }
                ids.push(course_id);
                Ok(true)
            })
            .await
    }

    pub async fn completed_lessons(
        &self,
        user_id: &str,
        course_id: i64,
    ) -> Result<CompletedLessons, AppError> {
        self.json
            .load_or_default(&keys::completed_lessons(user_id, course_id))
            .await
    }

    pub async fn mark_completed(
        &self,
        user_id: &str,
        course_id: i64,
        lesson_id: i64,
    ) -> Result<CompletedLessons, AppError> {
        self.json
            .update(
                &keys::completed_lessons(user_id, course_id),
                |lessons: &mut CompletedLessons| {
                    lessons.insert(lesson_id, true);
                    Ok(lessons.clone())
                },
            )
            .await
    }
}
