// src/storage/courses.rs

use super::{JsonStore, keys};
use crate::{error::AppError, models::course::Course};

#[derive(Clone)]
pub struct CourseStore {
    json: JsonStore,
}

impl CourseStore {
    pub fn new(json: JsonStore) -> Self {
        Self { json }
    }

    pub async fn list(&self) -> Result<Vec<Course>, AppError> {
        self.json.load_or_default(keys::COURSES).await
    }

    pub async fn get(&self, id: i64) -> Result<Option<Course>, AppError> {
        Ok(self.list().await?.into_iter().find(|c| c.id == id))
    }

    /// Writes `catalog` only when no course has been stored yet.
    pub async fn seed_if_empty(&self, catalog: Vec<Course>) -> Result<bool, AppError> {
        self.json
            .update(keys::COURSES, move |courses: &mut Vec<Course>| {
                if !courses.is_empty() {
                    return Ok(false);
                }
                *courses = catalog;
                Ok(true)
            })
            .await
    }

    /// Appends a course, assigning the next free id. `build` receives that id.
    pub async fn insert_with<F>(&self, build: F) -> Result<Course, AppError>
    where
        F: FnOnce(i64) -> Course + Send,
    {
        self.json
            .update(keys::COURSES, |courses: &mut Vec<Course>| {
                let next_id = courses.iter().map(|c| c.id).max().unwrap_or(0) + 1;
                let course = build(next_id);
                courses.push(course.clone());
                Ok(course)
            })
            .await
    }
}
