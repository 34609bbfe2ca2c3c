// src/models/course.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::Url;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: i64,
    pub title: String,
    pub duration: String,
    pub video_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseModule {
    pub id: i64,
    pub title: String,
    pub duration: String,
    pub lessons: Vec<Lesson>,
}

/// A course in the catalogue (`courses` key).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub instructor: String,
    pub duration: String,
    pub level: String,
    pub is_paid: bool,
    pub price: f64,
    pub thumbnail: String,
    pub modules: Vec<CourseModule>,
}

impl Course {
    pub fn lesson_count(&self) -> usize {
        self.modules.iter().map(|m| m.lessons.len()).sum()
    }
}

/// Lesson id → completed flag, stored under `completedLessons_{userId}_{courseId}`.
pub type CompletedLessons = BTreeMap<i64, bool>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonStatus {
    pub id: i64,
    pub title: String,
    pub completed: bool,
    pub accessible: bool,
}

/// Per-user view of a course.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgress {
    pub course_id: i64,
    pub purchased: bool,
    /// Rounded percentage of completed lessons.
    pub progress: u32,
    pub completed_count: usize,
    pub total_lessons: usize,
    pub lessons: Vec<LessonStatus>,
}

/// DTO for creating a course (admin).
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 5000))]
    pub description: String,
    #[validate(length(min = 1, max = 100))]
    pub instructor: String,
    #[validate(length(min = 1, max = 50))]
    pub duration: String,
    #[validate(custom(function = validate_level))]
    pub level: String,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub price: f64,
    #[validate(length(min = 1, max = 500), custom(function = validate_url_string))]
    pub thumbnail: String,
    #[serde(default)]
    #[validate(nested)]
    pub modules: Vec<CreateModuleRequest>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateModuleRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 50))]
    pub duration: String,
    #[validate(nested)]
    pub lessons: Vec<CreateLessonRequest>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLessonRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 50))]
    pub duration: String,
    #[validate(length(min = 1, max = 500), custom(function = validate_url_string))]
    pub video_url: String,
}

fn validate_level(level: &str) -> Result<(), validator::ValidationError> {
    match level {
        "beginner" | "intermediate" | "advanced" => Ok(()),
        _ => Err(validator::ValidationError::new("invalid_level")),
    }
}

/// Validates that a string is a correctly formatted URL.
fn validate_url_string(url: &str) -> Result<(), validator::ValidationError> {
    if Url::parse(url).is_err() {
        return Err(validator::ValidationError::new("invalid_url"));
    }
    Ok(())
}
