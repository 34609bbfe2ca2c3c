// src/models/assessment.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::DEFAULT_PASSING_SCORE;

/// Scoring style of an assessment or of a single question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentType {
    #[default]
    Likert,
    PointBased,
}

impl AssessmentType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "likert" => Some(AssessmentType::Likert),
            "point_based" => Some(AssessmentType::PointBased),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerType {
    #[default]
    None,
    FullTest,
    PerQuestion,
}

fn default_points() -> u32 {
    1
}

fn default_passing_score() -> u32 {
    DEFAULT_PASSING_SCORE
}

/// A single question. Field names follow the stored/imported JSON format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(default)]
    pub id: String,

    pub text: String,

    #[serde(rename = "type", default)]
    pub question_type: AssessmentType,

    #[serde(default)]
    pub options: Vec<String>,

    /// Point value (point-based questions only).
    #[serde(default = "default_points")]
    pub points: u32,

    /// Per-question time limit in seconds; 0 means none.
    #[serde(default)]
    pub time_limit: u32,

    /// Index of the correct option (point-based questions only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<usize>,

    /// Explicit points per option for Likert questions.
    /// Without it the selected index doubles as the points earned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_points: Option<Vec<u32>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub id: String,
    pub title: String,
    pub description: String,

    #[serde(rename = "type", default)]
    pub assessment_type: AssessmentType,

    #[serde(default)]
    pub questions: Vec<Question>,

    #[serde(default)]
    pub timer_type: TimerType,

    /// Minutes. Full-test duration, or the per-question fallback.
    #[serde(default)]
    pub total_time: u32,

    #[serde(default = "default_passing_score")]
    pub passing_score: u32,

    #[serde(default)]
    pub is_free: bool,

    #[serde(default)]
    pub coupon_code: Option<String>,

    #[serde(default)]
    pub price: f64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Assessment {
    /// The coupon code, ignoring blank values saved by the admin form.
    pub fn coupon(&self) -> Option<&str> {
        self.coupon_code
            .as_deref()
            .filter(|code| !code.trim().is_empty())
    }

    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }
}

/// Question as sent to test takers (no answer key).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    pub id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: AssessmentType,
    pub options: Vec<String>,
    pub points: u32,
    pub time_limit: u32,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id.clone(),
            text: q.text.clone(),
            question_type: q.question_type,
            options: q.options.clone(),
            points: q.points,
            time_limit: q.time_limit,
        }
    }
}

/// Assessment as listed on the dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicAssessment {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub assessment_type: AssessmentType,
    pub question_count: usize,
    pub questions: Vec<PublicQuestion>,
    pub timer_type: TimerType,
    pub total_time: u32,
    pub passing_score: u32,
    pub is_free: bool,
    pub has_coupon: bool,
    pub price: f64,
}

impl From<&Assessment> for PublicAssessment {
    fn from(a: &Assessment) -> Self {
        Self {
            id: a.id.clone(),
            title: a.title.clone(),
            description: a.description.clone(),
            assessment_type: a.assessment_type,
            question_count: a.questions.len(),
            questions: a.questions.iter().map(PublicQuestion::from).collect(),
            timer_type: a.timer_type,
            total_time: a.total_time,
            passing_score: a.passing_score,
            is_free: a.is_free,
            has_coupon: a.coupon().is_some(),
            price: a.price,
        }
    }
}

/// DTO for creating or replacing an assessment (admin).
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpsertAssessmentRequest {
    #[validate(length(min = 1, max = 200, message = "Title is required."))]
    pub title: String,
    #[validate(length(min = 1, max = 5000, message = "Description is required."))]
    pub description: String,
    #[serde(rename = "type", default)]
    pub assessment_type: AssessmentType,
    #[serde(default)]
    #[validate(custom(function = validate_questions))]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub timer_type: TimerType,
    #[serde(default)]
    #[validate(range(max = 1440))]
    pub total_time: u32,
    #[serde(default = "default_passing_score")]
    #[validate(range(max = 100, message = "Passing score must be between 0 and 100."))]
    pub passing_score: u32,
    #[serde(default)]
    pub is_free: bool,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub coupon_code: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "Price cannot be negative."))]
    pub price: f64,
}

pub(crate) fn validate_questions(questions: &[Question]) -> Result<(), validator::ValidationError> {
    for q in questions {
        if q.text.trim().is_empty() {
            return Err(validator::ValidationError::new("question_text_required"));
        }
        if q.options.is_empty() {
            return Err(validator::ValidationError::new("options_cannot_be_empty"));
        }
        if q.question_type == AssessmentType::PointBased {
            match q.correct_answer {
                Some(index) if index < q.options.len() => {}
                _ => return Err(validator::ValidationError::new("correct_answer_out_of_range")),
            }
        }
        if let Some(points) = &q.option_points {
            if points.len() != q.options.len() {
                return Err(validator::ValidationError::new("option_points_mismatch"));
            }
        }
    }
    Ok(())
}

/// DTO for uploading a question file.
#[derive(Debug, Deserialize, Validate)]
pub struct ImportRequest {
    #[validate(length(min = 1, max = 255, message = "A file name is required."))]
    pub filename: String,
    #[validate(length(max = 2_000_000, message = "File is too large."))]
    pub content: String,
}

impl UpsertAssessmentRequest {
    /// Builds the stored assessment. Questions without an id get `q{n}`.
    pub fn into_assessment(
        self,
        id: String,
        created_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Assessment {
        let questions = self
            .questions
            .into_iter()
            .enumerate()
            .map(|(i, mut q)| {
                if q.id.trim().is_empty() {
                    q.id = format!("q{}", i + 1);
                }
                q
            })
            .collect();

        Assessment {
            id,
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            assessment_type: self.assessment_type,
            questions,
            timer_type: self.timer_type,
            total_time: self.total_time,
            passing_score: self.passing_score,
            is_free: self.is_free,
            coupon_code: self.coupon_code.filter(|c| !c.trim().is_empty()),
            price: if self.is_free { 0.0 } else { self.price },
            created_at,
            updated_at: now,
        }
    }
}

pub fn new_assessment_id() -> String {
    format!("assessment_{}", uuid::Uuid::new_v4().simple())
}
