// src/models/feedback.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Votes and comments stored under `feedback_{assessmentId}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub upvotes: u32,
    pub downvotes: u32,
    pub comments: Vec<FeedbackComment>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackComment {
    pub id: String,
    pub author: String,
    /// Sanitized HTML.
    pub text: String,
    pub date: DateTime<Utc>,
}

/// DTO for adding a comment.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(
        min = 1,
        max = 1000,
        message = "Comment must be between 1 and 1000 characters"
    ))]
    pub text: String,
}

/// DTO for e-mailing a result summary.
#[derive(Debug, Deserialize, Validate)]
pub struct ShareResultRequest {
    #[validate(email(message = "Please enter an email address to share results."))]
    pub email: String,
}
