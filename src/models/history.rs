// src/models/history.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Selected option index per question id.
pub type Answers = BTreeMap<String, usize>;

/// One completed attempt, appended to `assessmentHistory`. Never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub user_id: String,
    pub assessment_id: String,
    pub assessment_title: String,
    /// Percentage, 0–100.
    pub score: u32,
    /// Seconds between start and completion.
    pub time_spent: u64,
    pub completed_at: DateTime<Utc>,
    pub answers: Answers,
}
