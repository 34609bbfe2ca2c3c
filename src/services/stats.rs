// src/services/stats.rs

//! Dashboard and analytics aggregates.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::{
    config::{PROGRESS_WINDOW_DAYS, RECENT_HISTORY_LIMIT},
    models::{
        assessment::Assessment,
        history::HistoryEntry,
        transaction::{Transaction, TransactionSummary},
    },
    services::{payment, scoring::ScoreBand},
};

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyProgress {
    pub date: NaiveDate,
    pub count: usize,
    pub average_score: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_assessments: usize,
    pub completed_assessments: usize,
    pub average_score: u32,
    pub average_label: &'static str,
    pub recent: Vec<HistoryEntry>,
    pub progress: Vec<DailyProgress>,
}

fn rounded_average<'a>(scores: impl Iterator<Item = &'a HistoryEntry>) -> u32 {
    let (sum, count) = scores.fold((0u64, 0u64), |(sum, count), h| {
        (sum + u64::from(h.score), count + 1)
    });
    if count == 0 {
        return 0;
    }
    (sum as f64 / count as f64).round() as u32
}

/// Stats for one user's history. `today` closes the progress window.
pub fn dashboard(
    total_assessments: usize,
    mut history: Vec<HistoryEntry>,
    today: NaiveDate,
) -> DashboardStats {
    let average_score = rounded_average(history.iter());

    let progress = (0..PROGRESS_WINDOW_DAYS)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);
            let day: Vec<&HistoryEntry> = history
                .iter()
                .filter(|h| h.completed_at.date_naive() == date)
                .collect();
            DailyProgress {
                date,
                count: day.len(),
                average_score: rounded_average(day.into_iter()),
            }
        })
        .collect();

    let completed_assessments = history.len();
    history.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
    history.truncate(RECENT_HISTORY_LIMIT);

    DashboardStats {
        total_assessments,
        completed_assessments,
        average_score,
        average_label: ScoreBand::from_score(average_score).label(),
        recent: history,
        progress,
    }
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentStat {
    pub assessment_id: String,
    pub title: String,
    pub attempts: usize,
    pub average_score: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub total_users: usize,
    pub total_assessments: usize,
    pub total_courses: usize,
    pub total_attempts: usize,
    pub assessment_stats: Vec<AssessmentStat>,
    pub transactions: TransactionSummary,
}

/// Admin overview. History for deleted assessments is still counted,
/// under the title recorded at completion time.
pub fn analytics(
    total_users: usize,
    total_courses: usize,
    assessments: &[Assessment],
    history: &[HistoryEntry],
    transactions: &[Transaction],
) -> Analytics {
    let mut grouped: BTreeMap<&str, Vec<&HistoryEntry>> = BTreeMap::new();
    for entry in history {
        grouped.entry(entry.assessment_id.as_str()).or_default().push(entry);
    }

    let assessment_stats = grouped
        .into_iter()
        .map(|(id, entries)| {
            let title = assessments
                .iter()
                .find(|a| a.id == id)
                .map(|a| a.title.clone())
                .unwrap_or_else(|| entries[0].assessment_title.clone());
            AssessmentStat {
                assessment_id: id.to_string(),
                title,
                attempts: entries.len(),
                average_score: rounded_average(entries.into_iter()),
            }
        })
        .collect();

    Analytics {
        total_users,
        total_assessments: assessments.len(),
        total_courses,
        total_attempts: history.len(),
        assessment_stats,
        transactions: payment::summarize(transactions),
    }
}
