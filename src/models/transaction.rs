// src/models/transaction.rs

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Refunded,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Refunded => "refunded",
            TransactionStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(TransactionStatus::Pending),
            "completed" => Some(TransactionStatus::Completed),
            "refunded" => Some(TransactionStatus::Refunded),
            "failed" => Some(TransactionStatus::Failed),
            _ => None,
        }
    }
}

/// A simulated payment record, appended to `transactions`.
/// Only `status` is ever changed after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    pub assessment_id: String,
    pub amount: f64,
    pub status: TransactionStatus,
    pub date: DateTime<Utc>,
    pub description: String,
}

impl Transaction {
    pub fn new_id() -> String {
        format!("txn_{}", uuid::Uuid::new_v4().simple())
    }

    /// ISO-8601 form used for prefix filtering (`2024-05-01T...Z`).
    pub fn date_string(&self) -> String {
        self.date.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Query parameters for the admin ledger.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionListParams {
    /// `all` or a status name.
    pub status: Option<String>,
    /// Case-insensitive substring of the user id.
    pub user: Option<String>,
    /// Prefix of the ISO date, e.g. `2024-05` or `2024-05-01`.
    pub date: Option<String>,
}

/// Ledger totals for the admin payments view.
#[derive(Debug, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummary {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
    pub refunded: usize,
    pub failed: usize,
    /// Sum of completed amounts.
    pub revenue: f64,
}
