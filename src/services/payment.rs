// src/services/payment.rs

//! Mock payment funnel and admin ledger rules.

use argon2::password_hash::rand_core::{OsRng, RngCore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    models::{
        assessment::Assessment,
        transaction::{Transaction, TransactionListParams, TransactionStatus, TransactionSummary},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentCategory {
    Cards,
    Upi,
    Wallets,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Gpay,
    Phonepay,
    Paytm,
    OtherUpiQr,
    WalletA,
    WalletB,
}

impl PaymentCategory {
    pub fn methods(&self) -> &'static [PaymentMethod] {
        match self {
            PaymentCategory::Cards => &[PaymentMethod::CreditCard, PaymentMethod::DebitCard],
            PaymentCategory::Upi => &[
                PaymentMethod::Gpay,
                PaymentMethod::Phonepay,
                PaymentMethod::Paytm,
                PaymentMethod::OtherUpiQr,
            ],
            PaymentCategory::Wallets => &[PaymentMethod::WalletA, PaymentMethod::WalletB],
        }
    }
}

impl PaymentMethod {
    pub fn category(&self) -> PaymentCategory {
        match self {
            PaymentMethod::CreditCard | PaymentMethod::DebitCard => PaymentCategory::Cards,
            PaymentMethod::Gpay
            | PaymentMethod::Phonepay
            | PaymentMethod::Paytm
            | PaymentMethod::OtherUpiQr => PaymentCategory::Upi,
            PaymentMethod::WalletA | PaymentMethod::WalletB => PaymentCategory::Wallets,
        }
    }
}

/// Exact, case-sensitive comparison against the assessment's coupon.
pub fn coupon_matches(assessment: &Assessment, code: &str) -> bool {
    assessment.coupon().is_some_and(|coupon| coupon == code)
}

/// Zero-amount, already completed transaction granted by a coupon.
pub fn coupon_transaction(user_id: &str, assessment: &Assessment, now: DateTime<Utc>) -> Transaction {
    Transaction {
        id: Transaction::new_id(),
        user_id: user_id.to_string(),
        assessment_id: assessment.id.clone(),
        amount: 0.0,
        status: TransactionStatus::Completed,
        date: now,
        description: format!("{} (Coupon Access)", assessment.title),
    }
}

/// Pending transaction awaiting admin confirmation.
pub fn pending_transaction(user_id: &str, assessment: &Assessment, now: DateTime<Utc>) -> Transaction {
    Transaction {
        id: Transaction::new_id(),
        user_id: user_id.to_string(),
        assessment_id: assessment.id.clone(),
        amount: assessment.price.max(0.0),
        status: TransactionStatus::Pending,
        date: now,
        description: format!("{} Payment", assessment.title),
    }
}

/// A made-up incoming payment for exercising the admin ledger.
pub fn simulated_incoming(now: DateTime<Utc>) -> Transaction {
    let user_no = OsRng.next_u32() % 10_000;
    let assessment_no = OsRng.next_u32() % 100;
    // 5.00 ..= 50.00, in cents
    let cents = 500 + OsRng.next_u32() % 4_501;
    let assessment_id = format!("assessment_{}", assessment_no);

    Transaction {
        id: Transaction::new_id(),
        user_id: format!("user_{}", user_no),
        assessment_id: assessment_id.clone(),
        amount: f64::from(cents) / 100.0,
        status: TransactionStatus::Pending,
        date: now,
        description: format!("Simulated Payment for Assessment {}", assessment_id),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerAction {
    Confirm,
    Refund,
}

/// `pending → completed` on confirm, `completed → refunded` on refund.
pub fn apply_action(
    action: LedgerAction,
    current: TransactionStatus,
) -> Result<TransactionStatus, AppError> {
    match (action, current) {
        (LedgerAction::Confirm, TransactionStatus::Pending) => Ok(TransactionStatus::Completed),
        (LedgerAction::Refund, TransactionStatus::Completed) => Ok(TransactionStatus::Refunded),
        (LedgerAction::Confirm, other) => Err(AppError::Conflict(format!(
            "Only pending transactions can be confirmed (status is {})",
            other.as_str()
        ))),
        (LedgerAction::Refund, other) => Err(AppError::Conflict(format!(
            "Only completed transactions can be refunded (status is {})",
            other.as_str()
        ))),
    }
}

/// Parsed ledger filters.
#[derive(Debug, Default)]
pub struct LedgerFilter {
    status: Option<TransactionStatus>,
    user: String,
    date: String,
}

impl LedgerFilter {
    pub fn from_params(params: &TransactionListParams) -> Result<Self, AppError> {
        let status = match params.status.as_deref().map(str::trim) {
            None | Some("") | Some("all") => None,
            Some(s) => Some(
                TransactionStatus::parse(s)
                    .ok_or_else(|| AppError::BadRequest(format!("Unknown status '{}'", s)))?,
            ),
        };

        Ok(Self {
            status,
            user: params.user.clone().unwrap_or_default().to_lowercase(),
            date: params.date.clone().unwrap_or_default(),
        })
    }

    pub fn matches(&self, txn: &Transaction) -> bool {
        let matches_status = self.status.is_none_or(|s| txn.status == s);
        let matches_user = self.user.is_empty() || txn.user_id.to_lowercase().contains(&self.user);
        let matches_date = self.date.is_empty() || txn.date_string().starts_with(&self.date);
        matches_status && matches_user && matches_date
    }
}

pub fn summarize(transactions: &[Transaction]) -> TransactionSummary {
    let mut summary = TransactionSummary {
        total: transactions.len(),
        ..Default::default()
    };

    for txn in transactions {
        match txn.status {
            TransactionStatus::Pending => summary.pending += 1,
            TransactionStatus::Completed => {
                summary.completed += 1;
                summary.revenue += txn.amount;
            }
            TransactionStatus::Refunded => summary.refunded += 1,
            TransactionStatus::Failed => summary.failed += 1,
        }
    }

    summary.revenue = (summary.revenue * 100.0).round() / 100.0;
    summary
}
