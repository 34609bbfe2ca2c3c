// src/services/session.rs

//! The self-assessment view state machine.
//!
//! `AssessmentSession` is pure: operations take whatever they need from the
//! stores as arguments and return an `Outcome` listing the records to persist
//! and the notices to show. `SessionRegistry` owns the sessions, applies the
//! outcomes and drives the timers.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    error::AppError,
    models::{
        assessment::{Assessment, PublicAssessment, PublicQuestion, TimerType},
        history::{Answers, HistoryEntry},
        transaction::{Transaction, TransactionStatus},
        user::Role,
    },
    services::{
        payment::{self, PaymentCategory, PaymentMethod},
        scoring::{self, ResultSummary},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum View {
    #[default]
    Dashboard,
    Assessment,
    Result,
    Payment,
    PaymentPending,
    Admin,
    AdminPayments,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// A message for the user, returned alongside the new state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// What the ledger says about a user's access to a paid assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    Pending,
    PaymentRequired,
}

impl Access {
    /// Free assessments are always granted; otherwise a completed transaction
    /// wins over a pending one.
    pub fn resolve(assessment: &Assessment, user_id: &str, ledger: &[Transaction]) -> Self {
        if assessment.is_free {
            return Access::Granted;
        }
        let mine = ledger
            .iter()
            .filter(|t| t.user_id == user_id && t.assessment_id == assessment.id);

        let mut access = Access::PaymentRequired;
        for txn in mine {
            match txn.status {
                TransactionStatus::Completed => return Access::Granted,
                TransactionStatus::Pending => access = Access::Pending,
                _ => {}
            }
        }
        access
    }
}

/// Side effects of one operation.
#[derive(Debug, Default)]
pub struct Outcome {
    pub notices: Vec<Notice>,
    pub transaction: Option<Transaction>,
    pub history: Option<HistoryEntry>,
}

impl Outcome {
    fn notice(notice: Notice) -> Self {
        Self {
            notices: vec![notice],
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "index")]
pub enum TimerScope {
    FullTest,
    Question(usize),
}

/// The countdown the current state calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerRequest {
    /// Changes on every start, so a restarted attempt gets a fresh timer.
    pub attempt: u64,
    pub scope: TimerScope,
    pub seconds: u64,
}

#[derive(Debug, Clone)]
pub struct AssessmentSession {
    user_id: String,
    role: Role,
    view: View,
    /// Assessment being taken, or whose result is shown.
    current: Option<Assessment>,
    /// Paid assessment going through the payment funnel.
    selected: Option<Assessment>,
    question_index: usize,
    answers: Answers,
    started_at: Option<DateTime<Utc>>,
    attempt: u64,
    payment_category: Option<PaymentCategory>,
    payment_method: Option<PaymentMethod>,
    result: Option<ResultSummary>,
}

impl AssessmentSession {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
            view: View::Dashboard,
            current: None,
            selected: None,
            question_index: 0,
            answers: Answers::new(),
            started_at: None,
            attempt: 0,
            payment_category: None,
            payment_method: None,
            result: None,
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn set_role(&mut self, role: Role) {
        self.role = role;
    }

    pub fn result(&self) -> Option<&ResultSummary> {
        self.result.as_ref()
    }

    /// Drops all in-progress state.
    fn reset(&mut self) {
        self.current = None;
        self.selected = None;
        self.question_index = 0;
        self.answers.clear();
        self.started_at = None;
        self.payment_category = None;
        self.payment_method = None;
        self.result = None;
    }

    fn begin(&mut self, assessment: Assessment, now: DateTime<Utc>) {
        self.reset();
        self.current = Some(assessment);
        self.started_at = Some(now);
        self.attempt += 1;
        self.view = View::Assessment;
    }

    fn expect_view(&self, view: View, action: &str) -> Result<(), AppError> {
        if self.view != view {
            tracing::warn!(
                "User {} tried to {} from the {:?} view",
                self.user_id,
                action,
                self.view
            );
            return Err(AppError::BadRequest(format!(
                "Cannot {} from the current view",
                action
            )));
        }
        Ok(())
    }

    pub fn start(
        &mut self,
        assessment: Assessment,
        access: Access,
        now: DateTime<Utc>,
    ) -> Result<Outcome, AppError> {
        if assessment.questions.is_empty() {
            return Err(AppError::BadRequest(
                "This assessment has no questions yet.".to_string(),
            ));
        }

        match access {
            Access::Granted if assessment.is_free => {
                self.begin(assessment, now);
                Ok(Outcome::default())
            }
            Access::Granted => {
                self.begin(assessment, now);
                Ok(Outcome::notice(Notice::success(
                    "Assessment already purchased. Starting now!",
                )))
            }
            Access::Pending => {
                self.reset();
                self.selected = Some(assessment);
                self.view = View::PaymentPending;
                Ok(Outcome::notice(Notice::info(
                    "Your payment is pending. Please wait for admin confirmation.",
                )))
            }
            Access::PaymentRequired => {
                self.reset();
                self.selected = Some(assessment);
                self.view = View::Payment;
                Ok(Outcome::default())
            }
        }
    }

    /// Records an answer for the question currently shown.
    pub fn answer(&mut self, question_id: &str, option: usize) -> Result<Outcome, AppError> {
        self.expect_view(View::Assessment, "answer")?;
        let question = self
            .current
            .as_ref()
            .and_then(|a| a.question(self.question_index))
            .ok_or(AppError::NotFound("Question not found".to_string()))?;

        if question.id != question_id {
            return Err(AppError::BadRequest(
                "Only the current question can be answered".to_string(),
            ));
        }
        if option >= question.options.len() {
            return Err(AppError::BadRequest(format!(
                "Option {} is out of range for this question",
                option
            )));
        }

        self.answers.insert(question_id.to_string(), option);
        Ok(Outcome::default())
    }

    /// Moves to the next question, or completes after the last one.
    pub fn next(&mut self, now: DateTime<Utc>) -> Result<Outcome, AppError> {
        self.expect_view(View::Assessment, "advance")?;
        let count = self.current.as_ref().map_or(0, |a| a.questions.len());
        if self.question_index + 1 < count {
            self.question_index += 1;
            Ok(Outcome::default())
        } else {
            self.complete(now)
        }
    }

    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<Outcome, AppError> {
        self.expect_view(View::Assessment, "complete the assessment")?;
        let (Some(assessment), Some(started_at)) = (self.current.as_ref(), self.started_at) else {
            self.back();
            return Err(AppError::BadRequest("No assessment in progress".to_string()));
        };

        let time_spent = (now - started_at).num_seconds().max(0) as u64;
        let summary = scoring::summarize(assessment, &self.answers, time_spent);

        let entry = HistoryEntry {
            user_id: self.user_id.clone(),
            assessment_id: assessment.id.clone(),
            assessment_title: assessment.title.clone(),
            score: summary.score,
            time_spent,
            completed_at: now,
            answers: self.answers.clone(),
        };

        tracing::info!(
            "User {} completed assessment {} with score {}",
            self.user_id,
            assessment.id,
            summary.score
        );

        self.result = Some(summary);
        self.started_at = None;
        self.view = View::Result;

        Ok(Outcome {
            history: Some(entry),
            ..Default::default()
        })
    }

    /// Returns to the dashboard from anywhere, clearing in-progress state.
    pub fn back(&mut self) -> Outcome {
        self.reset();
        self.view = View::Dashboard;
        Outcome::default()
    }

    fn require_admin(&self) -> Result<(), AppError> {
        if self.role != Role::Admin {
            tracing::warn!("User {} denied access to admin views", self.user_id);
            return Err(AppError::Forbidden("Access denied".to_string()));
        }
        Ok(())
    }

    pub fn open_admin(&mut self) -> Result<Outcome, AppError> {
        self.require_admin()?;
        self.reset();
        self.view = View::Admin;
        Ok(Outcome::default())
    }

    pub fn open_admin_payments(&mut self) -> Result<Outcome, AppError> {
        self.require_admin()?;
        self.reset();
        self.view = View::AdminPayments;
        Ok(Outcome::default())
    }

    pub fn select_payment_category(&mut self, category: PaymentCategory) -> Result<Outcome, AppError> {
        self.expect_view(View::Payment, "choose a payment category")?;
        self.payment_category = Some(category);
        self.payment_method = None;
        Ok(Outcome::default())
    }

    pub fn clear_payment_category(&mut self) -> Result<Outcome, AppError> {
        self.expect_view(View::Payment, "change the payment category")?;
        self.payment_category = None;
        self.payment_method = None;
        Ok(Outcome::default())
    }

    pub fn select_payment_method(&mut self, method: PaymentMethod) -> Result<Outcome, AppError> {
        self.expect_view(View::Payment, "choose a payment method")?;
        match self.payment_category {
            Some(category) if method.category() == category => {
                self.payment_method = Some(method);
                Ok(Outcome::default())
            }
            Some(_) => Err(AppError::BadRequest(
                "Payment method does not belong to the selected category".to_string(),
            )),
            None => Err(AppError::BadRequest(
                "Select a payment category first".to_string(),
            )),
        }
    }

    /// A matching coupon records a free completed transaction and starts the
    /// assessment right away.
    pub fn apply_coupon(&mut self, code: &str, now: DateTime<Utc>) -> Result<Outcome, AppError> {
        self.expect_view(View::Payment, "apply a coupon")?;
        let assessment = self
            .selected
            .clone()
            .ok_or(AppError::BadRequest("No assessment selected".to_string()))?;

        if !payment::coupon_matches(&assessment, code) {
            tracing::warn!(
                "User {} entered an invalid coupon for {}",
                self.user_id,
                assessment.id
            );
            return Err(AppError::BadRequest("Invalid coupon code.".to_string()));
        }

        let txn = payment::coupon_transaction(&self.user_id, &assessment, now);
        self.begin(assessment, now);

        Ok(Outcome {
            notices: vec![Notice::success("Coupon applied! Starting assessment...")],
            transaction: Some(txn),
            history: None,
        })
    }

    pub fn simulate_payment(&mut self, now: DateTime<Utc>) -> Result<Outcome, AppError> {
        self.expect_view(View::Payment, "pay")?;
        let Some(assessment) = self.selected.take() else {
            self.back();
            return Err(AppError::BadRequest("No assessment selected".to_string()));
        };
        if self.payment_method.is_none() {
            self.selected = Some(assessment);
            return Err(AppError::BadRequest(
                "Select a payment method first".to_string(),
            ));
        }

        let txn = payment::pending_transaction(&self.user_id, &assessment, now);
        tracing::info!(
            "User {} simulated a payment of {:.2} for {}",
            self.user_id,
            txn.amount,
            assessment.id
        );

        self.payment_category = None;
        self.payment_method = None;
        self.view = View::PaymentPending;

        Ok(Outcome {
            notices: vec![Notice::success(
                "Payment simulated! Awaiting admin confirmation.",
            )],
            transaction: Some(txn),
            history: None,
        })
    }

    /// Timer expiry. A full-test timer completes the attempt, a question
    /// timer forces `next` if that question is still shown.
    pub fn expire(&mut self, scope: TimerScope, now: DateTime<Utc>) -> Result<Outcome, AppError> {
        if self.view != View::Assessment {
            return Ok(Outcome::default());
        }
        let mut outcome = match scope {
            TimerScope::FullTest => self.complete(now)?,
            TimerScope::Question(index) if index == self.question_index => self.next(now)?,
            TimerScope::Question(_) => return Ok(Outcome::default()),
        };
        outcome.notices.insert(0, Notice::info("Time's up!"));
        Ok(outcome)
    }

    /// The timer this state needs, if any.
    pub fn timer_request(&self) -> Option<TimerRequest> {
        if self.view != View::Assessment {
            return None;
        }
        let assessment = self.current.as_ref()?;
        let full_test = u64::from(assessment.total_time) * 60;

        let (scope, seconds) = match assessment.timer_type {
            TimerType::None => return None,
            TimerType::FullTest => (TimerScope::FullTest, full_test),
            TimerType::PerQuestion => {
                let limit = assessment
                    .question(self.question_index)
                    .map_or(0, |q| u64::from(q.time_limit));
                let seconds = if limit > 0 { limit } else { full_test };
                (TimerScope::Question(self.question_index), seconds)
            }
        };

        (seconds > 0).then_some(TimerRequest {
            attempt: self.attempt,
            scope,
            seconds,
        })
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let assessment = self.current.as_ref().or(self.selected.as_ref());
        let in_progress = self.view == View::Assessment;

        SessionSnapshot {
            view: self.view,
            assessment: assessment.map(PublicAssessment::from),
            question_index: in_progress.then_some(self.question_index),
            current_question: self
                .current
                .as_ref()
                .filter(|_| in_progress)
                .and_then(|a| a.question(self.question_index))
                .map(PublicQuestion::from),
            is_last_question: in_progress
                && self
                    .current
                    .as_ref()
                    .is_some_and(|a| self.question_index + 1 == a.questions.len()),
            answers: self.answers.clone(),
            started_at: self.started_at,
            payment_category: self.payment_category,
            payment_methods: self
                .payment_category
                .map(|c| c.methods().to_vec())
                .unwrap_or_default(),
            payment_method: self.payment_method,
            result: self.result.clone(),
            timer: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub scope: TimerScope,
    pub remaining: u64,
    pub display: String,
    pub is_active: bool,
}

/// Client view of a session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub view: View,
    pub assessment: Option<PublicAssessment>,
    pub question_index: Option<usize>,
    pub current_question: Option<PublicQuestion>,
    pub is_last_question: bool,
    pub answers: Answers,
    pub started_at: Option<DateTime<Utc>>,
    pub payment_category: Option<PaymentCategory>,
    pub payment_methods: Vec<PaymentMethod>,
    pub payment_method: Option<PaymentMethod>,
    pub result: Option<ResultSummary>,
    pub timer: Option<TimerSnapshot>,
}
