// src/services/self_assessment.rs

//! Per-user assessment sessions and their timers.
//!
//! Sessions live only in memory. Every operation runs on a copy of the
//! session; the copy replaces the original only after the outcome's records
//! have been written, so a storage failure leaves the session untouched.
//!
//! Each user's slot has its own lock. The registry map is only locked long
//! enough to find or insert a slot, so storage writes for one user never
//! hold up another.

use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::{
    error::AppError,
    models::user::Role,
    services::{
        payment::{PaymentCategory, PaymentMethod},
        scoring::ResultSummary,
        session::{
            Access, AssessmentSession, Notice, Outcome, SessionSnapshot, TimerRequest,
            TimerScope, TimerSnapshot,
        },
        timer::{TimerHandle, format_clock, spawn_countdown},
    },
    storage::Stores,
};

struct ActiveTimer {
    generation: u64,
    attempt: u64,
    scope: TimerScope,
    handle: TimerHandle,
}

struct SessionSlot {
    session: AssessmentSession,
    timer: Option<ActiveTimer>,
    generation: u64,
    /// Notices raised while the user was not waiting on a response,
    /// e.g. a timer running out.
    pending_notices: Vec<Notice>,
}

impl SessionSlot {
    fn new(user_id: &str, role: Role) -> Self {
        Self {
            session: AssessmentSession::new(user_id, role),
            timer: None,
            generation: 0,
            pending_notices: Vec::new(),
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        let mut snapshot = self.session.snapshot();
        snapshot.timer = self.timer.as_ref().map(|t| {
            let remaining = t.handle.remaining();
            TimerSnapshot {
                scope: t.scope,
                remaining,
                display: format_clock(remaining),
                is_active: !t.handle.is_finished(),
            }
        });
        snapshot
    }
}

/// Response body of every session operation.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session: SessionSnapshot,
    pub notices: Vec<Notice>,
}

/// Identity of the caller, taken from the verified token.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub id: String,
    pub role: Role,
}

type SharedSlot = Arc<Mutex<SessionSlot>>;

#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<String, SharedSlot>>>,
    stores: Stores,
}

impl SessionRegistry {
    pub fn new(stores: Stores) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            stores,
        }
    }

    pub async fn snapshot(&self, user: &SessionUser) -> SessionResponse {
        let slot = self.slot(user).await;
        let mut slot = slot.lock().await;
        SessionResponse {
            session: slot.snapshot(),
            notices: std::mem::take(&mut slot.pending_notices),
        }
    }

    pub async fn start(
        &self,
        user: &SessionUser,
        assessment_id: &str,
    ) -> Result<SessionResponse, AppError> {
        let assessment = self
            .stores
            .assessments
            .get(assessment_id)
            .await?
            .ok_or(AppError::NotFound("Assessment not found".to_string()))?;
        let ledger = self.stores.transactions.list().await?;
        let access = Access::resolve(&assessment, &user.id, &ledger);

        tracing::info!(
            "User {} starting assessment {} ({:?})",
            user.id,
            assessment.id,
            access
        );
        self.apply(user, move |s| s.start(assessment, access, Utc::now()))
            .await
    }

    pub async fn answer(
        &self,
        user: &SessionUser,
        question_id: &str,
        option: usize,
    ) -> Result<SessionResponse, AppError> {
        self.apply(user, |s| s.answer(question_id, option)).await
    }

    pub async fn next(&self, user: &SessionUser) -> Result<SessionResponse, AppError> {
        self.apply(user, |s| s.next(Utc::now())).await
    }

    pub async fn complete(&self, user: &SessionUser) -> Result<SessionResponse, AppError> {
        self.apply(user, |s| s.complete(Utc::now())).await
    }

    pub async fn back(&self, user: &SessionUser) -> Result<SessionResponse, AppError> {
        self.apply(user, |s| Ok(s.back())).await
    }

    pub async fn open_admin(&self, user: &SessionUser) -> Result<SessionResponse, AppError> {
        self.apply(user, |s| s.open_admin()).await
    }

    pub async fn open_admin_payments(
        &self,
        user: &SessionUser,
    ) -> Result<SessionResponse, AppError> {
        self.apply(user, |s| s.open_admin_payments()).await
    }

    pub async fn select_payment_category(
        &self,
        user: &SessionUser,
        category: PaymentCategory,
    ) -> Result<SessionResponse, AppError> {
        self.apply(user, |s| s.select_payment_category(category))
            .await
    }

    pub async fn clear_payment_category(
        &self,
        user: &SessionUser,
    ) -> Result<SessionResponse, AppError> {
        self.apply(user, |s| s.clear_payment_category()).await
    }

    pub async fn select_payment_method(
        &self,
        user: &SessionUser,
        method: PaymentMethod,
    ) -> Result<SessionResponse, AppError> {
        self.apply(user, |s| s.select_payment_method(method)).await
    }

    pub async fn apply_coupon(
        &self,
        user: &SessionUser,
        code: &str,
    ) -> Result<SessionResponse, AppError> {
        self.apply(user, |s| s.apply_coupon(code, Utc::now())).await
    }

    pub async fn simulate_payment(&self, user: &SessionUser) -> Result<SessionResponse, AppError> {
        self.apply(user, |s| s.simulate_payment(Utc::now())).await
    }

    /// Result of the user's last completed attempt, if still shown.
    pub async fn last_result(&self, user_id: &str) -> Option<ResultSummary> {
        let slot = self.existing_slot(user_id).await?;
        let slot = slot.lock().await;
        slot.session.result().cloned()
    }

    /// Cancels the user's timer and forgets the session (logout).
    pub async fn discard(&self, user_id: &str) {
        let removed = self.sessions.lock().await.remove(user_id);
        if let Some(slot) = removed {
            // Dropping the timer handle aborts the countdown.
            slot.lock().await.timer = None;
            tracing::debug!("Discarded assessment session of user {}", user_id);
        }
    }

    async fn slot(&self, user: &SessionUser) -> SharedSlot {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(user.id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(SessionSlot::new(&user.id, user.role))))
            .clone()
    }

    async fn existing_slot(&self, user_id: &str) -> Option<SharedSlot> {
        self.sessions.lock().await.get(user_id).cloned()
    }

    async fn apply<F>(&self, user: &SessionUser, op: F) -> Result<SessionResponse, AppError>
    where
        F: FnOnce(&mut AssessmentSession) -> Result<Outcome, AppError> + Send,
    {
        let shared = self.slot(user).await;
        let mut guard = shared.lock().await;
        let slot = &mut *guard;
        slot.session.set_role(user.role);

        let mut draft = slot.session.clone();
        let outcome = op(&mut draft)?;
        self.persist(&outcome).await?;
        slot.session = draft;
        self.reconcile_timer(&user.id, slot);

        let mut notices = std::mem::take(&mut slot.pending_notices);
        notices.extend(outcome.notices);
        Ok(SessionResponse {
            session: slot.snapshot(),
            notices,
        })
    }

    async fn persist(&self, outcome: &Outcome) -> Result<(), AppError> {
        if let Some(txn) = &outcome.transaction {
            self.stores.transactions.append(txn.clone()).await?;
        }
        if let Some(entry) = &outcome.history {
            self.stores.history.append(entry.clone()).await?;
        }
        Ok(())
    }

    /// Starts, keeps or cancels the slot's countdown to match the session.
    fn reconcile_timer(&self, user_id: &str, slot: &mut SessionSlot) {
        let wanted = slot.session.timer_request();

        let keep = match (&slot.timer, wanted) {
            (Some(active), Some(req)) => active.attempt == req.attempt && active.scope == req.scope,
            _ => false,
        };
        if keep {
            return;
        }

        // Dropping the handle aborts the old countdown.
        slot.timer = None;
        if let Some(req) = wanted {
            slot.generation += 1;
            slot.timer = Some(self.spawn_timer(user_id, slot.generation, req));
        }
    }

    fn spawn_timer(&self, user_id: &str, generation: u64, req: TimerRequest) -> ActiveTimer {
        let registry = self.clone();
        let owner = user_id.to_string();

        tracing::debug!(
            "Starting {:?} timer of {}s for user {}",
            req.scope,
            req.seconds,
            user_id
        );
        let handle = spawn_countdown(req.seconds, move || async move {
            registry.on_timer_expired(owner, generation).await;
        });

        ActiveTimer {
            generation,
            attempt: req.attempt,
            scope: req.scope,
            handle,
        }
    }

    async fn on_timer_expired(&self, user_id: String, generation: u64) {
        let Some(shared) = self.existing_slot(&user_id).await else {
            return;
        };
        let mut guard = shared.lock().await;
        let slot = &mut *guard;
        let scope = match &slot.timer {
            Some(timer) if timer.generation == generation => timer.scope,
            // Superseded by a newer timer.
            _ => return,
        };
        slot.timer = None;

        tracing::info!("Timer {:?} expired for user {}", scope, user_id);

        let mut draft = slot.session.clone();
        let applied = async {
            let outcome = draft.expire(scope, Utc::now())?;
            self.persist(&outcome).await?;
            Ok::<_, AppError>(outcome)
        }
        .await;

        match applied {
            Ok(outcome) => {
                slot.session = draft;
                slot.pending_notices.extend(outcome.notices);
                self.reconcile_timer(&user_id, slot);
            }
            Err(e) => {
                tracing::error!("Failed to apply timer expiry for user {}: {}", user_id, e);
                slot.pending_notices
                    .push(Notice::error("Time ran out but the attempt could not be saved."));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assessment::{Assessment, AssessmentType, Question, TimerType};
    use crate::services::session::View;
    use std::time::Duration;

    fn question(id: &str) -> Question {
        Question {
            id: id.into(),
            text: id.into(),
            question_type: AssessmentType::PointBased,
            options: vec!["A".into(), "B".into()],
            points: 1,
            time_limit: 0,
            correct_answer: Some(0),
            option_points: None,
        }
    }

    async fn registry_with(timer_type: TimerType, total_time: u32, limit: u32) -> SessionRegistry {
        let stores = Stores::in_memory();
        let mut questions = vec![question("q1"), question("q2")];
        questions[0].time_limit = limit;
        stores
            .assessments
            .upsert(Assessment {
                id: "timed".into(),
                title: "Timed".into(),
                description: "Timed".into(),
                assessment_type: AssessmentType::PointBased,
                questions,
                timer_type,
                total_time,
                passing_score: 70,
                is_free: true,
                coupon_code: None,
                price: 0.0,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .await
            .unwrap();
        SessionRegistry::new(stores)
    }

    fn student() -> SessionUser {
        SessionUser {
            id: "u1".into(),
            role: Role::Student,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn full_test_timer_completes_attempt() {
        let registry = registry_with(TimerType::FullTest, 1, 0).await;
        let user = student();

        let started = registry.start(&user, "timed").await.unwrap();
        let timer = started.session.timer.unwrap();
        assert_eq!(timer.remaining, 60);
        assert_eq!(timer.display, "01:00");

        registry.answer(&user, "q1", 0).await.unwrap();
        tokio::time::sleep(Duration::from_secs(61)).await;
        tokio::task::yield_now().await;

        let after = registry.snapshot(&user).await;
        assert_eq!(after.session.view, View::Result);
        assert_eq!(after.notices[0].message, "Time's up!");
        assert!(after.session.timer.is_none());

        let history = registry.stores.history.list_for_user("u1").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].score, 50);
    }

    #[tokio::test(start_paused = true)]
    async fn question_timer_advances_and_restarts() {
        let registry = registry_with(TimerType::PerQuestion, 1, 10).await;
        let user = student();

        registry.start(&user, "timed").await.unwrap();
        tokio::time::sleep(Duration::from_secs(11)).await;
        tokio::task::yield_now().await;

        let after = registry.snapshot(&user).await;
        assert_eq!(after.session.question_index, Some(1));
        // Second question has no limit of its own: one minute.
        assert_eq!(after.session.timer.unwrap().scope, TimerScope::Question(1));
    }

    #[tokio::test(start_paused = true)]
    async fn back_cancels_timer() {
        let registry = registry_with(TimerType::FullTest, 1, 0).await;
        let user = student();

        registry.start(&user, "timed").await.unwrap();
        let back = registry.back(&user).await.unwrap();
        assert!(back.session.timer.is_none());

        tokio::time::sleep(Duration::from_secs(120)).await;
        tokio::task::yield_now().await;

        let after = registry.snapshot(&user).await;
        assert_eq!(after.session.view, View::Dashboard);
        assert!(after.notices.is_empty());
        assert!(registry.stores.history.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn busy_session_does_not_block_other_users() {
        let registry = registry_with(TimerType::None, 0, 0).await;
        let other = SessionUser {
            id: "u2".into(),
            role: Role::Student,
        };

        // Hold the first user's slot as a slow storage write would.
        let busy = registry.slot(&student()).await;
        let _held = busy.lock().await;

        let started = tokio::time::timeout(Duration::from_secs(1), registry.start(&other, "timed"))
            .await
            .expect("start of another user timed out");
        assert_eq!(started.unwrap().session.view, View::Assessment);
    }

    #[tokio::test]
    async fn failed_operation_leaves_session_unchanged() {
        let registry = registry_with(TimerType::None, 0, 0).await;
        let user = student();

        registry.start(&user, "timed").await.unwrap();
        assert!(registry.answer(&user, "q1", 9).await.is_err());
        assert!(registry.start(&user, "missing").await.is_err());

        let snap = registry.snapshot(&user).await;
        assert_eq!(snap.session.view, View::Assessment);
        assert!(snap.session.answers.is_empty());
    }
}
