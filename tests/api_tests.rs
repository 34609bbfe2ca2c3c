// tests/api_tests.rs

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lms_backend::{
    config::Config,
    error::AppError,
    routes,
    services::auth::seed_users,
    state::AppState,
    storage::Stores,
    utils::mailer::{Mailer, ResultShare},
};
use serde_json::{Value, json};

const ADMIN_EMAIL: &str = "admin@example.com";
const ADMIN_PASSWORD: &str = "password123";

/// Captures outgoing e-mails instead of sending them.
#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<ResultShare>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_result(&self, share: &ResultShare) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(share.clone());
        Ok(())
    }
}

struct TestApp {
    address: String,
    mailer: Arc<RecordingMailer>,
}

fn test_config() -> Config {
    Config {
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        port: 0,
        database_url: None,
        data_file: None,
        admin_email: Some(ADMIN_EMAIL.to_string()),
        admin_password: Some(ADMIN_PASSWORD.to_string()),
        student_email: None,
        student_password: None,
        emailjs: None,
    }
}

/// Spawns the app on a random port with in-memory storage.
async fn spawn_app() -> TestApp {
    let config = test_config();
    let stores = Stores::in_memory();
    seed_users(&stores, &config).await.expect("Failed to seed users");

    let mailer = Arc::new(RecordingMailer::default());
    let state = AppState::with_mailer(stores, config, mailer.clone());
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp { address, mailer }
}

async fn login(client: &reqwest::Client, address: &str, email: &str, password: &str) -> String {
    let body = client
        .post(format!("{}/api/auth/login", address))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Login failed")
        .json::<Value>()
        .await
        .expect("Failed to parse login json");
    body["token"].as_str().expect("Token not found").to_string()
}

async fn post(client: &reqwest::Client, url: String, token: &str, body: Value) -> reqwest::Response {
    client
        .post(url)
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request")
}

fn point_question(id: &str) -> Value {
    json!({
        "id": id,
        "text": format!("Question {}", id),
        "type": "point_based",
        "options": ["A", "B"],
        "points": 1,
        "correctAnswer": 0
    })
}

/// Creates an assessment as admin and returns its id.
async fn create_assessment(client: &reqwest::Client, address: &str, admin: &str, extra: Value) -> String {
    let mut body = json!({
        "title": "Rust Basics",
        "description": "Ownership and borrowing",
        "type": "point_based",
        "questions": [point_question("q1"), point_question("q2")],
        "isFree": true
    });
    if let (Some(target), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
        for (k, v) in extra {
            target.insert(k.clone(), v.clone());
        }
    }

    let response = post(client, format!("{}/api/admin/assessments", address), admin, body).await;
    assert_eq!(response.status().as_u16(), 201);
    let created: Value = response.json().await.unwrap();
    created["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(format!("{}/random_path_that_does_not_exist", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_works_and_hides_password() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let email = format!("u_{}@example.com", &uuid::Uuid::new_v4().to_string()[..8]);

    let response = client
        .post(format!("{}/api/auth/register", app.address))
        .json(&json!({ "name": "Jane", "email": email, "password": "password123" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["type"], "Bearer");
    assert_eq!(body["user"]["role"], "student");
    assert!(body["user"].get("passwordHash").is_none());

    // Same e-mail again
    let again = client
        .post(format!("{}/api/auth/register", app.address))
        .json(&json!({ "name": "Jane", "email": email, "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status().as_u16(), 409);
}

#[tokio::test]
async fn register_fails_validation() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/auth/register", app.address))
        .json(&json!({ "name": "Jane", "email": "not-an-email", "password": "password123" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn login_creates_students_and_checks_seeded_passwords() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/auth/login", app.address))
        .json(&json!({ "email": "new.student@example.com", "password": "pw1234" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user"]["name"], "new.student");
    assert_eq!(body["user"]["role"], "student");

    let wrong = client
        .post(format!("{}/api/auth/login", app.address))
        .json(&json!({ "email": ADMIN_EMAIL, "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status().as_u16(), 401);
}

#[tokio::test]
async fn logout_invalidates_token() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = login(&client, &app.address, "leaver@example.com", "pw1234").await;

    let me = client
        .get(format!("{}/api/auth/me", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(me.status().as_u16(), 200);

    let logout = post(&client, format!("{}/api/auth/logout", app.address), &token, json!({})).await;
    assert_eq!(logout.status().as_u16(), 200);

    let me = client
        .get(format!("{}/api/auth/me", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(me.status().as_u16(), 401);
}

#[tokio::test]
async fn admin_routes_are_protected() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let anonymous = client
        .get(format!("{}/api/admin/users", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status().as_u16(), 401);

    let student = login(&client, &app.address, "student@example.com", "pw1234").await;
    let forbidden = client
        .get(format!("{}/api/admin/users", app.address))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status().as_u16(), 403);

    let view = post(&client, format!("{}/api/session/admin/payments", app.address), &student, json!({})).await;
    assert_eq!(view.status().as_u16(), 403);

    let admin = login(&client, &app.address, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let users: Value = client
        .get(format!("{}/api/admin/users?role=student", app.address))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(users.as_array().unwrap().len(), 1);
    assert_eq!(users[0]["email"], "student@example.com");
}

#[tokio::test]
async fn free_assessment_half_right_scores_fifty() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let admin = login(&client, &app.address, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let id = create_assessment(&client, &app.address, &admin, json!({})).await;

    // Students never see the answer key
    let public: Value = client
        .get(format!("{}/api/assessments/{}", app.address, id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(public["questions"][0].get("correctAnswer").is_none());

    let student = login(&client, &app.address, "taker@example.com", "pw1234").await;
    let session = format!("{}/api/session", app.address);

    let started: Value = post(&client, format!("{}/start", session), &student, json!({ "assessmentId": id }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(started["session"]["view"], "assessment");
    assert_eq!(started["session"]["currentQuestion"]["id"], "q1");

    post(&client, format!("{}/answer", session), &student, json!({ "questionId": "q1", "option": 0 })).await;
    post(&client, format!("{}/next", session), &student, json!({})).await;
    post(&client, format!("{}/answer", session), &student, json!({ "questionId": "q2", "option": 1 })).await;
    let finished: Value = post(&client, format!("{}/next", session), &student, json!({}))
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(finished["session"]["view"], "result");
    assert_eq!(finished["session"]["result"]["score"], 50);
    assert_eq!(finished["session"]["result"]["passed"], false);

    let history: Value = client
        .get(format!("{}/api/assessments/history", app.address))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["score"], 50);

    // Starting a free assessment never records a transaction
    let ledger: Value = client
        .get(format!("{}/api/admin/transactions", app.address))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ledger["summary"]["total"], 0);

    // Back clears everything
    let back: Value = post(&client, format!("{}/back", session), &student, json!({}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(back["session"]["view"], "dashboard");
    assert!(back["session"]["result"].is_null());

    // Share needs a result on screen
    let share = post(&client, format!("{}/share", session), &student, json!({ "email": "friend@example.com" })).await;
    assert_eq!(share.status().as_u16(), 400);
}

#[tokio::test]
async fn coupon_grants_free_completed_access() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let admin = login(&client, &app.address, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let id = create_assessment(
        &client,
        &app.address,
        &admin,
        json!({ "isFree": false, "price": 19.99, "couponCode": "SAVE100" }),
    )
    .await;

    let student = login(&client, &app.address, "saver@example.com", "pw1234").await;
    let session = format!("{}/api/session", app.address);

    let started: Value = post(&client, format!("{}/start", session), &student, json!({ "assessmentId": id }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(started["session"]["view"], "payment");
    assert_eq!(started["session"]["assessment"]["hasCoupon"], true);

    let wrong = post(&client, format!("{}/payment/coupon", session), &student, json!({ "code": "save100" })).await;
    assert_eq!(wrong.status().as_u16(), 400);

    let applied: Value = post(&client, format!("{}/payment/coupon", session), &student, json!({ "code": "SAVE100" }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(applied["session"]["view"], "assessment");
    assert_eq!(applied["notices"][0]["level"], "success");

    let ledger: Value = client
        .get(format!("{}/api/admin/transactions", app.address))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let txns = ledger["transactions"].as_array().unwrap();
    assert_eq!(txns.len(), 1);
    assert_eq!(txns[0]["status"], "completed");
    assert_eq!(txns[0]["amount"], 0.0);
    assert_eq!(txns[0]["description"], "Rust Basics (Coupon Access)");

    // Already purchased: straight into the assessment
    post(&client, format!("{}/back", session), &student, json!({})).await;
    let restarted: Value = post(&client, format!("{}/start", session), &student, json!({ "assessmentId": id }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(restarted["session"]["view"], "assessment");
}

#[tokio::test]
async fn simulated_payment_waits_for_admin() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let admin = login(&client, &app.address, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let id = create_assessment(&client, &app.address, &admin, json!({ "isFree": false, "price": 25.0 })).await;

    let student = login(&client, &app.address, "payer@example.com", "pw1234").await;
    let session = format!("{}/api/session", app.address);
    post(&client, format!("{}/start", session), &student, json!({ "assessmentId": id })).await;

    let mismatch = client
        .put(format!("{}/payment/method", session))
        .bearer_auth(&student)
        .json(&json!({ "method": "gpay" }))
        .send()
        .await
        .unwrap();
    assert_eq!(mismatch.status().as_u16(), 400);

    let category: Value = client
        .put(format!("{}/payment/category", session))
        .bearer_auth(&student)
        .json(&json!({ "category": "upi" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(category["session"]["paymentMethods"].as_array().unwrap().len(), 4);

    client
        .put(format!("{}/payment/method", session))
        .bearer_auth(&student)
        .json(&json!({ "method": "gpay" }))
        .send()
        .await
        .unwrap();

    let paid: Value = post(&client, format!("{}/payment/simulate", session), &student, json!({}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(paid["session"]["view"], "paymentPending");

    // Starting again while pending lands on the pending screen
    let pending: Value = post(&client, format!("{}/start", session), &student, json!({ "assessmentId": id }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(pending["session"]["view"], "paymentPending");

    let ledger: Value = client
        .get(format!("{}/api/admin/transactions?status=pending", app.address))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let txn = &ledger["transactions"][0];
    assert_eq!(txn["amount"], 25.0);
    assert_eq!(txn["description"], "Rust Basics Payment");
    let txn_id = txn["id"].as_str().unwrap().to_string();

    // Refunding a pending payment is refused
    let refund = post(&client, format!("{}/api/admin/transactions/{}/refund", app.address, txn_id), &admin, json!({})).await;
    assert_eq!(refund.status().as_u16(), 409);

    let confirm = post(&client, format!("{}/api/admin/transactions/{}/confirm", app.address, txn_id), &admin, json!({})).await;
    assert_eq!(confirm.status().as_u16(), 200);

    let started: Value = post(&client, format!("{}/start", session), &student, json!({ "assessmentId": id }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(started["session"]["view"], "assessment");

    let refund = post(&client, format!("{}/api/admin/transactions/{}/refund", app.address, txn_id), &admin, json!({})).await;
    assert_eq!(refund.status().as_u16(), 200);
    let body: Value = refund.json().await.unwrap();
    assert_eq!(body["transaction"]["status"], "refunded");
}

#[tokio::test]
async fn ledger_filters_and_summary() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let admin = login(&client, &app.address, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    for _ in 0..3 {
        let r = post(&client, format!("{}/api/admin/transactions/simulate", app.address), &admin, json!({})).await;
        assert_eq!(r.status().as_u16(), 201);
    }

    let all: Value = client
        .get(format!("{}/api/admin/transactions?status=all", app.address))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all["transactions"].as_array().unwrap().len(), 3);
    assert_eq!(all["summary"]["pending"], 3);
    assert_eq!(all["summary"]["revenue"], 0.0);

    let none: Value = client
        .get(format!("{}/api/admin/transactions?user=nobody-matches", app.address))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(none["transactions"].as_array().unwrap().is_empty());

    let bad = client
        .get(format!("{}/api/admin/transactions?status=lost", app.address))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status().as_u16(), 400);
}

#[tokio::test]
async fn csv_import_preview_and_append() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let admin = login(&client, &app.address, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let id = create_assessment(&client, &app.address, &admin, json!({})).await;

    let csv = "QuestionText,Option1,Option2,CorrectAnswerIndex,Points\nWhat is 2+2?,4,5,0,2\n";
    let preview: Value = post(
        &client,
        format!("{}/api/admin/assessments/import", app.address),
        &admin,
        json!({ "filename": "questions.csv", "content": csv }),
    )
    .await
    .json()
    .await
    .unwrap();
    let questions = preview["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0]["options"].as_array().unwrap().len(), 2);

    let docx = post(
        &client,
        format!("{}/api/admin/assessments/{}/import", app.address, id),
        &admin,
        json!({ "filename": "questions.docx", "content": "PK" }),
    )
    .await;
    assert_eq!(docx.status().as_u16(), 400);

    let appended: Value = post(
        &client,
        format!("{}/api/admin/assessments/{}/import", app.address, id),
        &admin,
        json!({ "filename": "questions.csv", "content": csv }),
    )
    .await
    .json()
    .await
    .unwrap();
    assert_eq!(appended["imported"], 1);
    assert_eq!(appended["assessment"]["questions"].as_array().unwrap().len(), 3);

    // A question nobody could answer is refused and nothing is saved
    let empty_options = post(
        &client,
        format!("{}/api/admin/assessments/{}/import", app.address, id),
        &admin,
        json!({
            "filename": "set.json",
            "content": r#"{"title": "T", "description": "D", "questions": [{"text": "Q", "options": []}]}"#
        }),
    )
    .await;
    assert_eq!(empty_options.status().as_u16(), 400);

    let stored: Value = client
        .get(format!("{}/api/admin/assessments/{}", app.address, id))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stored["questions"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn assessment_admin_validation_and_delete() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let admin = login(&client, &app.address, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let invalid = post(
        &client,
        format!("{}/api/admin/assessments", app.address),
        &admin,
        json!({
            "title": "Broken",
            "description": "Bad answer key",
            "questions": [{ "text": "Pick", "type": "point_based", "options": ["a"], "correctAnswer": 3 }]
        }),
    )
    .await;
    assert_eq!(invalid.status().as_u16(), 400);

    let id = create_assessment(&client, &app.address, &admin, json!({})).await;
    let deleted = client
        .delete(format!("{}/api/admin/assessments/{}", app.address, id))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status().as_u16(), 200);

    let missing = client
        .get(format!("{}/api/assessments/{}", app.address, id))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);
}

#[tokio::test]
async fn share_result_sends_summary() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let admin = login(&client, &app.address, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let id = create_assessment(&client, &app.address, &admin, json!({})).await;

    let student = login(&client, &app.address, "sharer@example.com", "pw1234").await;
    let session = format!("{}/api/session", app.address);
    post(&client, format!("{}/start", session), &student, json!({ "assessmentId": id })).await;
    post(&client, format!("{}/answer", session), &student, json!({ "questionId": "q1", "option": 0 })).await;
    post(&client, format!("{}/complete", session), &student, json!({})).await;

    let shared = post(&client, format!("{}/share", session), &student, json!({ "email": "friend@example.com" })).await;
    assert_eq!(shared.status().as_u16(), 200);

    let sent = app.mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to_email, "friend@example.com");
    assert_eq!(sent[0].assessment_title, "Rust Basics");
    assert_eq!(sent[0].user_score, 50);
}
