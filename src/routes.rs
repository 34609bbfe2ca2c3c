// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, assessments, auth, courses, feedback, session},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Public catalogue routes (assessments, courses, feedback counts).
/// * Signed-in routes (profile, self-assessment session, course progress).
/// * Admin routes behind both auth and admin middleware.
/// * Global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let require_auth = || middleware::from_fn_with_state(state.clone(), auth_middleware);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .merge(
            Router::new()
                .route("/logout", post(auth::logout))
                .route("/me", get(auth::me).put(auth::update_profile))
                .layer(require_auth()),
        );

    let assessment_routes = Router::new()
        .route("/", get(assessments::list_assessments))
        .route("/{id}", get(assessments::get_assessment))
        .route("/{id}/feedback", get(feedback::get_feedback))
        // Protected assessment routes
        .merge(
            Router::new()
                .route("/history", get(assessments::my_history))
                .route("/dashboard", get(assessments::my_dashboard))
                .route("/{id}/feedback/upvote", post(feedback::upvote))
                .route("/{id}/feedback/downvote", post(feedback::downvote))
                .route("/{id}/feedback/comments", post(feedback::add_comment))
                .layer(require_auth()),
        );

    let session_routes = Router::new()
        .route("/", get(session::get_session))
        .route("/start", post(session::start))
        .route("/answer", post(session::answer))
        .route("/next", post(session::next))
        .route("/complete", post(session::complete))
        .route("/back", post(session::back))
        .route("/admin", post(session::open_admin))
        .route("/admin/payments", post(session::open_admin_payments))
        .route(
            "/payment/category",
            put(session::select_category).delete(session::clear_category),
        )
        .route("/payment/method", put(session::select_method))
        .route("/payment/coupon", post(session::apply_coupon))
        .route("/payment/simulate", post(session::simulate_payment))
        .route("/share", post(session::share_result))
        .layer(require_auth());

    let course_routes = Router::new()
        .route("/", get(courses::list_courses))
        .route("/{id}", get(courses::get_course))
        .merge(
            Router::new()
                .route("/{id}/progress", get(courses::get_progress))
                .route("/{id}/purchase", post(courses::purchase_course))
                .route(
                    "/{id}/lessons/{lesson_id}/complete",
                    post(courses::complete_lesson),
                )
                .layer(require_auth()),
        );

    let admin_routes = Router::new()
        .route("/users", get(admin::list_users))
        .route("/users/{id}/role", put(admin::update_user_role))
        .route(
            "/assessments",
            get(assessments::admin_list_assessments).post(assessments::create_assessment),
        )
        .route(
            "/assessments/{id}",
            get(assessments::admin_get_assessment)
                .put(assessments::update_assessment)
                .delete(assessments::delete_assessment),
        )
        .route("/assessments/import", post(assessments::preview_import))
        .route(
            "/assessments/{id}/import",
            post(assessments::import_into_assessment),
        )
        .route("/transactions", get(admin::list_transactions))
        .route("/transactions/simulate", post(admin::simulate_incoming))
        .route(
            "/transactions/{id}/confirm",
            post(admin::confirm_transaction),
        )
        .route("/transactions/{id}/refund", post(admin::refund_transaction))
        .route("/analytics", get(admin::analytics))
        .route("/courses", post(courses::create_course))
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(require_auth());

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/assessments", assessment_routes)
        .nest("/api/session", session_routes)
        .nest("/api/courses", course_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
