// src/config.rs

use dotenvy::dotenv;
use std::env;

/// Denominator contribution of a Likert question without explicit option points.
pub const LIKERT_MAX_POINTS: u32 = 5;

/// Passing threshold used when an assessment does not specify one.
pub const DEFAULT_PASSING_SCORE: u32 = 70;

/// Number of history entries shown on the dashboard.
pub const RECENT_HISTORY_LIMIT: usize = 5;

/// Length of the dashboard progress window, in days.
pub const PROGRESS_WINDOW_DAYS: i64 = 7;

pub const DEFAULT_EMAILJS_ENDPOINT: &str = "https://api.emailjs.com/api/v1.0/email/send";

/// Credentials for EmailJS-compatible result sharing.
#[derive(Debug, Clone)]
pub struct EmailJsConfig {
    pub endpoint: String,
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub port: u16,

    /// Postgres connection string. Takes precedence over `data_file`.
    pub database_url: Option<String>,
    /// JSON document used as a local key-value store.
    pub data_file: Option<String>,

    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub student_email: Option<String>,
    pub student_password: Option<String>,

    pub emailjs: Option<EmailJsConfig>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86_400);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3000);

        let emailjs = match (
            non_empty("EMAILJS_SERVICE_ID"),
            non_empty("EMAILJS_TEMPLATE_ID"),
            non_empty("EMAILJS_PUBLIC_KEY"),
        ) {
            (Some(service_id), Some(template_id), Some(public_key)) => Some(EmailJsConfig {
                endpoint: non_empty("EMAILJS_ENDPOINT")
                    .unwrap_or_else(|| DEFAULT_EMAILJS_ENDPOINT.to_string()),
                service_id,
                template_id,
                public_key,
            }),
            _ => None,
        };

        Self {
            jwt_secret,
            jwt_expiration,
            rust_log,
            port,
            database_url: non_empty("DATABASE_URL"),
            data_file: non_empty("DATA_FILE"),
            admin_email: non_empty("ADMIN_EMAIL"),
            admin_password: non_empty("ADMIN_PASSWORD"),
            student_email: non_empty("STUDENT_EMAIL"),
            student_password: non_empty("STUDENT_PASSWORD"),
            emailjs,
        }
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
