// src/utils/mailer.rs

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;

use crate::{config::EmailJsConfig, error::AppError};

/// Template parameters of the "share results" e-mail.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResultShare {
    pub to_email: String,
    pub assessment_title: String,
    pub user_score: u32,
    pub message: String,
}

impl ResultShare {
    pub fn new(to_email: &str, assessment_title: &str, score: u32) -> Self {
        Self {
            to_email: to_email.to_string(),
            assessment_title: assessment_title.to_string(),
            user_score: score,
            message: format!(
                "I just completed the assessment \"{}\" and scored {}%!",
                assessment_title, score
            ),
        }
    }
}

/// Outbound transactional e-mail. Only success or failure is reported.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_result(&self, share: &ResultShare) -> Result<(), AppError>;
}

/// Sends through an EmailJS-compatible REST endpoint.
pub struct EmailJsMailer {
    client: reqwest::Client,
    config: EmailJsConfig,
}

impl EmailJsMailer {
    pub fn new(config: EmailJsConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client, config }
    }
}

#[async_trait]
impl Mailer for EmailJsMailer {
    async fn send_result(&self, share: &ResultShare) -> Result<(), AppError> {
        let body = json!({
            "service_id": self.config.service_id,
            "template_id": self.config.template_id,
            "user_id": self.config.public_key,
            "template_params": share,
        });

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("E-mail request failed: {:?}", e);
                AppError::InternalServerError(format!("Failed to send email: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!("E-mail service answered {}: {}", status, text);
            return Err(AppError::BadRequest(format!("Failed to send email: {}", text)));
        }

        tracing::info!("Shared result of '{}' with {}", share.assessment_title, share.to_email);
        Ok(())
    }
}

/// Used when no mail settings are configured.
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send_result(&self, _share: &ResultShare) -> Result<(), AppError> {
        Err(AppError::BadRequest(
            "Sharing by e-mail is not configured on this server.".to_string(),
        ))
    }
}
