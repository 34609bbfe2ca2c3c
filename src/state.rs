// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    config::Config,
    services::self_assessment::SessionRegistry,
    storage::Stores,
    utils::mailer::{DisabledMailer, EmailJsMailer, Mailer},
};

#[derive(Clone)]
pub struct AppState {
    pub stores: Stores,
    pub config: Config,
    pub sessions: SessionRegistry,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// Wires the session registry and the mailer configured in `config`.
    pub fn new(stores: Stores, config: Config) -> Self {
        let mailer: Arc<dyn Mailer> = match config.emailjs.clone() {
            Some(emailjs) => Arc::new(EmailJsMailer::new(emailjs)),
            None => {
                tracing::warn!("EmailJS settings missing, result sharing is disabled");
                Arc::new(DisabledMailer)
            }
        };
        Self::with_mailer(stores, config, mailer)
    }

    pub fn with_mailer(stores: Stores, config: Config, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            sessions: SessionRegistry::new(stores.clone()),
            stores,
            config,
            mailer,
        }
    }
}

impl FromRef<AppState> for Stores {
    fn from_ref(state: &AppState) -> Self {
        state.stores.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for SessionRegistry {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}
