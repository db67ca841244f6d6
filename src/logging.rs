//! Tracing setup and security event helpers

use tracing_subscriber::EnvFilter;

use crate::config::{Environment, LoggingConfig};

/// Resolve the filter directive: `RUST_LOG` first, then config, then the
/// environment default.
pub fn filter_directive(config: &LoggingConfig, environment: Environment, rust_log: Option<String>) -> String {
    if let Some(directive) = rust_log.filter(|s| !s.trim().is_empty()) {
        return directive;
    }
    if let Some(level) = &config.level {
        return level.clone();
    }
    match environment {
        Environment::Production => "info".to_string(),
        _ => "debug".to_string(),
    }
}

/// Install the global subscriber. Safe to call more than once.
pub fn init_tracing(config: &LoggingConfig, environment: Environment) {
    let directive = filter_directive(config, environment, std::env::var("RUST_LOG").ok());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));

    let result = if config.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
    };

    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityEvent {
    LoginSucceeded,
    LoginFailed,
    AccountLocked,
    TokenRevoked,
    PasswordChanged,
    UserDeleted,
}

impl SecurityEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityEvent::LoginSucceeded => "login_succeeded",
            SecurityEvent::LoginFailed => "login_failed",
            SecurityEvent::AccountLocked => "account_locked",
            SecurityEvent::TokenRevoked => "token_revoked",
            SecurityEvent::PasswordChanged => "password_changed",
            SecurityEvent::UserDeleted => "user_deleted",
        }
    }
}

pub fn security_event(event: SecurityEvent, user_id: Option<u64>, details: &str) {
    match event {
        SecurityEvent::LoginFailed | SecurityEvent::AccountLocked => tracing::warn!(
            target: "security",
            event = event.as_str(),
            user_id = user_id,
            details,
            "security event"
        ),
        _ => tracing::info!(
            target: "security",
            event = event.as_str(),
            user_id = user_id,
            details,
            "security event"
        ),
    }
}
