//! Failed-login lockout

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::error::{BankError, BankResult};

/// Per-user login bookkeeping, persisted with the user record.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct LoginState {
    pub failed_attempts: u32,
    pub locked_until: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug)]
pub struct LockoutPolicy {
    max_attempts: u32,
    lockout: Duration,
}

impl LockoutPolicy {
    pub fn new(max_attempts: u32, lockout_minutes: i64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            lockout: Duration::minutes(lockout_minutes),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.max_login_attempts, config.lockout_minutes)
    }

    /// Fails while a lock is active. An expired lock is cleared and the
    /// counter starts over.
    pub fn check(&self, state: &mut LoginState, now: DateTime<Utc>) -> BankResult<()> {
        match state.locked_until {
            Some(until) if until > now => {
                let secs = (until - now).num_seconds();
                let minutes = ((secs + 59) / 60).max(1);
                Err(BankError::Locked { minutes })
            }
            Some(_) => {
                *state = LoginState::default();
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Returns true when this failure locked the user.
    pub fn record_failure(&self, state: &mut LoginState, now: DateTime<Utc>) -> bool {
        state.failed_attempts += 1;
        if state.failed_attempts >= self.max_attempts {
            state.locked_until = Some(now + self.lockout);
            true
        } else {
            false
        }
    }

    pub fn record_success(&self, state: &mut LoginState) {
        *state = LoginState::default();
    }
}
