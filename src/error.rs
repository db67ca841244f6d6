use thiserror::Error;

use crate::account::balance::BalanceError;

#[derive(Error, Debug)]
pub enum BankError {
    #[error("{0}")]
    Validation(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("Account locked. Try again in {minutes} minutes")]
    Locked { minutes: i64 },
    #[error("Insufficient funds")]
    InsufficientFunds,
    #[error("{0}")]
    LimitExceeded(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type BankResult<T> = Result<T, BankError>;

impl BankError {
    pub fn validation(msg: impl Into<String>) -> Self {
        BankError::Validation(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        BankError::Forbidden(msg.into())
    }

    /// True for failures the caller cannot fix by changing the request.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            BankError::Database(_)
                | BankError::Serialization(_)
                | BankError::Config(_)
                | BankError::Internal(_)
        )
    }
}

impl From<sled::Error> for BankError {
    fn from(err: sled::Error) -> Self {
        BankError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for BankError {
    fn from(err: serde_json::Error) -> Self {
        BankError::Serialization(err.to_string())
    }
}

impl From<sled::transaction::TransactionError<BankError>> for BankError {
    fn from(err: sled::transaction::TransactionError<BankError>) -> Self {
        match err {
            sled::transaction::TransactionError::Abort(inner) => inner,
            sled::transaction::TransactionError::Storage(e) => BankError::Database(e.to_string()),
        }
    }
}

impl From<BalanceError> for BankError {
    fn from(err: BalanceError) -> Self {
        match err {
            BalanceError::InsufficientFunds => BankError::InsufficientFunds,
            BalanceError::InvalidAmount => {
                BankError::Validation("Transaction amount must be positive".to_string())
            }
            BalanceError::Overflow => BankError::Validation("Balance overflow".to_string()),
        }
    }
}

impl From<toml::de::Error> for BankError {
    fn from(err: toml::de::Error) -> Self {
        BankError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for BankError {
    fn from(err: toml::ser::Error) -> Self {
        BankError::Config(err.to_string())
    }
}
