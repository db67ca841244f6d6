//! Route handlers, one module per resource.
//!
//! Bank operations are blocking (sled I/O, argon2), so handlers run them on
//! the blocking pool through [`blocking`].

pub mod accounts;
pub mod auth;
pub mod bills;
pub mod budgets;
pub mod transactions;
pub mod users;

use axum::Json;
use serde_json::{json, Value};

use super::ApiState;
use crate::bank::Bank;
use crate::error::{BankError, BankResult};

pub(crate) async fn blocking<T, F>(state: &ApiState, op: F) -> BankResult<T>
where
    F: FnOnce(&Bank) -> BankResult<T> + Send + 'static,
    T: Send + 'static,
{
    let bank = state.bank.clone();
    tokio::task::spawn_blocking(move || op(&bank))
        .await
        .map_err(|e| BankError::Internal(format!("worker task failed: {}", e)))?
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
