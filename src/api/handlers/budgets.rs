use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use super::blocking;
use crate::api::extract::Auth;
use crate::api::types::BudgetView;
use crate::api::ApiState;
use crate::budget::{BudgetId, BudgetUpdate, NewBudget};
use crate::error::BankResult;

pub async fn list(State(state): State<ApiState>, auth: Auth) -> BankResult<Json<Value>> {
    let budgets = blocking(&state, move |bank| bank.list_budgets(&auth.principal)).await?;
    let budgets: Vec<BudgetView> = budgets.into_iter().map(BudgetView::from).collect();
    Ok(Json(json!({ "budgets": budgets })))
}

pub async fn create(
    State(state): State<ApiState>,
    auth: Auth,
    payload: Result<Json<NewBudget>, JsonRejection>,
) -> BankResult<(StatusCode, Json<Value>)> {
    let Json(new) = payload?;
    let budget = blocking(&state, move |bank| bank.create_budget(&auth.principal, new)).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Budget created successfully", "budget": BudgetView::from(budget) })),
    ))
}

pub async fn update(
    State(state): State<ApiState>,
    auth: Auth,
    id: Result<Path<BudgetId>, PathRejection>,
    payload: Result<Json<BudgetUpdate>, JsonRejection>,
) -> BankResult<Json<Value>> {
    let Path(id) = id?;
    let Json(update) = payload?;
    let budget = blocking(&state, move |bank| bank.update_budget(&auth.principal, id, update)).await?;
    Ok(Json(json!({ "message": "Budget updated successfully", "budget": BudgetView::from(budget) })))
}
