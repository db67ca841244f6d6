use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use super::blocking;
use crate::api::extract::Auth;
use crate::api::types::{page_json, CategoryRequest, TransactionView};
use crate::api::ApiState;
use crate::category::Category;
use crate::error::BankResult;
use crate::ledger::{NewTransaction, Transaction, TransactionFilter, TransactionId};

pub async fn list(
    State(state): State<ApiState>,
    auth: Auth,
    query: Result<Query<TransactionFilter>, QueryRejection>,
) -> BankResult<Json<Value>> {
    let Query(filter) = query?;
    let page = blocking(&state, move |bank| bank.list_transactions(&auth.principal, filter)).await?;
    Ok(Json(page_json::<Transaction, TransactionView>("transactions", page)))
}

pub async fn create(
    State(state): State<ApiState>,
    auth: Auth,
    payload: Result<Json<NewTransaction>, JsonRejection>,
) -> BankResult<(StatusCode, Json<TransactionView>)> {
    let Json(new) = payload?;
    let tx = blocking(&state, move |bank| bank.create_transaction(&auth.principal, new)).await?;
    Ok((StatusCode::CREATED, Json(tx.into())))
}

pub async fn get(
    State(state): State<ApiState>,
    auth: Auth,
    id: Result<Path<TransactionId>, PathRejection>,
) -> BankResult<Json<TransactionView>> {
    let Path(id) = id?;
    let tx = blocking(&state, move |bank| bank.get_transaction(&auth.principal, id)).await?;
    Ok(Json(tx.into()))
}

pub async fn list_categories(State(state): State<ApiState>, _auth: Auth) -> BankResult<Json<Value>> {
    let categories = blocking(&state, |bank| bank.list_categories()).await?;
    Ok(Json(json!({ "categories": categories })))
}

pub async fn create_category(
    State(state): State<ApiState>,
    auth: Auth,
    payload: Result<Json<CategoryRequest>, JsonRejection>,
) -> BankResult<(StatusCode, Json<Category>)> {
    let Json(req) = payload?;
    let category = blocking(&state, move |bank| bank.create_category(&auth.principal, &req.name)).await?;
    Ok((StatusCode::CREATED, Json(category)))
}
