use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

use super::blocking;
use crate::account::{Account, AccountId};
use crate::api::extract::Auth;
use crate::api::types::{page_json, AccountView, MessageResponse, OpenAccountRequest, PageQuery};
use crate::api::ApiState;
use crate::bank::AccountUpdate;
use crate::error::BankResult;

pub async fn list(
    State(state): State<ApiState>,
    auth: Auth,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> BankResult<Json<Value>> {
    let Query(q) = query?;
    let page = blocking(&state, move |bank| bank.list_accounts(&auth.principal, q.page, q.per_page)).await?;
    Ok(Json(page_json::<Account, AccountView>("accounts", page)))
}

pub async fn open(
    State(state): State<ApiState>,
    auth: Auth,
    payload: Option<Json<OpenAccountRequest>>,
) -> BankResult<(StatusCode, Json<AccountView>)> {
    let req = payload.map(|Json(req)| req).unwrap_or_default();
    let account = blocking(&state, move |bank| {
        bank.open_account(&auth.principal, req.account_type.as_deref())
    })
    .await?;
    Ok((StatusCode::CREATED, Json(account.into())))
}

pub async fn get(
    State(state): State<ApiState>,
    auth: Auth,
    id: Result<Path<AccountId>, PathRejection>,
) -> BankResult<Json<AccountView>> {
    let Path(id) = id?;
    let account = blocking(&state, move |bank| bank.get_account(&auth.principal, id)).await?;
    Ok(Json(account.into()))
}

pub async fn update(
    State(state): State<ApiState>,
    auth: Auth,
    id: Result<Path<AccountId>, PathRejection>,
    payload: Result<Json<AccountUpdate>, JsonRejection>,
) -> BankResult<Json<AccountView>> {
    let Path(id) = id?;
    let Json(update) = payload?;
    let account = blocking(&state, move |bank| bank.update_account(&auth.principal, id, update)).await?;
    Ok(Json(account.into()))
}

pub async fn close(
    State(state): State<ApiState>,
    auth: Auth,
    id: Result<Path<AccountId>, PathRejection>,
) -> BankResult<Json<MessageResponse>> {
    let Path(id) = id?;
    blocking(&state, move |bank| bank.close_account(&auth.principal, id)).await?;
    Ok(Json(MessageResponse::new("Account deleted successfully")))
}
