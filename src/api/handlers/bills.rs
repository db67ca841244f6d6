use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use super::blocking;
use crate::api::extract::Auth;
use crate::api::types::{BillView, MessageResponse};
use crate::api::ApiState;
use crate::bill::{BillId, BillUpdate, NewBill};
use crate::error::BankResult;

pub async fn list(State(state): State<ApiState>, auth: Auth) -> BankResult<Json<Value>> {
    let bills = blocking(&state, move |bank| bank.list_bills(&auth.principal)).await?;
    let bills: Vec<BillView> = bills.into_iter().map(BillView::from).collect();
    Ok(Json(json!({ "bills": bills })))
}

pub async fn create(
    State(state): State<ApiState>,
    auth: Auth,
    payload: Result<Json<NewBill>, JsonRejection>,
) -> BankResult<(StatusCode, Json<Value>)> {
    let Json(new) = payload?;
    let bill = blocking(&state, move |bank| bank.create_bill(&auth.principal, new)).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Bill scheduled successfully", "bill": BillView::from(bill) })),
    ))
}

pub async fn update(
    State(state): State<ApiState>,
    auth: Auth,
    id: Result<Path<BillId>, PathRejection>,
    payload: Result<Json<BillUpdate>, JsonRejection>,
) -> BankResult<Json<Value>> {
    let Path(id) = id?;
    let Json(update) = payload?;
    let bill = blocking(&state, move |bank| bank.update_bill(&auth.principal, id, update)).await?;
    Ok(Json(json!({ "message": "Bill updated successfully", "bill": BillView::from(bill) })))
}

pub async fn cancel(
    State(state): State<ApiState>,
    auth: Auth,
    id: Result<Path<BillId>, PathRejection>,
) -> BankResult<Json<MessageResponse>> {
    let Path(id) = id?;
    blocking(&state, move |bank| bank.cancel_bill(&auth.principal, id)).await?;
    Ok(Json(MessageResponse::new("Bill cancelled successfully")))
}
