use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use super::blocking;
use crate::api::extract::Auth;
use crate::api::types::{MessageResponse, PasswordChangeRequest, PasswordConfirmation, UserView};
use crate::api::ApiState;
use crate::error::BankResult;
use crate::user::ProfileUpdate;

pub async fn profile(State(state): State<ApiState>, auth: Auth) -> BankResult<Json<UserView>> {
    let user = blocking(&state, move |bank| bank.profile(&auth.principal)).await?;
    Ok(Json(user.into()))
}

pub async fn update_profile(
    State(state): State<ApiState>,
    auth: Auth,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> BankResult<Json<UserView>> {
    let Json(update) = payload?;
    let user = blocking(&state, move |bank| bank.update_profile(&auth.principal, update)).await?;
    Ok(Json(user.into()))
}

pub async fn change_password(
    State(state): State<ApiState>,
    auth: Auth,
    payload: Result<Json<PasswordChangeRequest>, JsonRejection>,
) -> BankResult<Json<MessageResponse>> {
    let Json(req) = payload?;
    blocking(&state, move |bank| {
        bank.change_password(&auth.principal, &req.current_password, &req.new_password)
    })
    .await?;
    Ok(Json(MessageResponse::new("Password changed successfully")))
}

pub async fn delete_user(
    State(state): State<ApiState>,
    auth: Auth,
    payload: Result<Json<PasswordConfirmation>, JsonRejection>,
) -> BankResult<Json<MessageResponse>> {
    let Json(req) = payload?;
    blocking(&state, move |bank| bank.delete_user(&auth.principal, &req.password)).await?;
    Ok(Json(MessageResponse::new("User deleted successfully")))
}
