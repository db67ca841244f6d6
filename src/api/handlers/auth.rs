use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use super::blocking;
use crate::api::extract::{Auth, BearerToken};
use crate::api::types::{LoginRequest, LogoutRequest, MessageResponse};
use crate::api::ApiState;
use crate::bank::{AccessToken, TokenPair};
use crate::error::{BankError, BankResult};
use crate::user::NewUser;

pub async fn register(
    State(state): State<ApiState>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> BankResult<(StatusCode, Json<Value>)> {
    let Json(new) = payload?;
    let user = blocking(&state, move |bank| bank.register(new)).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User registered successfully", "user_id": user.id })),
    ))
}

pub async fn login(
    State(state): State<ApiState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> BankResult<Json<TokenPair>> {
    let Json(req) = payload?;
    let pair = blocking(&state, move |bank| bank.login(&req.username, &req.password)).await?;
    Ok(Json(pair))
}

pub async fn refresh(State(state): State<ApiState>, BearerToken(token): BearerToken) -> BankResult<Json<AccessToken>> {
    let access = blocking(&state, move |bank| bank.refresh(&token)).await?;
    Ok(Json(access))
}

/// The body is optional; an empty request only revokes the access token.
/// A body that is present must parse.
pub async fn logout(State(state): State<ApiState>, auth: Auth, body: Bytes) -> BankResult<Json<MessageResponse>> {
    let refresh_token = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        serde_json::from_slice::<LogoutRequest>(&body)
            .map_err(|e| BankError::validation(format!("Invalid request body: {}", e)))?
            .refresh_token
    };
    blocking(&state, move |bank| bank.logout(&auth.token, refresh_token.as_deref())).await?;
    Ok(Json(MessageResponse::new("Successfully logged out")))
}
