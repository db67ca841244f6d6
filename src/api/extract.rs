//! Request extractors for bearer authentication

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use super::handlers::blocking;
use super::ApiState;
use crate::auth::token::bearer_token;
use crate::auth::Principal;
use crate::error::BankError;

const MISSING_TOKEN: &str = "Authentication token is missing";

/// Raw bearer token from the `Authorization` header, not yet verified.
pub struct BearerToken(pub String);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = BankError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| BankError::Unauthorized(MISSING_TOKEN.to_string()))?;
        let token = bearer_token(header).ok_or_else(|| BankError::Unauthorized(MISSING_TOKEN.to_string()))?;
        Ok(BearerToken(token.to_string()))
    }
}

/// Caller authenticated by a valid access token.
pub struct Auth {
    pub principal: Principal,
    pub token: String,
}

#[async_trait]
impl FromRequestParts<ApiState> for Auth {
    type Rejection = BankError;

    async fn from_request_parts(parts: &mut Parts, state: &ApiState) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let principal = {
            let token = token.clone();
            blocking(state, move |bank| bank.authenticate(&token)).await?
        };
        Ok(Auth { principal, token })
    }
}
