//! Rendering of [`BankError`] as HTTP responses

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::BankError;

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

pub fn status_of(err: &BankError) -> StatusCode {
    match err {
        BankError::Validation(_) | BankError::InsufficientFunds | BankError::LimitExceeded(_) => {
            StatusCode::BAD_REQUEST
        }
        BankError::InvalidCredentials | BankError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        BankError::Forbidden(_) => StatusCode::FORBIDDEN,
        BankError::NotFound(_) => StatusCode::NOT_FOUND,
        BankError::Conflict(_) => StatusCode::CONFLICT,
        BankError::Locked { .. } => StatusCode::TOO_MANY_REQUESTS,
        BankError::Database(_)
        | BankError::Serialization(_)
        | BankError::Config(_)
        | BankError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for BankError {
    fn into_response(self) -> Response {
        let status = status_of(&self);
        let body = if self.is_internal() {
            // details stay in the log
            tracing::error!(error = %self, "request failed");
            ErrorBody {
                message: "Internal Server Error".to_string(),
                description: Some("An unexpected error occurred".to_string()),
            }
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "request rejected");
            ErrorBody {
                message: self.to_string(),
                description: None,
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for BankError {
    fn from(rejection: JsonRejection) -> Self {
        BankError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for BankError {
    fn from(rejection: QueryRejection) -> Self {
        BankError::Validation(format!("Invalid query parameters: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for BankError {
    fn from(rejection: PathRejection) -> Self {
        BankError::Validation(format!("Invalid path parameter: {}", rejection.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_of(&BankError::validation("x")), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(&BankError::InsufficientFunds), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(&BankError::InvalidCredentials), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(&BankError::forbidden("x")), StatusCode::FORBIDDEN);
        assert_eq!(status_of(&BankError::NotFound("Bill")), StatusCode::NOT_FOUND);
        assert_eq!(status_of(&BankError::Conflict("x".into())), StatusCode::CONFLICT);
        assert_eq!(status_of(&BankError::Locked { minutes: 3 }), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(status_of(&BankError::Database("x".into())), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let response = BankError::Database("disk on fire".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("Internal Server Error"));
        assert!(!text.contains("disk on fire"));
    }
}
