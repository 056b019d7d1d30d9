//! HTTP-facing error taxonomy shared by every handler.

use crate::auth::jwt::TokenError;
use crate::auth::policy::DenyReason;
use crate::store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

#[derive(Debug)]
pub enum ApiError {
    /// No bearer token on a protected route
    AuthMissing,
    /// Bearer token present but rejected
    AuthInvalid(TokenError),
    /// Valid identity, insufficient role
    PermissionDenied(DenyReason),
    /// Unknown username or wrong password
    InvalidCredentials,
    Validation(String),
    NotFound(String),
    /// Username already registered
    Conflict(String),
    Store(StoreError),
    Internal(anyhow::Error),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UsernameTaken(_) => ApiError::Conflict("Username already exists".into()),
            StoreError::UserNotFound(id) => ApiError::NotFound(format!("User {} not found", id)),
            StoreError::UnknownUniversity(id) => {
                ApiError::NotFound(format!("University {} not found", id))
            }
            other => ApiError::Store(other),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl From<DenyReason> for ApiError {
    fn from(reason: DenyReason) -> Self {
        ApiError::PermissionDenied(reason)
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        ApiError::AuthInvalid(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::AuthMissing | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::AuthInvalid(_) | ApiError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            ApiError::Validation(_) | ApiError::NotFound(_) | ApiError::Conflict(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Store(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::AuthMissing => "Missing authorization token".to_string(),
            ApiError::AuthInvalid(e) => {
                warn!("Rejected bearer token: {}", e);
                "Invalid or expired token".to_string()
            }
            ApiError::PermissionDenied(reason) => {
                warn!("Permission denied: {}", reason);
                "Insufficient permissions".to_string()
            }
            ApiError::InvalidCredentials => "Invalid username or password".to_string(),
            ApiError::Validation(msg) | ApiError::NotFound(msg) | ApiError::Conflict(msg) => {
                msg.clone()
            }
            ApiError::Store(err) => {
                error!("Store error: {}", err);
                "Internal server error".to_string()
            }
            ApiError::Internal(err) => {
                error!("Internal error: {:#}", err);
                "Internal server error".to_string()
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
