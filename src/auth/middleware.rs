//! Authentication Middleware
//! Mission: Protect API endpoints with JWT validation

use crate::api::error::ApiError;
use crate::auth::{jwt::JwtHandler, models::Claims};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use std::sync::Arc;

/// Auth middleware that validates JWT tokens.
///
/// No `Authorization: Bearer` header yields 401; a token that fails
/// validation yields 403. On success the [`Claims`] are inserted into request
/// extensions for handlers to pick up with `Extension<Claims>`.
pub async fn auth_middleware(
    State(jwt_handler): State<Arc<JwtHandler>>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(ApiError::AuthMissing)?;

    let claims = jwt_handler.validate_token(bearer.token())?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Extract claims from request (use after auth middleware)
pub fn extract_claims(req: &Request) -> Option<&Claims> {
    req.extensions().get::<Claims>()
}
