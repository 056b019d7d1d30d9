//! Authentication API Endpoints
//! Mission: Provide login, registration and identity endpoints

use crate::api::{error::ApiError, AppState};
use crate::auth::{
    middleware::extract_claims,
    models::{Claims, CredentialsRequest, TokenResponse, User, UserRole},
    password::PasswordHasher,
};
use anyhow::Context;
use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::header,
    Form, Json,
};
use tracing::{info, warn};

/// Username and password from a JSON, urlencoded or multipart body.
///
/// The dashboard's login form posts `FormData`; API clients post JSON. Any
/// other content type is read as JSON.
pub struct Credentials(pub CredentialsRequest);

#[axum::async_trait]
impl<S: Send + Sync> FromRequest<S> for Credentials {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::Validation(e.body_text()))?;
            return read_multipart(multipart).await.map(Credentials);
        }

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(payload) = Form::<CredentialsRequest>::from_request(req, state)
                .await
                .map_err(|e| ApiError::Validation(e.body_text()))?;
            return Ok(Credentials(payload));
        }

        let Json(payload) = Json::<CredentialsRequest>::from_request(req, state)
            .await
            .map_err(|e| ApiError::Validation(e.body_text()))?;
        Ok(Credentials(payload))
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<CredentialsRequest, ApiError> {
    let mut username = None;
    let mut password = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(e.body_text()))?
    {
        let name = field.name().map(str::to_owned);
        let value = field
            .text()
            .await
            .map_err(|e| ApiError::Validation(e.body_text()))?;
        match name.as_deref() {
            Some("username") => username = Some(value),
            Some("password") => password = Some(value),
            _ => {}
        }
    }

    match (username, password) {
        (Some(username), Some(password)) => Ok(CredentialsRequest { username, password }),
        _ => Err(ApiError::Validation(
            "Form must include username and password".into(),
        )),
    }
}

/// Login endpoint - POST /api/login
pub async fn login(
    State(state): State<AppState>,
    Credentials(payload): Credentials,
) -> Result<Json<TokenResponse>, ApiError> {

    info!("Login attempt: {}", payload.username);

    let user = match state.store.get_user_by_username(&payload.username)? {
        Some(user) => user,
        None => {
            warn!("Failed login attempt (unknown user): {}", payload.username);
            return Err(ApiError::InvalidCredentials);
        }
    };

    let valid = verify_blocking(state.hasher, payload.password, user.password_hash.clone()).await?;
    if !valid {
        warn!("Failed login attempt: {}", payload.username);
        return Err(ApiError::InvalidCredentials);
    }

    let response = issue_token(&state, &user)?;

    info!("Login successful: {} ({})", user.username, user.role);

    Ok(Json(response))
}

/// Registration endpoint - POST /api/register
///
/// New accounts always start as `regular` with no university.
pub async fn register(
    State(state): State<AppState>,
    Credentials(payload): Credentials,
) -> Result<Json<TokenResponse>, ApiError> {

    payload
        .validate()
        .map_err(|msg| ApiError::Validation(msg.to_string()))?;

    if state.store.username_exists(&payload.username)? {
        warn!("Registration rejected, username taken: {}", payload.username);
        return Err(ApiError::Conflict("Username already exists".into()));
    }

    let password_hash = hash_blocking(state.hasher, payload.password).await?;

    // A racing registration still trips the UNIQUE constraint here
    let user = state
        .store
        .create_user(&payload.username, &password_hash, UserRole::Regular)?;

    let response = issue_token(&state, &user)?;

    info!("Registered user: {} (id {})", user.username, user.id);

    Ok(Json(response))
}

/// Get current identity - GET /api/me
/// Answers from the token claims alone (no database lookup)
pub async fn get_current_user(req: Request) -> Result<Json<Claims>, ApiError> {
    let claims = extract_claims(&req).ok_or(ApiError::AuthMissing)?;
    Ok(Json(claims.clone()))
}

fn issue_token(state: &AppState, user: &User) -> Result<TokenResponse, ApiError> {
    let (token, expires_in) = state.jwt_handler.generate_token(user)?;
    Ok(TokenResponse::bearer(token, expires_in, user.role))
}

// bcrypt runs on the blocking pool
async fn hash_blocking(hasher: PasswordHasher, password: String) -> Result<String, ApiError> {
    let hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .context("Password hashing task failed")??;
    Ok(hash)
}

async fn verify_blocking(
    hasher: PasswordHasher,
    password: String,
    hash: String,
) -> Result<bool, ApiError> {
    let valid = tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
        .await
        .context("Password verification task failed")?;
    Ok(valid)
}
