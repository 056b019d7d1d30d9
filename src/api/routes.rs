use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    middleware,
    response::Json,
    routing::{get, post, put},
    Extension, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::api::error::ApiError;
use crate::auth::{
    api as auth_api,
    jwt::JwtHandler,
    middleware::auth_middleware,
    models::{Claims, UpdateUserRequest, UserResponse, UserRole},
    password::PasswordHasher,
    policy::{authorize, Operation, ResourceKind, ScopeFilter},
};
use crate::middleware::request_logging_simple;
use crate::models::{HealthResponse, JobPosting, MessageResponse, University};
use crate::store::{JobQuery, Store};

/// Shared application state, built once at startup
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub jwt_handler: Arc<JwtHandler>,
    pub hasher: PasswordHasher,
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/api/login", post(auth_api::login))
        .route("/api/register", post(auth_api::register));

    let protected_routes = Router::new()
        .route("/api/jobs", get(list_jobs))
        .route("/api/jobs/search", get(search_jobs))
        .route("/api/users", get(list_users))
        .route("/api/users/:id", put(update_user))
        .route("/api/universities", get(list_universities))
        .route("/api/me", get(auth_api::get_current_user))
        .route_layer(middleware::from_fn_with_state(
            state.jwt_handler.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn(request_logging_simple))
        .with_state(state)
}

/// Policy gate shared by every protected handler
fn require(
    claims: &Claims,
    operation: Operation,
    resource: ResourceKind,
) -> Result<ScopeFilter, ApiError> {
    authorize(claims, operation, resource)
        .into_result()
        .map_err(ApiError::from)
}

// ===== Route Handlers =====

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Job postings visible to the caller
async fn list_jobs(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<JobPosting>>, ApiError> {
    let scope = require(&claims, Operation::Read, ResourceKind::Jobs)?;
    let jobs = state.store.list_jobs(&JobQuery::new(scope))?;
    Ok(Json(jobs))
}

/// Keyword search over the postings visible to the caller
async fn search_jobs(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<JobPosting>>, ApiError> {
    let scope = require(&claims, Operation::Read, ResourceKind::Jobs)?;
    let query = JobQuery::new(scope).with_keyword(params.keyword.as_deref().unwrap_or(""));
    let jobs = state.store.list_jobs(&query)?;
    Ok(Json(jobs))
}

/// All user accounts (super_admin only)
async fn list_users(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    require(&claims, Operation::Read, ResourceKind::Users)?;

    let users = state.store.list_users()?;
    Ok(Json(users.iter().map(UserResponse::from_user).collect()))
}

async fn list_universities(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<University>>, ApiError> {
    require(&claims, Operation::Read, ResourceKind::Universities)?;

    let universities = state.store.list_universities()?;
    Ok(Json(universities))
}

/// Change a user's role and university (super_admin only).
///
/// Authorization runs before the path and body are looked at, so a caller
/// without the capability is refused whatever they send.
async fn update_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    user_id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    require(&claims, Operation::Write, ResourceKind::Users)?;

    let Path(user_id) = user_id.map_err(|e| ApiError::Validation(e.body_text()))?;
    let Json(payload) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;

    let role = UserRole::parse(&payload.role)
        .ok_or_else(|| ApiError::Validation(format!("Invalid role: {}", payload.role)))?;

    state
        .store
        .update_user_access(user_id, role, payload.university_id)?;

    info!(
        "User {} updated by {}: role={} university_id={:?}",
        user_id, claims.sub, role, payload.university_id
    );

    Ok(Json(MessageResponse::new("User updated")))
}

// ===== Request Types =====

#[derive(Deserialize)]
struct SearchQuery {
    /// Substring to match against job title or university name
    keyword: Option<String>,
}
