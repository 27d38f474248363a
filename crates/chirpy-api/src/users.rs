use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use chirpy_db::User;
use chirpy_types::api::{UserCredentials, UserResponse};

use crate::auth::{AppState, hash_password};
use crate::error::{ApiError, blocking};
use crate::middleware::AuthUser;

fn validate(req: &UserCredentials) -> Result<(), ApiError> {
    if req.email.trim().is_empty() || !req.email.contains('@') {
        return Err(ApiError::BadRequest("Invalid email".into()));
    }
    if req.password.is_empty() {
        return Err(ApiError::BadRequest("Password is required".into()));
    }
    Ok(())
}

fn to_response(user: User) -> UserResponse {
    UserResponse {
        id: user.id,
        email: user.email,
        is_chirpy_red: user.is_chirpy_red,
    }
}

/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    req: Result<Json<UserCredentials>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = req?;
    validate(&req)?;

    let user = blocking(move || {
        let password_hash = hash_password(&req.password)?;
        Ok(state.db.create_user(&req.email, &password_hash)?)
    })
    .await?;

    info!("Registered user {}", user.id);
    Ok((StatusCode::CREATED, Json(to_response(user))))
}

/// PUT /api/users — replace the caller's email and password.
pub async fn update_user(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    req: Result<Json<UserCredentials>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = req?;
    validate(&req)?;

    let user = blocking(move || {
        let password_hash = hash_password(&req.password)?;
        Ok(state.db.update_user(user_id, &req.email, &password_hash)?)
    })
    .await?;

    Ok(Json(to_response(user)))
}
