use std::sync::Arc;
use std::sync::atomic::AtomicUsize;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::{SaltString, rand_core::OsRng}};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use tracing::info;

use chirpy_db::{Database, StoreError};
use chirpy_types::api::{LoginRequest, LoginResponse, RefreshResponse};

use crate::error::{ApiError, blocking};
use crate::middleware::bearer_token;
use crate::tokens::{TokenManager, TokenRole};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub tokens: TokenManager,
    pub polka_key: String,
    pub fileserver_hits: AtomicUsize,
}

impl AppStateInner {
    pub fn new(db: Database, jwt_secret: &str, polka_key: String) -> AppState {
        Arc::new(Self {
            db,
            tokens: TokenManager::new(jwt_secret),
            polka_key,
            fileserver_hits: AtomicUsize::new(0),
        })
    }
}

/// Hash a password with Argon2id.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {}", e)))
}

pub fn verify_password(hash: &str, password: &str) -> bool {
    PasswordHash::new(hash)
        .and_then(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed))
        .is_ok()
}

/// POST /api/login — exchange credentials for an access/refresh token pair.
pub async fn login(
    State(state): State<AppState>,
    req: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = req?;
    let response = blocking(move || {
        let user = state.db.get_user_by_email(&req.email).map_err(|e| match e {
            StoreError::NotExist => ApiError::Unauthorized("Incorrect email or password".into()),
            e => e.into(),
        })?;

        if !verify_password(&user.password, &req.password) {
            return Err(ApiError::Unauthorized("Incorrect email or password".into()));
        }

        let token = state.tokens.issue(user.id, TokenRole::Access)?;
        let refresh_token = state.tokens.issue(user.id, TokenRole::Refresh)?;

        info!("User {} logged in", user.id);
        Ok(LoginResponse {
            id: user.id,
            email: user.email,
            is_chirpy_red: user.is_chirpy_red,
            token,
            refresh_token,
        })
    })
    .await?;

    Ok(Json(response))
}

/// POST /api/refresh — mint a fresh access token from a live refresh token.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = bearer_token(&headers)?.to_string();

    let token = blocking(move || {
        let claims = state.tokens.validate_refresh(&token, &state.db)?;
        Ok(state.tokens.issue(claims.user_id()?, TokenRole::Access)?)
    })
    .await?;

    Ok(Json(RefreshResponse { token }))
}

/// POST /api/revoke — put a refresh token on the denylist.
pub async fn revoke(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = bearer_token(&headers)?.to_string();

    blocking(move || Ok(state.tokens.revoke(&token, &state.db)?)).await?;

    info!("Refresh token revoked");
    Ok(StatusCode::NO_CONTENT)
}
