use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};

use chirpy_db::UserId;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::tokens::TokenRole;

/// Identity of the caller, inserted by `require_access`.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub UserId);

/// Pull `<scheme> <credential>` out of the Authorization header.
fn authorization<'a>(headers: &'a HeaderMap, scheme: &str) -> Result<&'a str, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".into()))?;

    value
        .strip_prefix(scheme)
        .and_then(|rest| rest.strip_prefix(' '))
        .map(str::trim)
        .filter(|cred| !cred.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Malformed authorization header".into()))
}

pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    authorization(headers, "Bearer")
}

pub fn api_key(headers: &HeaderMap) -> Result<&str, ApiError> {
    authorization(headers, "ApiKey")
}

/// Validate an access token from the Authorization header.
pub async fn require_access(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers())?;
    let claims = state.tokens.validate(token, TokenRole::Access)?;
    let user_id = claims.user_id()?;

    req.extensions_mut().insert(AuthUser(user_id));
    Ok(next.run(req).await)
}
