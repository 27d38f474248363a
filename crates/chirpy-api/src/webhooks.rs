use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use tracing::{info, warn};

use chirpy_types::api::PolkaWebhook;

use crate::auth::AppState;
use crate::error::{ApiError, blocking};
use crate::middleware::api_key;

const USER_UPGRADED: &str = "user.upgraded";

/// POST /api/polka/webhooks — payment provider callback granting Chirpy Red.
pub async fn polka(
    State(state): State<AppState>,
    headers: HeaderMap,
    req: Result<Json<PolkaWebhook>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let key = api_key(&headers)?;
    if key != state.polka_key {
        warn!("Polka webhook with invalid API key");
        return Err(ApiError::Unauthorized("Invalid API key".into()));
    }
    let Json(req) = req?;

    if req.event != USER_UPGRADED {
        return Ok(StatusCode::NO_CONTENT);
    }

    let user_id = req.data.user_id;
    blocking(move || Ok(state.db.upgrade_user(user_id)?)).await?;

    info!("User {} upgraded to Chirpy Red", user_id);
    Ok(StatusCode::NO_CONTENT)
}
