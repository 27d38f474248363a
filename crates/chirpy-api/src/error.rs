use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use chirpy_db::StoreError;
use chirpy_types::api::ErrorResponse;

use crate::tokens::TokenError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Token(TokenError::Store(e)) | Self::Store(e) => store_status(e),
            Self::Token(TokenError::Signing(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Token(_) => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn store_status(e: &StoreError) -> StatusCode {
    match e {
        StoreError::NotExist => StatusCode::NOT_FOUND,
        StoreError::NotAuthor => StatusCode::FORBIDDEN,
        StoreError::AlreadyExists | StoreError::AlreadyRevoked => StatusCode::CONFLICT,
        StoreError::NotFound
        | StoreError::Corrupt(_)
        | StoreError::LockPoisoned
        | StoreError::Io(_)
        | StoreError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// Extractor rejections become 400s with the usual JSON error body instead of
// axum's plain-text 400/415/422 responses.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!("Responding with {}: {}", status, self);
            "Something went wrong".to_string()
        } else {
            if let Self::Token(e) = &self {
                warn!("Rejected token: {}", e);
            }
            self.to_string()
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// Run blocking store work (file I/O, password hashing) off the async runtime.
pub(crate) async fn blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal("blocking task failed".into())
    })?
}
