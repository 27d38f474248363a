use axum::{
    Extension, Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use chirpy_db::{Chirp, ChirpId, UserId};
use chirpy_types::api::{ChirpResponse, CreateChirpRequest};

use crate::auth::AppState;
use crate::error::{ApiError, blocking};
use crate::middleware::AuthUser;

pub const MAX_CHIRP_LENGTH: usize = 140;

const PROFANE_WORDS: &[&str] = &["kerfuffle", "sharbert", "fornax"];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Deserialize)]
pub struct ChirpQuery {
    pub author_id: Option<UserId>,
    #[serde(default)]
    pub sort: SortOrder,
}

/// Enforce the length limit and mask profanity word by word.
pub fn clean_body(body: &str) -> Result<String, ApiError> {
    if body.chars().count() > MAX_CHIRP_LENGTH {
        return Err(ApiError::BadRequest("Chirp is too long".into()));
    }

    let cleaned = body
        .split(' ')
        .map(|word| {
            if PROFANE_WORDS.contains(&word.to_lowercase().as_str()) {
                "****"
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    Ok(cleaned)
}

fn to_response(chirp: Chirp) -> ChirpResponse {
    ChirpResponse {
        id: chirp.id,
        body: chirp.body,
        author_id: chirp.author_id,
    }
}

/// GET /api/chirps?author_id=&sort=
pub async fn list_chirps(
    State(state): State<AppState>,
    query: Result<Query<ChirpQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let author_id = query.author_id;
    let mut chirps = blocking(move || Ok(state.db.list_chirps(author_id)?)).await?;

    match query.sort {
        SortOrder::Asc => chirps.sort_by_key(|c| c.id),
        SortOrder::Desc => chirps.sort_by_key(|c| std::cmp::Reverse(c.id)),
    }

    Ok(Json(chirps.into_iter().map(to_response).collect::<Vec<_>>()))
}

/// GET /api/chirps/{chirp_id}
pub async fn get_chirp(
    State(state): State<AppState>,
    chirp_id: Result<Path<ChirpId>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(chirp_id) = chirp_id?;
    let chirp = blocking(move || Ok(state.db.get_chirp(chirp_id)?)).await?;
    Ok(Json(to_response(chirp)))
}

/// POST /api/chirps
pub async fn create_chirp(
    State(state): State<AppState>,
    Extension(AuthUser(author_id)): Extension<AuthUser>,
    req: Result<Json<CreateChirpRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = req?;
    let body = clean_body(&req.body)?;
    let chirp = blocking(move || Ok(state.db.create_chirp(&body, author_id)?)).await?;

    Ok((StatusCode::CREATED, Json(to_response(chirp))))
}

/// DELETE /api/chirps/{chirp_id} — only the author may delete.
pub async fn delete_chirp(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    chirp_id: Result<Path<ChirpId>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(chirp_id) = chirp_id?;
    blocking(move || Ok(state.db.delete_chirp_by(chirp_id, user_id)?)).await?;

    Ok(StatusCode::NO_CONTENT)
}
