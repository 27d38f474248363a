use std::sync::atomic::Ordering;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{Html, IntoResponse, Response},
};

use crate::auth::AppState;

/// Count every request served from `/app`.
pub async fn count_hits(State(state): State<AppState>, req: Request, next: Next) -> Response {
    state.fileserver_hits.fetch_add(1, Ordering::Relaxed);
    next.run(req).await
}

/// GET /api/healthz
pub async fn healthz() -> &'static str {
    "OK"
}

/// GET /admin/metrics
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let hits = state.fileserver_hits.load(Ordering::Relaxed);
    Html(format!(
        "<html>\n<body>\n<h1>Welcome, Chirpy Admin</h1>\n<p>Chirpy has been visited {} times!</p>\n</body>\n</html>\n",
        hits
    ))
}

/// GET /api/reset
pub async fn reset(State(state): State<AppState>) -> &'static str {
    state.fileserver_hits.store(0, Ordering::Relaxed);
    "Hits reset to 0"
}
