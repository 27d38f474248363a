pub mod auth;
pub mod chirps;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod tokens;
pub mod users;
pub mod webhooks;

use std::path::Path;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::auth::AppState;

/// Build the full HTTP router: static files under `/app`, the JSON API under
/// `/api` and the admin page.
pub fn router(state: AppState, file_root: &Path) -> Router {
    let app_routes: Router<AppState> = Router::new()
        .nest_service("/app", ServeDir::new(file_root))
        .layer(from_fn_with_state(state.clone(), metrics::count_hits));

    let public_routes: Router<AppState> = Router::new()
        .route("/api/healthz", get(metrics::healthz))
        .route("/api/reset", get(metrics::reset))
        .route("/admin/metrics", get(metrics::metrics))
        .route("/api/users", post(users::create_user))
        .route("/api/login", post(auth::login))
        .route("/api/refresh", post(auth::refresh))
        .route("/api/revoke", post(auth::revoke))
        .route("/api/chirps", get(chirps::list_chirps))
        .route("/api/chirps/{chirp_id}", get(chirps::get_chirp))
        .route("/api/polka/webhooks", post(webhooks::polka));

    let protected_routes: Router<AppState> = Router::new()
        .route("/api/users", put(users::update_user))
        .route("/api/chirps", post(chirps::create_chirp))
        .route("/api/chirps/{chirp_id}", delete(chirps::delete_chirp))
        .route_layer(from_fn_with_state(state.clone(), middleware::require_access));

    Router::new()
        .merge(app_routes)
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
