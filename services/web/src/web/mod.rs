pub mod auth;
pub mod cookies;
pub mod documents;
pub mod middleware;
pub mod objects;
pub mod pages;
pub mod rest;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use self::{middleware::resolve_identity, state::AppState};

/// Room for multipart framing above the upload ceiling.
const BODY_LIMIT_HEADROOM: usize = 1024 * 1024;

async fn healthz() -> &'static str {
    "ok"
}

/// Builds the full application router over the shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_upload_bytes.saturating_add(BODY_LIMIT_HEADROOM);

    // Pages and form posts
    let pages: Router<Arc<AppState>> = Router::new()
        .route("/", get(auth::index))
        .route("/register", get(auth::register_page).post(auth::register_submit))
        .route("/login", get(auth::login_page).post(auth::login_submit))
        .route("/logout", get(auth::logout).post(auth::logout))
        .route(
            "/forgot-password",
            get(auth::forgot_password_page).post(auth::forgot_password_submit),
        )
        .route(
            "/reset-password",
            get(auth::reset_password_page).post(auth::reset_password_submit),
        )
        .route("/dashboard", get(documents::dashboard))
        .route("/upload", post(documents::upload))
        .route("/delete/{id}", post(documents::delete))
        .route("/download/{id}", get(documents::download))
        .route("/view/{id}", get(documents::view));

    // Machine-facing routes
    let api: Router<Arc<AppState>> = Router::new()
        .route("/api/documents", get(rest::list_documents_handler))
        .route("/objects/{*key}", get(objects::serve_object))
        .route("/healthz", get(healthz));

    Router::new()
        .merge(pages)
        .merge(api)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum_middleware::from_fn_with_state(state.clone(), resolve_identity))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
