//! services/web/src/web/objects.rs
//!
//! Serves stored objects when the in-memory backend is active. With the hosted
//! backend locators point at the storage service and this route answers 404.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::web::state::AppState;

/// GET /objects/{*key}
pub async fn serve_object(State(state): State<Arc<AppState>>, Path(key): Path<String>) -> Response {
    let Some(storage) = &state.memory_objects else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match storage.get(&key).await {
        Some(object) => ([(header::CONTENT_TYPE, object.content_type)], object.bytes).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
