//! services/web/src/web/documents.rs
//!
//! Document endpoints: the dashboard, upload, delete, download and view.

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use bytes::Bytes;
use docurp_core::{validation::AllowedExtension, Catalog, DeleteOutcome, Document, Identity, UploadRequest};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::web::{cookies, middleware::Authenticated, pages, state::AppState};

#[derive(Deserialize)]
pub struct DashboardQuery {
    pub error: Option<String>,
}

fn back_to_dashboard() -> Response {
    Redirect::to("/dashboard").into_response()
}

/// Looks up a document the caller owns. Malformed ids count as unknown.
async fn owned_document(state: &AppState, identity: &Identity, id: &str) -> Option<Document> {
    let id = Uuid::parse_str(id).ok()?;
    match state.documents.find_owned(identity, id).await {
        Ok(found) => found,
        Err(e) => {
            error!("Failed to look up document {}: {:?}", id, e);
            None
        }
    }
}

/// GET /dashboard - Profile header, upload form and the categorized document list.
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Authenticated(identity): Authenticated,
    Query(query): Query<DashboardQuery>,
) -> Response {
    // 1. Load the profile; a session without one is stale
    let profile = match state.accounts.profile(identity.id).await {
        Ok(Some(profile)) => profile,
        Ok(None) => {
            warn!("No profile for signed-in user {}, clearing session", identity.id);
            return (cookies::without_session(jar), Redirect::to("/login")).into_response();
        }
        Err(e) => {
            error!("Failed to load profile for {}: {:?}", identity.id, e);
            return (
                StatusCode::BAD_GATEWAY,
                Html(pages::message(
                    "Error",
                    "No se pudo cargar tu perfil. Intenta de nuevo.",
                    &[("/dashboard", "Reintentar")],
                )),
            )
                .into_response();
        }
    };

    // 2. Load the documents, rendering an empty list with a banner on failure
    let mut error_code = query.error;
    let catalog = match state.documents.list(&identity).await {
        Ok(catalog) => catalog,
        Err(_) => {
            error_code = Some("load_failed".to_string());
            Catalog::new(Vec::new())
        }
    };

    let banner = error_code.as_deref().and_then(pages::upload_error_text);
    Html(pages::dashboard(
        &profile,
        &catalog,
        banner,
        &AllowedExtension::accept_attribute(),
        state.documents.max_upload_bytes(),
    ))
    .into_response()
}

fn multipart_failure(e: MultipartError) -> Response {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        warn!("Upload exceeded the request body limit");
        return Redirect::to("/dashboard?error=too_large").into_response();
    }
    error!("Failed to read multipart upload: {}", e.body_text());
    Redirect::to("/dashboard?error=upload_failed").into_response()
}

/// POST /upload - multipart form with a `file` part and an optional `description` part.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    Authenticated(identity): Authenticated,
    mut multipart: Multipart,
) -> Response {
    let mut request = UploadRequest {
        filename: String::new(),
        declared_content_type: None,
        bytes: Bytes::new(),
        description: None,
    };

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return multipart_failure(e),
        };
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                request.filename = field.file_name().unwrap_or_default().to_string();
                request.declared_content_type = field.content_type().map(str::to_string);
                request.bytes = match field.bytes().await {
                    Ok(bytes) => bytes,
                    Err(e) => return multipart_failure(e),
                };
            }
            Some("description") => {
                request.description = match field.text().await {
                    Ok(text) => Some(text),
                    Err(e) => return multipart_failure(e),
                };
            }
            _ => {}
        }
    }

    match state.documents.upload(&identity, request).await {
        Ok(document) => {
            info!("User {} uploaded document {}", identity.id, document.id);
            back_to_dashboard()
        }
        Err(e) => {
            warn!("Upload by {} rejected: {}", identity.id, e);
            Redirect::to(&format!("/dashboard?error={}", e.code())).into_response()
        }
    }
}

/// POST /delete/{id} - Always lands back on the dashboard.
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Authenticated(identity): Authenticated,
    Path(id): Path<String>,
) -> Response {
    let Ok(id) = Uuid::parse_str(&id) else {
        return back_to_dashboard();
    };
    match state.documents.delete(&identity, id).await {
        Ok(DeleteOutcome::Deleted) => info!("User {} deleted document {}", identity.id, id),
        Ok(DeleteOutcome::NotFound) => warn!("User {} tried to delete unknown document {}", identity.id, id),
        Err(e) => error!("Failed to delete document {}: {:?}", id, e),
    }
    back_to_dashboard()
}

/// GET /download/{id} - Redirect to the stored object.
pub async fn download(
    State(state): State<Arc<AppState>>,
    Authenticated(identity): Authenticated,
    Path(id): Path<String>,
) -> Response {
    let Some(document) = owned_document(&state, &identity, &id).await else {
        return back_to_dashboard();
    };
    match HeaderValue::from_str(&document.locator) {
        Ok(location) => (StatusCode::SEE_OTHER, [(header::LOCATION, location)]).into_response(),
        Err(_) => {
            error!("Document {} has an unusable locator", document.id);
            back_to_dashboard()
        }
    }
}

/// GET /view/{id} - Inline PDF viewer, or a details card for other types.
pub async fn view(
    State(state): State<Arc<AppState>>,
    Authenticated(identity): Authenticated,
    Path(id): Path<String>,
) -> Response {
    match owned_document(&state, &identity, &id).await {
        Some(document) => Html(pages::view(&document)).into_response(),
        None => back_to_dashboard(),
    }
}
