//! services/web/src/web/rest.rs
//!
//! Contains the JSON document listing and the master definition for the
//! OpenAPI specification.

use crate::web::{middleware::CurrentIdentity, state::AppState};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use docurp_core::{Document, DocumentFamily};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{IntoParams, OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_documents_handler,
    ),
    components(
        schemas(CatalogResponse, DocumentResponse)
    ),
    tags(
        (name = "DocURP API", description = "Read access to the signed-in user's documents.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Case-insensitive filter over filename and description.
    pub q: Option<String>,
}

/// One stored document.
#[derive(Serialize, ToSchema)]
pub struct DocumentResponse {
    id: Uuid,
    filename: String,
    mime_type: String,
    /// `pdf`, `word`, `excel`, or null for anything else.
    category: Option<String>,
    size: i64,
    description: Option<String>,
    url: String,
    created_at: DateTime<Utc>,
}

impl From<&Document> for DocumentResponse {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id,
            filename: doc.filename.clone(),
            mime_type: doc.mime_type.clone(),
            category: DocumentFamily::classify(&doc.mime_type).map(|f| f.slug().to_string()),
            size: doc.size,
            description: doc.description.clone(),
            url: format!("/download/{}", doc.id),
            created_at: doc.created_at,
        }
    }
}

/// The caller's documents, newest first.
#[derive(Serialize, ToSchema)]
pub struct CatalogResponse {
    total: usize,
    documents: Vec<DocumentResponse>,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// List the signed-in user's documents.
///
/// Authenticates with the session cookie set by the login form.
#[utoipa::path(
    get,
    path = "/api/documents",
    params(SearchQuery),
    responses(
        (status = 200, description = "Documents of the signed-in user", body = CatalogResponse),
        (status = 401, description = "No valid session cookie"),
        (status = 502, description = "The metadata store could not be reached")
    )
)]
pub async fn list_documents_handler(
    State(app_state): State<Arc<AppState>>,
    CurrentIdentity(identity): CurrentIdentity,
    Query(query): Query<SearchQuery>,
) -> Result<Json<CatalogResponse>, (StatusCode, String)> {
    let identity = identity.ok_or((StatusCode::UNAUTHORIZED, "Not signed in".to_string()))?;

    let catalog = app_state.documents.list(&identity).await.map_err(|e| {
        error!("Failed to list documents for {}: {:?}", identity.id, e);
        (StatusCode::BAD_GATEWAY, "Failed to list documents".to_string())
    })?;
    let catalog = catalog.search(query.q.as_deref().unwrap_or_default());

    let documents: Vec<DocumentResponse> = catalog.all().iter().map(DocumentResponse::from).collect();
    Ok(Json(CatalogResponse {
        total: documents.len(),
        documents,
    }))
}
