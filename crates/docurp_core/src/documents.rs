//! crates/docurp_core/src/documents.rs
//!
//! Upload, listing, deletion and lookup of a user's documents.
//!
//! Uploads are two-phase: the object is written first, then the metadata row.
//! When the second phase fails the object is removed again (best effort).
//! Deletion runs the other way round and tolerates a failed object removal,
//! so the user never sees a row whose file is gone.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::domain::{Document, Identity, NewDocument};
use crate::error::{ServiceError, UploadError};
use crate::ports::{MetadataStore, ObjectStorage};
use crate::timeout::bounded;
use crate::validation::{base_filename, extension_of, AllowedExtension};

/// Advertised and enforced upload ceiling.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

const OCTET_STREAM: &str = "application/octet-stream";

/// One file as received from the upload form.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub filename: String,
    pub declared_content_type: Option<String>,
    pub bytes: Bytes,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The id is absent or belongs to someone else. Nothing was touched.
    NotFound,
}

/// Storage key of an upload: `{owner}/{YYYYmmdd_HHMMSS}_{filename}`.
///
/// Second resolution: two same-named uploads in the same second share a key.
pub fn storage_key(owner: Uuid, filename: &str, at: DateTime<Utc>) -> String {
    format!("{}/{}_{}", owner, at.format("%Y%m%d_%H%M%S"), filename)
}

#[derive(Clone)]
pub struct DocumentService {
    storage: Arc<dyn ObjectStorage>,
    metadata: Arc<dyn MetadataStore>,
    max_upload_bytes: usize,
    timeout: Duration,
}

impl DocumentService {
    pub fn new(
        storage: Arc<dyn ObjectStorage>,
        metadata: Arc<dyn MetadataStore>,
        max_upload_bytes: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            storage,
            metadata,
            max_upload_bytes,
            timeout,
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    pub async fn upload(&self, owner: &Identity, request: UploadRequest) -> Result<Document, UploadError> {
        // --- 1. Local checks, no side effects ---
        let filename = base_filename(&request.filename);
        if filename.is_empty() {
            return Err(UploadError::NoFile);
        }
        let extension = extension_of(filename)
            .and_then(AllowedExtension::parse)
            .ok_or_else(|| UploadError::UnsupportedType {
                extension: extension_of(filename).unwrap_or_default().to_lowercase(),
            })?;
        let size = request.bytes.len();
        if size > self.max_upload_bytes {
            return Err(UploadError::TooLarge {
                size,
                limit: self.max_upload_bytes,
            });
        }

        let key = storage_key(owner.id, filename, Utc::now());
        let mime_type = match request.declared_content_type.as_deref().map(str::trim) {
            Some(declared) if !declared.is_empty() && declared != OCTET_STREAM => declared.to_string(),
            _ => extension.mime_type().to_string(),
        };

        // --- 2. Write the object ---
        bounded(self.timeout, self.storage.put(&key, request.bytes, &mime_type))
            .await
            .map_err(|e| {
                error!("Failed to store object {}: {:?}", key, e);
                UploadError::StorageWrite(e)
            })?;

        // --- 3. Record the metadata, removing the object again on failure ---
        let new_document = NewDocument {
            user_id: owner.id,
            filename: filename.to_string(),
            storage_key: key.clone(),
            locator: self.storage.public_url(&key),
            size: size as i64,
            mime_type,
            description: request
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
        };

        match bounded(self.timeout, self.metadata.insert_document(new_document)).await {
            Ok(document) => {
                info!("Stored document {} ({} bytes) for user {}", document.id, size, owner.id);
                Ok(document)
            }
            Err(e) => {
                error!("Failed to record document {}: {:?}", key, e);
                if let Err(cleanup) = bounded(self.timeout, self.storage.remove(&key)).await {
                    warn!("Orphaned object {} left in storage: {:?}", key, cleanup);
                }
                Err(UploadError::MetadataWrite(e))
            }
        }
    }

    pub async fn list(&self, owner: &Identity) -> Result<Catalog, ServiceError> {
        let documents = bounded(self.timeout, self.metadata.list_documents(owner.id))
            .await
            .map_err(|e| {
                error!("Failed to list documents for user {}: {:?}", owner.id, e);
                e
            })?;
        Ok(Catalog::new(documents))
    }

    /// Fetch-and-match: only documents in the owner's own listing are returned.
    pub async fn find_owned(&self, owner: &Identity, id: Uuid) -> Result<Option<Document>, ServiceError> {
        let catalog = self.list(owner).await?;
        Ok(catalog.all().iter().find(|d| d.id == id).cloned())
    }

    pub async fn delete(&self, owner: &Identity, id: Uuid) -> Result<DeleteOutcome, ServiceError> {
        let Some(document) = self.find_owned(owner, id).await? else {
            return Ok(DeleteOutcome::NotFound);
        };

        if let Err(e) = bounded(self.timeout, self.storage.remove(&document.storage_key)).await {
            warn!("Failed to remove object {} from storage: {:?}", document.storage_key, e);
        }

        bounded(self.timeout, self.metadata.delete_document(document.id))
            .await
            .map_err(|e| {
                error!("Failed to delete document {}: {:?}", document.id, e);
                e
            })?;

        info!("Deleted document {} for user {}", document.id, owner.id);
        Ok(DeleteOutcome::Deleted)
    }
}
