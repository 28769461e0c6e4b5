//! crates/docurp_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the hosted collaborators.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete auth, storage and database backends.

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::domain::{AuthTokens, Document, Identity, NewDocument, Profile, ProfileAttributes, SignUpOutcome};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Rejected by provider: {0}")]
    Rejected(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Upstream call timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Creates the account. The provider is expected to create the profile row.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        attributes: &ProfileAttributes,
    ) -> PortResult<SignUpOutcome>;

    async fn sign_in(&self, email: &str, password: &str) -> PortResult<AuthTokens>;

    /// Verifies an access token and returns its owner.
    async fn resolve_identity(&self, access_token: &str) -> PortResult<Identity>;

    async fn send_password_reset(&self, email: &str, redirect_to: &str) -> PortResult<()>;

    async fn update_password(&self, access_token: &str, new_password: &str) -> PortResult<()>;
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Writes `bytes` under `key`, replacing any existing object.
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> PortResult<()>;

    async fn remove(&self, key: &str) -> PortResult<()>;

    /// The locator a browser can fetch the object from. No network call.
    fn public_url(&self, key: &str) -> String;
}

#[async_trait]
pub trait MetadataStore: Send + Sync {
    // --- Documents ---
    async fn insert_document(&self, document: NewDocument) -> PortResult<Document>;

    /// All documents of `owner`, most recent first.
    async fn list_documents(&self, owner: Uuid) -> PortResult<Vec<Document>>;

    async fn delete_document(&self, id: Uuid) -> PortResult<()>;

    // --- Profiles ---
    async fn find_profile_by_email(&self, email: &str) -> PortResult<Option<Profile>>;

    async fn find_profile_by_student_code(&self, student_code: &str) -> PortResult<Option<Profile>>;

    async fn find_profile_by_id(&self, id: Uuid) -> PortResult<Option<Profile>>;
}
