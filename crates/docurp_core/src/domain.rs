//! crates/docurp_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// The signed-in user, as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub student_code: String,
}

/// The profile row created provider-side when an account signs up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub student_code: String,
    pub created_at: DateTime<Utc>,
}

/// Extra attributes attached to an account at sign-up.
#[derive(Debug, Clone)]
pub struct ProfileAttributes {
    pub name: String,
    pub student_code: String,
}

// Bearer tokens of a browser session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    /// Lifetime of the access token, in seconds.
    pub expires_in: i64,
}

/// What the identity provider hands back from a sign-up.
///
/// `tokens` is `None` while the account still waits for email confirmation.
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    pub identity: Identity,
    pub tokens: Option<AuthTokens>,
}

/// A stored document owned by one identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: Uuid,
    pub user_id: Uuid,
    pub filename: String,
    pub storage_key: String,
    pub locator: String,
    pub size: i64,
    pub mime_type: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The metadata row written at the end of an upload.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub user_id: Uuid,
    pub filename: String,
    pub storage_key: String,
    pub locator: String,
    pub size: i64,
    pub mime_type: String,
    pub description: Option<String>,
}
