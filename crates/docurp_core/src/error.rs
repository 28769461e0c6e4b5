//! crates/docurp_core/src/error.rs
//!
//! Error kinds surfaced by the core services. Port errors are converted into
//! these at every pipeline step; nothing above the core sees a raw provider error.

use crate::ports::PortError;

/// A form value that failed a local check.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("only institutional @{domain} addresses may register")]
    EmailDomain { domain: String },
    #[error("the password must be at least {min} characters long")]
    PasswordTooShort { min: usize },
    #[error("the passwords do not match")]
    PasswordMismatch,
    #[error("the student code must be exactly {len} digits")]
    StudentCode { len: usize },
    #[error("the name must not be empty")]
    EmptyName,
}

/// The account already exists under one of its unique keys.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConflictError {
    #[error("this email is already registered")]
    Email,
    #[error("this student code is already registered")]
    StudentCode,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("authentication required")]
    AuthenticationRequired,
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("conflict: {0}")]
    Conflict(#[from] ConflictError),
    #[error("upstream failure: {0}")]
    Upstream(#[from] PortError),
    #[error("not found")]
    NotFound,
}

/// Failures of the upload pipeline, in the order the steps run.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("no file was submitted")]
    NoFile,
    #[error("files of type '{extension}' are not accepted")]
    UnsupportedType { extension: String },
    #[error("the file is {size} bytes, above the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },
    #[error("storing the file failed: {0}")]
    StorageWrite(PortError),
    #[error("recording the document failed: {0}")]
    MetadataWrite(PortError),
}

impl UploadError {
    /// Short code carried in the dashboard redirect.
    pub fn code(&self) -> &'static str {
        match self {
            UploadError::NoFile => "no_file",
            UploadError::UnsupportedType { .. } => "invalid_file",
            UploadError::TooLarge { .. } => "too_large",
            UploadError::StorageWrite(_) | UploadError::MetadataWrite(_) => "upload_failed",
        }
    }
}
