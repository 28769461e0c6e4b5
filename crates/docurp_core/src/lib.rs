pub mod access;
pub mod accounts;
pub mod catalog;
pub mod documents;
pub mod domain;
pub mod error;
pub mod memory;
pub mod ports;
pub mod validation;

mod timeout;

#[cfg(test)]
mod tests;

pub use access::AccessGate;
pub use accounts::{Accounts, Registered, Registration};
pub use catalog::{Catalog, DocumentFamily};
pub use documents::{DeleteOutcome, DocumentService, UploadRequest, DEFAULT_MAX_UPLOAD_BYTES};
pub use domain::{AuthTokens, Document, Identity, NewDocument, Profile, ProfileAttributes, SignUpOutcome};
pub use error::{ConflictError, ServiceError, UploadError, ValidationError};
pub use ports::{IdentityProvider, MetadataStore, ObjectStorage, PortError, PortResult};
pub use validation::EmailPolicy;
