//! Service-level tests against the in-memory ports.


use std::time::Duration;

use crate::memory::MemoryBackend;
use crate::{AccessGate, Accounts, DocumentService, EmailPolicy, Identity, DEFAULT_MAX_UPLOAD_BYTES};

pub(crate) const TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) struct Harness {
    pub backend: MemoryBackend,
    pub accounts: Accounts,
    pub documents: DocumentService,
    pub gate: AccessGate,
}

pub(crate) fn harness() -> Harness {
    harness_with_timeout(TIMEOUT)
}

pub(crate) fn harness_with_timeout(timeout: Duration) -> Harness {
    let backend = MemoryBackend::new("https://storage.test/documents", true);
    let accounts = Accounts::new(
        backend.identity.clone(),
        backend.metadata.clone(),
        EmailPolicy::new("urp.edu.pe"),
        timeout,
    );
    let documents = DocumentService::new(
        backend.storage.clone(),
        backend.metadata.clone(),
        DEFAULT_MAX_UPLOAD_BYTES,
        timeout,
    );
    let gate = AccessGate::new(backend.identity.clone(), timeout);
    Harness {
        backend,
        accounts,
        documents,
        gate,
    }
}

pub(crate) fn identity(email: &str) -> Identity {
    Identity {
        id: uuid::Uuid::new_v4(),
        email: email.to_string(),
        name: "Test".to_string(),
        student_code: "202200001".to_string(),
    }
}
