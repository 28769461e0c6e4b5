//! services/web/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use docurp_core::memory::{MemoryBackend, MemoryObjectStorage};
use docurp_core::ports::{IdentityProvider, MetadataStore, ObjectStorage};
use docurp_core::{AccessGate, Accounts, DocumentService, EmailPolicy};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
///
/// Nothing in here is mutated after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub gate: AccessGate,
    pub accounts: Accounts,
    pub documents: DocumentService,
    /// Set in memory mode, where stored objects are served by this process.
    pub memory_objects: Option<Arc<MemoryObjectStorage>>,
}

impl AppState {
    /// Wires the core services over the given port implementations.
    pub fn new(
        config: Arc<Config>,
        identity: Arc<dyn IdentityProvider>,
        storage: Arc<dyn ObjectStorage>,
        metadata: Arc<dyn MetadataStore>,
    ) -> Self {
        let timeout = config.upstream_timeout;
        Self {
            gate: AccessGate::new(identity.clone(), timeout),
            accounts: Accounts::new(
                identity,
                metadata.clone(),
                EmailPolicy::new(config.email_domain.clone()),
                timeout,
            ),
            documents: DocumentService::new(storage, metadata, config.max_upload_bytes, timeout),
            memory_objects: None,
            config,
        }
    }

    pub fn in_memory(config: Arc<Config>, backend: &MemoryBackend) -> Self {
        Self {
            memory_objects: Some(backend.storage.clone()),
            ..Self::new(
                config,
                backend.identity.clone(),
                backend.storage.clone(),
                backend.metadata.clone(),
            )
        }
    }
}
