//! crates/docurp_core/src/access.rs
//!
//! Resolves the identity behind a session token.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::Identity;
use crate::ports::{IdentityProvider, PortError};
use crate::timeout::bounded;

/// Turns an access token into an `Identity`, or `None` when the caller is not signed in.
///
/// Provider failures (expired token, network error, timeout) are reported as `None`
/// as well, so an outage looks the same as a logged-out browser.
#[derive(Clone)]
pub struct AccessGate {
    identity: Arc<dyn IdentityProvider>,
    timeout: Duration,
}

impl AccessGate {
    pub fn new(identity: Arc<dyn IdentityProvider>, timeout: Duration) -> Self {
        Self { identity, timeout }
    }

    pub async fn resolve(&self, access_token: Option<&str>) -> Option<Identity> {
        let token = access_token.map(str::trim).filter(|t| !t.is_empty())?;

        match bounded(self.timeout, self.identity.resolve_identity(token)).await {
            Ok(identity) => Some(identity),
            Err(PortError::Unauthorized) => {
                debug!("Session token rejected by identity provider");
                None
            }
            Err(e) => {
                warn!("Failed to resolve identity: {:?}", e);
                None
            }
        }
    }
}
