//! crates/docurp_core/src/accounts.rs
//!
//! Registration, sign-in and password-reset flows. Every local check runs
//! before the identity provider is contacted.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{AuthTokens, Identity, Profile, ProfileAttributes};
use crate::error::{ConflictError, ServiceError, ValidationError};
use crate::ports::{IdentityProvider, MetadataStore};
use crate::timeout::bounded;
use crate::validation::{self, EmailPolicy};

/// The fields of the registration form.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub name: String,
    pub student_code: String,
}

#[derive(Debug, Clone)]
pub struct Registered {
    pub identity: Identity,
    /// Present only when the provider signs the account in right away.
    pub tokens: Option<AuthTokens>,
}

impl Registered {
    pub fn awaiting_confirmation(&self) -> bool {
        self.tokens.is_none()
    }
}

#[derive(Clone)]
pub struct Accounts {
    identity: Arc<dyn IdentityProvider>,
    metadata: Arc<dyn MetadataStore>,
    email_policy: EmailPolicy,
    timeout: Duration,
}

impl Accounts {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        metadata: Arc<dyn MetadataStore>,
        email_policy: EmailPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            identity,
            metadata,
            email_policy,
            timeout,
        }
    }

    pub fn email_policy(&self) -> &EmailPolicy {
        &self.email_policy
    }

    pub async fn register(&self, form: Registration) -> Result<Registered, ServiceError> {
        let email = form.email.trim().to_lowercase();
        let name = form.name.trim();
        let student_code = form.student_code.trim();

        validation::check_password_length(&form.password)?;
        self.email_policy.check(&email)?;
        validation::check_password_confirmation(&form.password, &form.confirm_password)?;
        validation::check_student_code(student_code)?;
        if name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }

        let by_email = bounded(self.timeout, self.metadata.find_profile_by_email(&email))
            .await
            .map_err(|e| {
                error!("Failed to look up profile by email: {:?}", e);
                e
            })?;
        if by_email.is_some() {
            return Err(ConflictError::Email.into());
        }

        let by_code = bounded(self.timeout, self.metadata.find_profile_by_student_code(student_code))
            .await
            .map_err(|e| {
                error!("Failed to look up profile by student code: {:?}", e);
                e
            })?;
        if by_code.is_some() {
            return Err(ConflictError::StudentCode.into());
        }

        let attributes = ProfileAttributes {
            name: name.to_string(),
            student_code: student_code.to_string(),
        };
        let outcome = bounded(
            self.timeout,
            self.identity.sign_up(&email, &form.password, &attributes),
        )
        .await
        .map_err(|e| {
            error!("Failed to sign up user: {:?}", e);
            e
        })?;

        info!("Registered account {}", outcome.identity.id);
        Ok(Registered {
            identity: outcome.identity,
            tokens: outcome.tokens,
        })
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthTokens, ServiceError> {
        let email = email.trim().to_lowercase();
        bounded(self.timeout, self.identity.sign_in(&email, password))
            .await
            .map_err(|e| {
                warn!("Sign-in failed: {:?}", e);
                ServiceError::Upstream(e)
            })
    }

    pub async fn request_password_reset(&self, email: &str, redirect_to: &str) -> Result<(), ServiceError> {
        let email = email.trim().to_lowercase();
        bounded(self.timeout, self.identity.send_password_reset(&email, redirect_to))
            .await
            .map_err(|e| {
                error!("Failed to send password reset email: {:?}", e);
                ServiceError::Upstream(e)
            })?;
        info!("Password reset email requested, redirecting to {}", redirect_to);
        Ok(())
    }

    pub async fn reset_password(
        &self,
        access_token: Option<&str>,
        password: &str,
        confirm_password: &str,
    ) -> Result<(), ServiceError> {
        validation::check_password_confirmation(password, confirm_password)?;
        validation::check_password_length(password)?;
        let token = access_token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ServiceError::AuthenticationRequired)?;

        bounded(self.timeout, self.identity.update_password(token, password))
            .await
            .map_err(|e| {
                error!("Failed to update password: {:?}", e);
                ServiceError::Upstream(e)
            })
    }

    pub async fn profile(&self, id: Uuid) -> Result<Option<Profile>, ServiceError> {
        Ok(bounded(self.timeout, self.metadata.find_profile_by_id(id)).await?)
    }
}
