//! services/web/src/adapters/auth.rs
//!
//! This module contains the adapter for the hosted GoTrue auth API.
//! It implements the `IdentityProvider` port from the `core` crate.

use async_trait::async_trait;
use docurp_core::domain::{AuthTokens, Identity, ProfileAttributes, SignUpOutcome};
use docurp_core::ports::{IdentityProvider, PortError, PortResult};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    data: SignUpData<'a>,
}

#[derive(Serialize)]
struct SignUpData<'a> {
    name: &'a str,
    student_code: &'a str,
}

#[derive(Serialize)]
struct RecoverRequest<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct PasswordUpdate<'a> {
    password: &'a str,
}

#[derive(Deserialize, Default)]
struct UserMetadata {
    name: Option<String>,
    student_code: Option<String>,
}

#[derive(Deserialize)]
struct GoTrueUser {
    id: Uuid,
    email: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadata,
}

impl GoTrueUser {
    fn to_domain(self) -> Identity {
        Identity {
            id: self.id,
            email: self.email.unwrap_or_default(),
            name: self.user_metadata.name.unwrap_or_default(),
            student_code: self.user_metadata.student_code.unwrap_or_default(),
        }
    }
}

#[derive(Deserialize)]
struct SessionResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: GoTrueUser,
}

impl SessionResponse {
    fn tokens(&self) -> AuthTokens {
        AuthTokens {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            expires_in: self.expires_in,
        }
    }
}

/// Sign-up returns a full session when email confirmation is off, and only the
/// user otherwise.
#[derive(Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(SessionResponse),
    User(GoTrueUser),
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `IdentityProvider` port over the GoTrue REST API.
#[derive(Clone)]
pub struct SupabaseAuthAdapter {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseAuthAdapter {
    /// Creates a new `SupabaseAuthAdapter`. `project_url` is the bare project URL.
    pub fn new(client: Client, project_url: &str, anon_key: String) -> Self {
        Self {
            client,
            base_url: format!("{}/auth/v1", project_url.trim_end_matches('/')),
            anon_key,
        }
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header("apikey", &self.anon_key)
    }

    async fn send(&self, builder: RequestBuilder) -> PortResult<Response> {
        let response = self
            .request(builder)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("auth request failed: {e}")))?;
        check_status(response).await
    }
}

/// Maps GoTrue error statuses onto `PortError`.
async fn check_status(response: Response) -> PortResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<no body>".to_string());
    debug!("GoTrue answered {}: {}", status, body);
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PortError::Unauthorized,
        StatusCode::NOT_FOUND => PortError::NotFound(body),
        s if s.is_client_error() => PortError::Rejected(body),
        s => PortError::Unexpected(format!("auth service answered {s}: {body}")),
    })
}

async fn decode<T: for<'de> Deserialize<'de>>(response: Response) -> PortResult<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| PortError::Unexpected(format!("auth response parse error: {e}")))
}

//=========================================================================================
// `IdentityProvider` Trait Implementation
//=========================================================================================

#[async_trait]
impl IdentityProvider for SupabaseAuthAdapter {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        attributes: &ProfileAttributes,
    ) -> PortResult<SignUpOutcome> {
        let body = SignUpRequest {
            email,
            password,
            data: SignUpData {
                name: &attributes.name,
                student_code: &attributes.student_code,
            },
        };
        let response = self
            .send(self.client.post(format!("{}/signup", self.base_url)).json(&body))
            .await?;

        Ok(match decode::<SignUpResponse>(response).await? {
            SignUpResponse::Session(session) => SignUpOutcome {
                tokens: Some(session.tokens()),
                identity: session.user.to_domain(),
            },
            SignUpResponse::User(user) => SignUpOutcome {
                identity: user.to_domain(),
                tokens: None,
            },
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> PortResult<AuthTokens> {
        let response = self
            .send(
                self.client
                    .post(format!("{}/token", self.base_url))
                    .query(&[("grant_type", "password")])
                    .json(&Credentials { email, password }),
            )
            .await?;
        let session: SessionResponse = decode(response).await?;
        Ok(session.tokens())
    }

    async fn resolve_identity(&self, access_token: &str) -> PortResult<Identity> {
        let response = self
            .send(
                self.client
                    .get(format!("{}/user", self.base_url))
                    .bearer_auth(access_token),
            )
            .await?;
        let user: GoTrueUser = decode(response).await?;
        Ok(user.to_domain())
    }

    async fn send_password_reset(&self, email: &str, redirect_to: &str) -> PortResult<()> {
        self.send(
            self.client
                .post(format!("{}/recover", self.base_url))
                .query(&[("redirect_to", redirect_to)])
                .json(&RecoverRequest { email }),
        )
        .await?;
        Ok(())
    }

    async fn update_password(&self, access_token: &str, new_password: &str) -> PortResult<()> {
        self.send(
            self.client
                .put(format!("{}/user", self.base_url))
                .bearer_auth(access_token)
                .json(&PasswordUpdate {
                    password: new_password,
                }),
        )
        .await?;
        Ok(())
    }
}
