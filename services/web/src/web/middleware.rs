//! services/web/src/web/middleware.rs
//!
//! Identity middleware and the extractors handlers use to read its result.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use docurp_core::Identity;
use std::sync::Arc;

use crate::web::{cookies, state::AppState};

/// The identity resolved for this request, `None` when signed out.
#[derive(Debug, Clone, Default)]
pub struct CurrentIdentity(pub Option<Identity>);

/// A signed-in identity. Extraction redirects to `/login` otherwise.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Identity);

/// Middleware that resolves the access-token cookie once per request.
///
/// The result is stored as a `CurrentIdentity` request extension. Invalid
/// tokens and provider errors both end up as `CurrentIdentity(None)`.
pub async fn resolve_identity(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    // 1. Read the session cookie
    let jar = CookieJar::from_headers(req.headers());

    // 2. Ask the identity provider who it belongs to
    let identity = state.gate.resolve(cookies::access_token(&jar)).await;

    // 3. Thread the result to the handler
    req.extensions_mut().insert(CurrentIdentity(identity));
    next.run(req).await
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentIdentity {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CurrentIdentity>()
            .cloned()
            .unwrap_or_default())
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Authenticated {
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentIdentity(identity) = match CurrentIdentity::from_request_parts(parts, state).await {
            Ok(current) => current,
            Err(never) => match never {},
        };
        identity.map(Authenticated).ok_or_else(|| Redirect::to("/login"))
    }
}
