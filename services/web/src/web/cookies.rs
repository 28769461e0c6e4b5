//! services/web/src/web/cookies.rs
//!
//! Session cookies: set, read and clear the two http-only auth cookies.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use docurp_core::AuthTokens;
use time::Duration;

/// Cookie name for the short-lived access token.
pub const ACCESS_COOKIE: &str = "sb_access_token";
/// Cookie name for the refresh token.
pub const REFRESH_COOKIE: &str = "sb_refresh_token";

const REFRESH_MAX_AGE: Duration = Duration::days(7);

fn build(name: &'static str, value: String, max_age: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(max_age)
        .build()
}

/// Adds both session cookies to the jar.
pub fn with_session(jar: CookieJar, tokens: &AuthTokens, secure: bool) -> CookieJar {
    jar.add(build(
        ACCESS_COOKIE,
        tokens.access_token.clone(),
        Duration::seconds(tokens.expires_in),
        secure,
    ))
    .add(build(REFRESH_COOKIE, tokens.refresh_token.clone(), REFRESH_MAX_AGE, secure))
}

/// Expires both session cookies.
pub fn without_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(ACCESS_COOKIE).path("/"))
        .remove(Cookie::build(REFRESH_COOKIE).path("/"))
}

pub fn access_token(jar: &CookieJar) -> Option<&str> {
    jar.get(ACCESS_COOKIE).map(|c| c.value())
}
