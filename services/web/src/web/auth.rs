//! services/web/src/web/auth.rs
//!
//! Account endpoints: registration, sign-in, sign-out and password recovery.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use docurp_core::{Registration, ServiceError};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::web::{cookies, middleware::CurrentIdentity, pages, state::AppState};

//=========================================================================================
// Form Payloads
//=========================================================================================

#[derive(Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub student_code: String,
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordForm {
    #[serde(default)]
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordForm {
    pub access_token: Option<String>,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

impl From<RegisterForm> for Registration {
    fn from(form: RegisterForm) -> Self {
        Registration {
            email: form.email,
            password: form.password,
            confirm_password: form.confirm_password,
            name: form.name,
            student_code: form.student_code,
        }
    }
}

fn status_of(error: &ServiceError) -> StatusCode {
    match error {
        ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
        ServiceError::Conflict(_) => StatusCode::CONFLICT,
        ServiceError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
        ServiceError::NotFound => StatusCode::NOT_FOUND,
        ServiceError::Upstream(_) => StatusCode::BAD_GATEWAY,
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET / - Send signed-in users to their documents, everyone else to the login form.
pub async fn index(CurrentIdentity(identity): CurrentIdentity) -> Redirect {
    match identity {
        Some(_) => Redirect::to("/dashboard"),
        None => Redirect::to("/login"),
    }
}

/// GET /register
pub async fn register_page(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(pages::register(&state.config.email_domain))
}

/// POST /register - Create an account. No session is started until the email is confirmed.
pub async fn register_submit(
    State(state): State<Arc<AppState>>,
    Form(form): Form<RegisterForm>,
) -> Response {
    match state.accounts.register(form.into()).await {
        Ok(registered) => {
            if !registered.awaiting_confirmation() {
                info!("Account {} did not require confirmation", registered.identity.id);
            }
            Html(pages::registered(&registered.identity.email)).into_response()
        }
        Err(e) => {
            warn!("Registration rejected: {}", e);
            let text = pages::registration_error_text(&e);
            (
                status_of(&e),
                Html(pages::message("Error en el registro", &text, &[("/register", "Volver")])),
            )
                .into_response()
        }
    }
}

/// GET /login
pub async fn login_page(CurrentIdentity(identity): CurrentIdentity) -> Response {
    match identity {
        Some(_) => Redirect::to("/dashboard").into_response(),
        None => Html(pages::login()).into_response(),
    }
}

/// POST /login - Exchange credentials for session cookies.
pub async fn login_submit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    match state.accounts.sign_in(&form.email, &form.password).await {
        Ok(tokens) => (
            cookies::with_session(jar, &tokens, state.config.secure_cookies),
            Redirect::to("/dashboard"),
        )
            .into_response(),
        // every failure renders the same message
        Err(_) => (
            StatusCode::UNAUTHORIZED,
            Html(pages::message(
                "Error de inicio de sesión",
                "Correo o contraseña incorrectos",
                &[("/login", "Volver a intentar")],
            )),
        )
            .into_response(),
    }
}

/// GET|POST /logout - Clear the session cookies.
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (cookies::without_session(jar), Redirect::to("/login"))
}

/// GET /forgot-password
pub async fn forgot_password_page() -> Html<String> {
    Html(pages::forgot_password())
}

/// Where the emailed reset link should land.
fn reset_redirect(state: &AppState, headers: &HeaderMap) -> String {
    if let Some(base) = &state.config.public_base_url {
        return format!("{base}/reset-password");
    }
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let scheme = if state.config.secure_cookies { "https" } else { "http" };
    format!("{scheme}://{host}/reset-password")
}

/// POST /forgot-password - Ask the identity provider to email a reset link.
pub async fn forgot_password_submit(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<ForgotPasswordForm>,
) -> Response {
    let redirect_to = reset_redirect(&state, &headers);
    match state.accounts.request_password_reset(&form.email, &redirect_to).await {
        Ok(()) => Html(pages::message(
            "Revisa tu correo",
            "Si la cuenta existe, te enviamos un enlace para restablecer tu contraseña.",
            &[("/login", "Volver al inicio de sesión")],
        ))
        .into_response(),
        Err(e) => (
            status_of(&e),
            Html(pages::message(
                "Error",
                "No se pudo enviar el correo de recuperación. Intenta de nuevo.",
                &[("/forgot-password", "Volver")],
            )),
        )
            .into_response(),
    }
}

/// GET /reset-password
pub async fn reset_password_page() -> Html<String> {
    Html(pages::reset_password())
}

/// POST /reset-password - Set a new password using the token from the reset link.
pub async fn reset_password_submit(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ResetPasswordForm>,
) -> Response {
    let result = state
        .accounts
        .reset_password(form.access_token.as_deref(), &form.password, &form.confirm_password)
        .await;

    match result {
        Ok(()) => Html(pages::message(
            "Contraseña actualizada",
            "Tu contraseña se actualizó correctamente.",
            &[("/login", "Iniciar Sesión")],
        ))
        .into_response(),
        Err(e) => {
            let text = match &e {
                ServiceError::Validation(v) => pages::validation_text(v),
                ServiceError::AuthenticationRequired => "Enlace inválido o expirado".to_string(),
                _ => "No se pudo actualizar la contraseña. Solicita un nuevo enlace.".to_string(),
            };
            (
                status_of(&e),
                Html(pages::message("Error", &text, &[("/forgot-password", "Solicitar otro enlace")])),
            )
                .into_response()
        }
    }
}
