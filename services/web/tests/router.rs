//! End-to-end tests of the HTTP surface over the in-memory backend.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, Response, StatusCode},
    Router,
};
use docurp_core::{
    memory::{MemoryBackend, MemoryMetadataStore},
    Document, IdentityProvider, ProfileAttributes,
};
use tower::ServiceExt;
use web_lib::{
    config::Config,
    web::{router, state::AppState},
};

const BOUNDARY: &str = "docurp-test-boundary";

struct TestApp {
    router: Router,
    backend: MemoryBackend,
}

fn app() -> TestApp {
    app_with(memory_config())
}

fn app_with(config: Config) -> TestApp {
    serve(config, MemoryBackend::new("http://localhost:3000/objects", true))
}

fn serve(config: Config, backend: MemoryBackend) -> TestApp {
    let state = Arc::new(AppState::in_memory(Arc::new(config), &backend));
    TestApp {
        router: router(state),
        backend,
    }
}

fn memory_config() -> Config {
    Config::for_memory("127.0.0.1:3000".parse().unwrap())
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Creates a confirmed account and returns a `Cookie` header value for it.
    async fn signed_in(&self, email: &str, student_code: &str) -> String {
        let attributes = ProfileAttributes {
            name: "Ana Torres".to_string(),
            student_code: student_code.to_string(),
        };
        self.backend
            .identity
            .sign_up(email, "abcdef", &attributes)
            .await
            .unwrap();
        assert!(self.backend.identity.confirm(email).await);
        let tokens = self.backend.identity.sign_in(email, "abcdef").await.unwrap();
        format!("sb_access_token={}", tokens.access_token)
    }

    async fn upload(&self, cookie: &str, filename: &str, content_type: &str, bytes: &[u8], description: &str) -> Response<Body> {
        self.send(multipart_request(cookie, filename, content_type, bytes, description))
            .await
    }

    async fn documents(&self) -> Vec<Document> {
        self.backend.metadata.documents().await
    }
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, cookie: Option<&str>, form: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(form.to_string())).unwrap()
}

fn multipart_request(cookie: &str, filename: &str, content_type: &str, bytes: &[u8], description: &str) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(
        format!(
            "\r\n--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"description\"\r\n\r\n{description}\r\n--{BOUNDARY}--\r\n"
        )
        .as_bytes(),
    );
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(header::COOKIE, cookie)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}

async fn text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

//=========================================================================================
// Access control
//=========================================================================================

#[tokio::test]
async fn protected_pages_redirect_anonymous_visitors_to_login() {
    let app = app();
    for uri in ["/dashboard", "/view/whatever", "/download/whatever", "/"] {
        let response = app.send(get(uri, None)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(location(&response), "/login", "{uri}");
    }

    let response = app.send(get("/dashboard", Some("sb_access_token=forged"))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn provider_outage_looks_like_signed_out() {
    let app = app();
    let cookie = app.signed_in("ana@urp.edu.pe", "202220427").await;
    app.backend.identity.fail_all.store(true, Ordering::SeqCst);

    let response = app.send(get("/dashboard", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn health_check_answers_without_a_session() {
    let app = app();
    let response = app.send(get("/healthz", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(text(response).await, "ok");
}

#[tokio::test]
async fn router_builds_with_an_unbounded_upload_limit() {
    let mut config = memory_config();
    config.max_upload_bytes = usize::MAX;
    let app = app_with(config);

    let response = app.send(get("/healthz", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn session_without_a_profile_is_cleared() {
    let backend = MemoryBackend::new("http://localhost:3000/objects", true);
    let stale = MemoryBackend {
        metadata: Arc::new(MemoryMetadataStore::new()),
        ..backend
    };
    let app = serve(memory_config(), stale);
    // sign-up writes the profile into the original store, not the one the app reads
    let cookie = app.signed_in("ana@urp.edu.pe", "202220427").await;

    let response = app.send(get("/dashboard", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    assert!(set_cookies(&response)
        .iter()
        .any(|c| c.starts_with("sb_access_token=") && c.contains("Max-Age=0")));
}

//=========================================================================================
// Accounts
//=========================================================================================

#[tokio::test]
async fn registration_sets_no_cookie_and_login_waits_for_confirmation() {
    let app = app();
    let form = "email=ana%40urp.edu.pe&password=abcdef&confirm_password=abcdef&name=Ana+Torres&student_code=202220427";

    let response = app.send(post_form("/register", None, form)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response).is_empty());
    assert!(text(response).await.contains("Registro Exitoso"));

    let login = "email=ana%40urp.edu.pe&password=abcdef";
    let response = app.send(post_form("/login", None, login)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&response).is_empty());
    assert!(text(response).await.contains("Correo o contraseña incorrectos"));

    assert!(app.backend.identity.confirm("ana@urp.edu.pe").await);
    let response = app.send(post_form("/login", None, login)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard");
    let cookies = set_cookies(&response);
    assert!(cookies.iter().any(|c| c.starts_with("sb_access_token=access-") && c.contains("HttpOnly")));
    assert!(cookies.iter().any(|c| c.starts_with("sb_refresh_token=")));
}

#[tokio::test]
async fn registration_rejects_foreign_email_domains() {
    let app = app();
    let form = "email=ana%40gmail.com&password=abcdef&confirm_password=abcdef&name=Ana&student_code=202220427";

    let response = app.send(post_form("/register", None, form)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(text(response).await.contains("@urp.edu.pe"));
    assert_eq!(app.backend.identity.sign_up_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn duplicate_student_code_is_a_conflict() {
    let app = app();
    app.signed_in("ana@urp.edu.pe", "202220427").await;
    let form = "email=otra%40urp.edu.pe&password=abcdef&confirm_password=abcdef&name=Otra&student_code=202220427";

    let response = app.send(post_form("/register", None, form)).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(text(response).await.contains("código de estudiante ya está registrado"));
}

#[tokio::test]
async fn logout_expires_the_session_cookies() {
    let app = app();
    let cookie = app.signed_in("ana@urp.edu.pe", "202220427").await;

    let response = app.send(post_form("/logout", Some(&cookie), "")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    let cookies = set_cookies(&response);
    assert!(cookies
        .iter()
        .any(|c| c.starts_with("sb_access_token=") && c.contains("Max-Age=0")));
}

#[tokio::test]
async fn password_reset_round_trip() {
    let app = app();
    app.signed_in("ana@urp.edu.pe", "202220427").await;

    let request = Request::builder()
        .method("POST")
        .uri("/forgot-password")
        .header(header::HOST, "docs.test")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("email=ana%40urp.edu.pe"))
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let sent = app.backend.identity.sent_resets().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].redirect_to, "http://docs.test/reset-password");

    let form = format!(
        "access_token={}&password=nueva123&confirm_password=nueva123",
        sent[0].access_token
    );
    let response = app.send(post_form("/reset-password", None, &form)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(text(response).await.contains("Contraseña actualizada"));

    let login = "email=ana%40urp.edu.pe&password=nueva123";
    let response = app.send(post_form("/login", None, login)).await;
    assert_eq!(location(&response), "/dashboard");
}

#[tokio::test]
async fn reset_with_mismatched_passwords_never_reaches_the_provider() {
    let app = app();
    let form = "access_token=anything&password=abcdef&confirm_password=abcdeg";

    let response = app.send(post_form("/reset-password", None, form)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(text(response).await.contains("no coinciden"));
    assert_eq!(app.backend.identity.update_password_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn reset_without_a_token_is_an_invalid_link() {
    let app = app();
    let form = "password=abcdef&confirm_password=abcdef";

    let response = app.send(post_form("/reset-password", None, form)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(text(response).await.contains("Enlace inválido"));
}

//=========================================================================================
// Documents
//=========================================================================================

#[tokio::test]
async fn uploaded_document_appears_on_the_dashboard() {
    let app = app();
    let cookie = app.signed_in("ana@urp.edu.pe", "202220427").await;

    let response = app
        .upload(&cookie, "notes.pdf", "application/pdf", b"%PDF-1.7 hello", "Semana 3")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard");

    let documents = app.documents().await;
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].size, 14);
    assert_eq!(documents[0].mime_type, "application/pdf");

    let response = app.send(get("/dashboard", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = text(response).await;
    assert!(page.contains("Hola, Ana Torres"));
    assert!(page.contains("Mis Documentos (1)"));
    assert!(page.contains("Documentos PDF"));
    assert!(page.contains(r#"data-doc-name="notes.pdf""#));
    assert!(page.contains("Semana 3"));
    assert!(!page.contains("Hojas de Cálculo Excel"));
}

#[tokio::test]
async fn empty_dashboard_shows_the_empty_state() {
    let app = app();
    let cookie = app.signed_in("ana@urp.edu.pe", "202220427").await;

    let page = text(app.send(get("/dashboard", Some(&cookie))).await).await;
    assert!(page.contains("No hay documentos"));
    assert!(page.contains(r#"accept=".pdf,.docx,.doc,.xlsx,.xls""#));
}

#[tokio::test]
async fn rejected_uploads_redirect_with_an_error_code() {
    let app = app();
    let cookie = app.signed_in("ana@urp.edu.pe", "202220427").await;

    let response = app
        .upload(&cookie, "virus.exe", "application/octet-stream", b"MZ", "")
        .await;
    assert_eq!(location(&response), "/dashboard?error=invalid_file");

    let response = app.upload(&cookie, "", "application/pdf", b"", "").await;
    assert_eq!(location(&response), "/dashboard?error=no_file");

    assert!(app.documents().await.is_empty());
    assert!(app.backend.storage.keys().await.is_empty());

    let page = text(app.send(get("/dashboard?error=invalid_file", Some(&cookie))).await).await;
    assert!(page.contains("Solo se permiten archivos PDF, Word o Excel."));
}

#[tokio::test]
async fn oversized_upload_is_reported_as_too_large() {
    let mut config = memory_config();
    config.max_upload_bytes = 1024;
    let app = app_with(config);
    let cookie = app.signed_in("ana@urp.edu.pe", "202220427").await;

    let response = app
        .upload(&cookie, "big.pdf", "application/pdf", &[b'x'; 2048], "")
        .await;
    assert_eq!(location(&response), "/dashboard?error=too_large");
    assert!(app.documents().await.is_empty());
}

#[tokio::test]
async fn storage_failure_redirects_with_upload_failed() {
    let app = app();
    let cookie = app.signed_in("ana@urp.edu.pe", "202220427").await;
    app.backend.storage.fail_put.store(true, Ordering::SeqCst);

    let response = app
        .upload(&cookie, "notes.pdf", "application/pdf", b"%PDF", "")
        .await;
    assert_eq!(location(&response), "/dashboard?error=upload_failed");
    assert!(app.documents().await.is_empty());
}

#[tokio::test]
async fn documents_of_other_users_cannot_be_deleted_or_opened() {
    let app = app();
    let ana = app.signed_in("ana@urp.edu.pe", "202220427").await;
    let bob = app.signed_in("bob@urp.edu.pe", "202220428").await;
    app.upload(&ana, "notes.pdf", "application/pdf", b"%PDF", "").await;
    let id = app.documents().await[0].id;

    let response = app
        .send(post_form(&format!("/delete/{id}"), Some(&bob), ""))
        .await;
    assert_eq!(location(&response), "/dashboard");
    assert_eq!(app.documents().await.len(), 1);

    for uri in [format!("/download/{id}"), format!("/view/{id}")] {
        let response = app.send(get(&uri, Some(&bob))).await;
        assert_eq!(location(&response), "/dashboard", "{uri}");
    }

    let page = text(app.send(get("/dashboard", Some(&bob))).await).await;
    assert!(!page.contains("notes.pdf"));
}

#[tokio::test]
async fn owner_delete_removes_row_and_object() {
    let app = app();
    let cookie = app.signed_in("ana@urp.edu.pe", "202220427").await;
    app.upload(&cookie, "notes.pdf", "application/pdf", b"%PDF", "").await;
    let id = app.documents().await[0].id;

    let response = app
        .send(post_form(&format!("/delete/{id}"), Some(&cookie), ""))
        .await;
    assert_eq!(location(&response), "/dashboard");
    assert!(app.documents().await.is_empty());
    assert!(app.backend.storage.keys().await.is_empty());

    let response = app
        .send(post_form("/delete/not-a-uuid", Some(&cookie), ""))
        .await;
    assert_eq!(location(&response), "/dashboard");
}

#[tokio::test]
async fn download_redirects_to_the_stored_object() {
    let app = app();
    let cookie = app.signed_in("ana@urp.edu.pe", "202220427").await;
    app.upload(&cookie, "notes.pdf", "application/pdf", b"%PDF-1.7", "").await;
    let document = app.documents().await.remove(0);

    let response = app
        .send(get(&format!("/download/{}", document.id), Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), document.locator);

    let response = app
        .send(get(&format!("/objects/{}", document.storage_key), None))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(text(response).await, "%PDF-1.7");
}

#[tokio::test]
async fn locators_with_reserved_characters_resolve_through_objects() {
    let app = app();
    let cookie = app.signed_in("ana@urp.edu.pe", "202220427").await;
    app.upload(&cookie, "tarea#1.pdf", "application/pdf", b"%PDF-1.7", "").await;
    let document = app.documents().await.remove(0);
    assert!(document.storage_key.ends_with("_tarea#1.pdf"));

    let response = app
        .send(get(&format!("/download/{}", document.id), Some(&cookie)))
        .await;
    let locator = location(&response).to_string();
    assert!(locator.ends_with("_tarea%231.pdf"), "{locator}");
    assert!(!locator.contains('#'));

    let path = locator.strip_prefix("http://localhost:3000").unwrap();
    let response = app.send(get(path, None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(text(response).await, "%PDF-1.7");
}

#[tokio::test]
async fn view_embeds_pdfs_and_describes_everything_else() {
    let app = app();
    let cookie = app.signed_in("ana@urp.edu.pe", "202220427").await;
    app.upload(&cookie, "notes.pdf", "application/pdf", b"%PDF", "").await;
    app.upload(&cookie, "budget.xlsx", "application/octet-stream", &[0u8; 2048], "")
        .await;

    for document in app.documents().await {
        let page = text(
            app.send(get(&format!("/view/{}", document.id), Some(&cookie)))
                .await,
        )
        .await;
        if document.filename == "notes.pdf" {
            assert!(page.contains(&format!(r#"<iframe src="/download/{}""#, document.id)));
        } else {
            assert!(!page.contains("<iframe"));
            assert!(page.contains("no se puede previsualizar"));
            assert!(page.contains("2.00 KB"));
            assert!(page.contains("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"));
        }
    }
}

//=========================================================================================
// JSON API
//=========================================================================================

#[tokio::test]
async fn api_requires_a_session() {
    let app = app();
    let response = app.send(get("/api/documents", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn api_search_filters_by_name_and_description() {
    let app = app();
    let cookie = app.signed_in("ana@urp.edu.pe", "202220427").await;
    app.upload(&cookie, "notes.pdf", "application/pdf", b"%PDF", "Semana 3").await;
    app.upload(&cookie, "budget.xlsx", "application/octet-stream", b"PK", "Presupuesto anual")
        .await;

    let response = app.send(get("/api/documents", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let all: serde_json::Value = serde_json::from_str(&text(response).await).unwrap();
    assert_eq!(all["total"], 2);

    let response = app
        .send(get("/api/documents?q=PRESUP", Some(&cookie)))
        .await;
    let found: serde_json::Value = serde_json::from_str(&text(response).await).unwrap();
    assert_eq!(found["total"], 1);
    assert_eq!(found["documents"][0]["filename"], "budget.xlsx");
    assert_eq!(found["documents"][0]["category"], "excel");
}
