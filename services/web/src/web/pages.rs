//! services/web/src/web/pages.rs
//!
//! Server-rendered HTML. Every page goes through `shell`; all user-supplied
//! text is escaped with `escape` before it is interpolated.

use docurp_core::{Catalog, ConflictError, Document, DocumentFamily, Profile, ServiceError, ValidationError};

const STYLE: &str = r#"
:root { --brand: #34B27B; --brand-dark: #11181C; --card: #FFFFFF; --border: #E5E7EB; }
* { box-sizing: border-box; }
body { margin: 0; font-family: 'Outfit', system-ui, sans-serif; background: var(--brand-dark); color: #F8F9FA; }
main { max-width: 64rem; margin: 0 auto; padding: 2rem 1rem; }
.card { background: rgba(255,255,255,0.05); border: 1px solid rgba(255,255,255,0.1); border-radius: 1rem; padding: 2rem; margin-bottom: 1.5rem; }
.narrow { max-width: 28rem; margin: 4rem auto; }
label { display: block; font-size: .9rem; margin: .75rem 0 .25rem; color: #D1D5DB; }
input, textarea { width: 100%; padding: .6rem .8rem; border-radius: .5rem; border: 1px solid var(--border); }
.button { display: inline-block; background: var(--brand); color: #fff; padding: .6rem 1.2rem; border: 0; border-radius: .6rem; font-weight: 600; text-decoration: none; cursor: pointer; }
.button.secondary { background: rgba(255,255,255,0.1); }
.button.danger { background: #EF4444; }
.error { background: rgba(239,68,68,0.15); border: 1px solid #EF4444; padding: .75rem 1rem; border-radius: .6rem; }
.docs { display: grid; grid-template-columns: repeat(auto-fill, minmax(18rem, 1fr)); gap: 1rem; }
.doc { background: rgba(255,255,255,0.04); border-radius: .8rem; padding: 1rem; }
.muted { color: #9CA3AF; font-size: .85rem; }
.filters button.active { background: var(--brand); }
iframe { width: 100%; height: 85vh; border: 0; border-radius: .8rem; background: #fff; }
"#;

const FILTER_SCRIPT: &str = r#"
function filterDocs(type) {
  document.querySelectorAll('.filters button').forEach(function (b) {
    b.classList.toggle('active', b.dataset.filter === type);
  });
  document.querySelectorAll('[data-category]').forEach(function (cat) {
    cat.style.display = (type === 'all' || type === cat.dataset.category) ? '' : 'none';
  });
  document.getElementById('search-input').value = '';
  searchDocs();
}
function searchDocs() {
  var term = document.getElementById('search-input').value.toLowerCase();
  document.querySelectorAll('[data-doc-name]').forEach(function (card) {
    var hit = card.dataset.docName.toLowerCase().includes(term) ||
              card.dataset.docDesc.toLowerCase().includes(term);
    card.style.display = hit ? '' : 'none';
  });
  if (term) {
    document.querySelectorAll('[data-category]').forEach(function (cat) { cat.style.display = ''; });
  }
}
"#;

// Reset links carry the token in the URL fragment; copy it into the form.
const RESET_SCRIPT: &str = r#"
(function () {
  var params = new URLSearchParams(window.location.hash.substring(1));
  var token = params.get('access_token');
  if (token) { sessionStorage.setItem('reset_token', token); }
  var stored = sessionStorage.getItem('reset_token');
  if (stored) { document.getElementById('access-token').value = stored; }
})();
"#;

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn shell(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} · DocURP</title>
<style>{STYLE}</style>
</head>
<body>
<main>
{body}
</main>
</body>
</html>"#,
        title = escape(title),
    )
}

//=========================================================================================
// Messages
//=========================================================================================

/// A titled card with a short message and follow-up links.
pub fn message(title: &str, text: &str, links: &[(&str, &str)]) -> String {
    let links: String = links
        .iter()
        .map(|(href, label)| format!(r#"<a class="button" href="{}">{}</a> "#, escape(href), escape(label)))
        .collect();
    shell(
        title,
        &format!(
            r#"<div class="card narrow"><h2>{}</h2><p>{}</p><p>{}</p></div>"#,
            escape(title),
            escape(text),
            links
        ),
    )
}

pub fn validation_text(error: &ValidationError) -> String {
    match error {
        ValidationError::EmailDomain { domain } => {
            format!("Solo se permiten correos institucionales @{domain}")
        }
        ValidationError::PasswordTooShort { min } => {
            format!("La contraseña debe tener al menos {min} caracteres")
        }
        ValidationError::PasswordMismatch => "Las contraseñas no coinciden".to_string(),
        ValidationError::StudentCode { len } => {
            format!("El código de estudiante debe tener {len} dígitos")
        }
        ValidationError::EmptyName => "Ingresa tu nombre completo".to_string(),
    }
}

pub fn registration_error_text(error: &ServiceError) -> String {
    match error {
        ServiceError::Validation(v) => validation_text(v),
        ServiceError::Conflict(ConflictError::Email) => "Este correo ya está registrado".to_string(),
        ServiceError::Conflict(ConflictError::StudentCode) => {
            "Este código de estudiante ya está registrado".to_string()
        }
        _ => "Error al crear la cuenta. Por favor intenta de nuevo.".to_string(),
    }
}

pub fn upload_error_text(code: &str) -> Option<&'static str> {
    match code {
        "no_file" => Some("Selecciona un archivo para subir."),
        "invalid_file" => Some("Solo se permiten archivos PDF, Word o Excel."),
        "too_large" => Some("El archivo supera el tamaño máximo permitido."),
        "upload_failed" => Some("No se pudo subir el archivo. Intenta de nuevo."),
        "load_failed" => Some("No se pudieron cargar tus documentos."),
        _ => None,
    }
}

//=========================================================================================
// Account pages
//=========================================================================================

pub fn login() -> String {
    shell(
        "Iniciar sesión",
        r#"<div class="card narrow">
<h1>DocURP</h1>
<p class="muted">Gestiona tus documentos institucionales</p>
<form method="post" action="/login">
<label for="email">Correo institucional</label>
<input id="email" name="email" type="email" required placeholder="correo@urp.edu.pe">
<label for="password">Contraseña</label>
<input id="password" name="password" type="password" required>
<p><button class="button" type="submit">Iniciar sesión</button></p>
</form>
<p class="muted"><a href="/forgot-password">¿Olvidaste tu contraseña?</a> · <a href="/register">Crear cuenta</a></p>
</div>"#,
    )
}

pub fn register(email_domain: &str) -> String {
    shell(
        "Crear cuenta",
        &format!(
            r#"<div class="card narrow">
<h1>Crear cuenta</h1>
<form method="post" action="/register">
<label for="name">Nombre completo</label>
<input id="name" name="name" required>
<label for="student_code">Código de estudiante</label>
<input id="student_code" name="student_code" required inputmode="numeric">
<label for="email">Correo institucional</label>
<input id="email" name="email" type="email" required placeholder="correo@{domain}">
<label for="password">Contraseña</label>
<input id="password" name="password" type="password" required minlength="6">
<label for="confirm_password">Confirmar contraseña</label>
<input id="confirm_password" name="confirm_password" type="password" required minlength="6">
<p><button class="button" type="submit">Registrarse</button></p>
</form>
<p class="muted">¿Ya tienes cuenta? <a href="/login">Inicia sesión</a></p>
</div>"#,
            domain = escape(email_domain),
        ),
    )
}

pub fn registered(email: &str) -> String {
    message(
        "¡Registro Exitoso!",
        &format!("Revisa tu correo para confirmar tu cuenta. Te hemos enviado un email de verificación a {email}."),
        &[("/login", "Iniciar Sesión")],
    )
}

pub fn forgot_password() -> String {
    shell(
        "Recuperar contraseña",
        r#"<div class="card narrow">
<h1>Recuperar contraseña</h1>
<form method="post" action="/forgot-password">
<label for="email">Correo institucional</label>
<input id="email" name="email" type="email" required>
<p><button class="button" type="submit">Enviar enlace</button></p>
</form>
<p class="muted"><a href="/login">Volver al inicio de sesión</a></p>
</div>"#,
    )
}

pub fn reset_password() -> String {
    shell(
        "Nueva contraseña",
        &format!(
            r#"<div class="card narrow">
<h1>Nueva contraseña</h1>
<form method="post" action="/reset-password">
<input id="access-token" name="access_token" type="hidden">
<label for="password">Contraseña</label>
<input id="password" name="password" type="password" required minlength="6">
<label for="confirm_password">Confirmar contraseña</label>
<input id="confirm_password" name="confirm_password" type="password" required minlength="6">
<p><button class="button" type="submit">Actualizar contraseña</button></p>
</form>
</div>
<script>{RESET_SCRIPT}</script>"#
        ),
    )
}

//=========================================================================================
// Documents
//=========================================================================================

fn family_heading(family: DocumentFamily) -> &'static str {
    match family {
        DocumentFamily::Pdf => "Documentos PDF",
        DocumentFamily::Word => "Documentos Word",
        DocumentFamily::Excel => "Hojas de Cálculo Excel",
    }
}

fn short_description(description: Option<&str>) -> String {
    match description {
        Some(d) if d.chars().count() > 50 => format!("{}...", d.chars().take(50).collect::<String>()),
        Some(d) => d.to_string(),
        None => "Sin descripción".to_string(),
    }
}

pub fn kilobytes(size: i64) -> String {
    format!("{:.1} KB", size as f64 / 1024.0)
}

fn document_card(doc: &Document) -> String {
    format!(
        r#"<div class="doc" data-doc-name="{name}" data-doc-desc="{desc}">
<strong>{name}</strong>
<p class="muted">{short}</p>
<p class="muted">{date} · {size}</p>
<a class="button secondary" href="/view/{id}">Ver</a>
<a class="button secondary" href="/download/{id}">Descargar</a>
<form method="post" action="/delete/{id}" style="display:inline" onsubmit="return confirm('¿Estás seguro de eliminar este documento?')">
<button class="button danger" type="submit">Eliminar</button>
</form>
</div>"#,
        name = escape(&doc.filename),
        desc = escape(doc.description.as_deref().unwrap_or_default()),
        short = escape(&short_description(doc.description.as_deref())),
        date = doc.created_at.format("%Y-%m-%d"),
        size = kilobytes(doc.size),
        id = doc.id,
    )
}

fn category_section(slug: &str, heading: &str, docs: &[&Document]) -> String {
    if docs.is_empty() {
        return String::new();
    }
    let cards: String = docs.iter().map(|d| document_card(d)).collect();
    format!(
        r#"<section data-category="{slug}"><h3>{heading}</h3><div class="docs">{cards}</div></section>"#,
        heading = escape(heading),
    )
}

fn catalog_sections(catalog: &Catalog) -> String {
    if catalog.is_empty() {
        return r#"<div class="card"><h2>Mis Documentos</h2><h3>No hay documentos</h3>
<p class="muted">Sube tu primer documento usando el formulario de arriba</p></div>"#
            .to_string();
    }

    let mut sections: String = DocumentFamily::ALL
        .iter()
        .map(|family| category_section(family.slug(), family_heading(*family), &catalog.family(*family)))
        .collect();
    sections.push_str(&category_section("other", "Otros documentos", &catalog.uncategorized()));

    format!(
        r#"<div class="card">
<h2>Mis Documentos ({count})</h2>
<input id="search-input" type="search" placeholder="Buscar documentos..." oninput="searchDocs()">
<p class="filters">
<button class="button secondary active" data-filter="all" onclick="filterDocs('all')">Todos</button>
<button class="button secondary" data-filter="pdf" onclick="filterDocs('pdf')">PDF</button>
<button class="button secondary" data-filter="word" onclick="filterDocs('word')">Word</button>
<button class="button secondary" data-filter="excel" onclick="filterDocs('excel')">Excel</button>
</p>
{sections}
</div>
<script>{FILTER_SCRIPT}</script>"#,
        count = catalog.len(),
    )
}

pub fn dashboard(profile: &Profile, catalog: &Catalog, error: Option<&str>, accept: &str, max_upload_bytes: usize) -> String {
    let banner = error
        .map(|e| format!(r#"<p class="error">{}</p>"#, escape(e)))
        .unwrap_or_default();
    let max_mb = max_upload_bytes / (1024 * 1024);
    shell(
        "Mis documentos",
        &format!(
            r#"<div class="card" style="display:flex;justify-content:space-between;align-items:center">
<div><h1>Hola, {name}</h1><p class="muted">{email}</p></div>
<form method="post" action="/logout"><button class="button danger" type="submit">Cerrar Sesión</button></form>
</div>
{banner}
<div class="card">
<h2>Subir Documento</h2>
<p class="muted">PDF, Word, Excel (máx. {max_mb}MB)</p>
<form method="post" action="/upload" enctype="multipart/form-data">
<input type="file" name="file" accept="{accept}" required>
<label for="description">Descripción (opcional)</label>
<textarea id="description" name="description" rows="2" placeholder="Agrega una descripción para tu documento..."></textarea>
<p><button class="button" type="submit">Subir Documento</button></p>
</form>
</div>
{sections}"#,
            name = escape(&profile.name),
            email = escape(&profile.email),
            accept = escape(accept),
            sections = catalog_sections(catalog),
        ),
    )
}

/// PDFs are embedded; everything else gets a metadata card with a download link.
pub fn view(doc: &Document) -> String {
    let name = escape(&doc.filename);
    let body = if DocumentFamily::classify(&doc.mime_type) == Some(DocumentFamily::Pdf) {
        format!(
            r#"<p><a class="button secondary" href="/dashboard">← Volver al Dashboard</a></p>
<h1>{name}</h1>
<iframe src="/download/{id}" title="{name}"></iframe>"#,
            id = doc.id,
        )
    } else {
        format!(
            r#"<div class="card narrow">
<h1>{name}</h1>
<p>Tipo de archivo: {mime}</p>
<p>Tamaño: {size}</p>
<p class="muted">Este tipo de archivo no se puede previsualizar en el navegador.</p>
<p><a class="button" href="/download/{id}">Descargar</a> <a class="button secondary" href="/dashboard">← Volver al Dashboard</a></p>
</div>"#,
            mime = escape(&doc.mime_type),
            size = format!("{:.2} KB", doc.size as f64 / 1024.0),
            id = doc.id,
        )
    };
    shell(&doc.filename, &body)
}
