//! services/web/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `MetadataStore` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docurp_core::domain::{Document, NewDocument, Profile};
use docurp_core::ports::{MetadataStore, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

const DOCUMENT_COLUMNS: &str =
    "id, user_id, filename, stored_filename, file_path, file_size, mime_type, description, uploaded_at";

const PROFILE_COLUMNS: &str = "id, email, name, student_code, created_at";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `MetadataStore` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct DocumentRecord {
    id: Uuid,
    user_id: Uuid,
    filename: String,
    stored_filename: String,
    file_path: String,
    file_size: i64,
    mime_type: String,
    description: Option<String>,
    uploaded_at: DateTime<Utc>,
}
impl DocumentRecord {
    fn to_domain(self) -> Document {
        Document {
            id: self.id,
            user_id: self.user_id,
            filename: self.filename,
            storage_key: self.stored_filename,
            locator: self.file_path,
            size: self.file_size,
            mime_type: self.mime_type,
            description: self.description,
            created_at: self.uploaded_at,
        }
    }
}

#[derive(FromRow)]
struct ProfileRecord {
    id: Uuid,
    email: String,
    name: String,
    student_code: String,
    created_at: DateTime<Utc>,
}
impl ProfileRecord {
    fn to_domain(self) -> Profile {
        Profile {
            id: self.id,
            email: self.email,
            name: self.name,
            student_code: self.student_code,
            created_at: self.created_at,
        }
    }
}

impl DbAdapter {
    async fn find_profile(&self, column: &str, value: &str) -> PortResult<Option<Profile>> {
        // `column` is always one of the literals below, never user input
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE {column} = $1 LIMIT 1");
        let record = sqlx::query_as::<_, ProfileRecord>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(record.map(ProfileRecord::to_domain))
    }
}

//=========================================================================================
// `MetadataStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl MetadataStore for DbAdapter {
    async fn insert_document(&self, document: NewDocument) -> PortResult<Document> {
        let sql = format!(
            "INSERT INTO documents (user_id, filename, stored_filename, file_path, file_size, mime_type, description) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {DOCUMENT_COLUMNS}"
        );
        let record = sqlx::query_as::<_, DocumentRecord>(&sql)
            .bind(document.user_id)
            .bind(document.filename)
            .bind(document.storage_key)
            .bind(document.locator)
            .bind(document.size)
            .bind(document.mime_type)
            .bind(document.description)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn list_documents(&self, owner: Uuid) -> PortResult<Vec<Document>> {
        let sql = format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE user_id = $1 ORDER BY uploaded_at DESC");
        let records = sqlx::query_as::<_, DocumentRecord>(&sql)
            .bind(owner)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;

        let documents = records.into_iter().map(|r| r.to_domain()).collect();
        Ok(documents)
    }

    async fn delete_document(&self, id: Uuid) -> PortResult<()> {
        sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn find_profile_by_email(&self, email: &str) -> PortResult<Option<Profile>> {
        self.find_profile("lower(email)", &email.to_lowercase()).await
    }

    async fn find_profile_by_student_code(&self, student_code: &str) -> PortResult<Option<Profile>> {
        self.find_profile("student_code", student_code).await
    }

    async fn find_profile_by_id(&self, id: Uuid) -> PortResult<Option<Profile>> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1");
        let record = sqlx::query_as::<_, ProfileRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => PortError::NotFound(format!("Profile {} not found", id)),
                _ => unexpected(e),
            })?;
        Ok(record.map(ProfileRecord::to_domain))
    }
}
