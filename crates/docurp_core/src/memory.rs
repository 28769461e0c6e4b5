//! crates/docurp_core/src/memory.rs
//!
//! In-process implementations of the ports. They back the test suites and the
//! `BACKEND=memory` development mode, and can be told to fail or stall on demand.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::{AuthTokens, Document, Identity, NewDocument, Profile, ProfileAttributes, SignUpOutcome};
use crate::ports::{IdentityProvider, MetadataStore, ObjectStorage, PortError, PortResult};

const ACCESS_TOKEN_TTL_SECS: i64 = 3600;

fn injected(what: &str) -> PortError {
    PortError::Unexpected(format!("injected {what} failure"))
}

//=========================================================================================
// Metadata store
//=========================================================================================

#[derive(Default)]
pub struct MemoryMetadataStore {
    documents: Mutex<Vec<Document>>,
    profiles: Mutex<Vec<Profile>>,
    pub fail_insert: AtomicBool,
    pub fail_delete: AtomicBool,
    pub fail_list: AtomicBool,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_profile(&self, profile: Profile) {
        self.profiles.lock().await.push(profile);
    }

    /// Every stored row, regardless of owner.
    pub async fn documents(&self) -> Vec<Document> {
        self.documents.lock().await.clone()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn insert_document(&self, document: NewDocument) -> PortResult<Document> {
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(injected("insert"));
        }
        let row = Document {
            id: Uuid::new_v4(),
            user_id: document.user_id,
            filename: document.filename,
            storage_key: document.storage_key,
            locator: document.locator,
            size: document.size,
            mime_type: document.mime_type,
            description: document.description,
            created_at: Utc::now(),
        };
        self.documents.lock().await.push(row.clone());
        Ok(row)
    }

    async fn list_documents(&self, owner: Uuid) -> PortResult<Vec<Document>> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(injected("list"));
        }
        let mut rows: Vec<Document> = self
            .documents
            .lock()
            .await
            .iter()
            .filter(|d| d.user_id == owner)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn delete_document(&self, id: Uuid) -> PortResult<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(injected("delete"));
        }
        self.documents.lock().await.retain(|d| d.id != id);
        Ok(())
    }

    async fn find_profile_by_email(&self, email: &str) -> PortResult<Option<Profile>> {
        let email = email.to_lowercase();
        Ok(self.profiles.lock().await.iter().find(|p| p.email == email).cloned())
    }

    async fn find_profile_by_student_code(&self, student_code: &str) -> PortResult<Option<Profile>> {
        Ok(self
            .profiles
            .lock()
            .await
            .iter()
            .find(|p| p.student_code == student_code)
            .cloned())
    }

    async fn find_profile_by_id(&self, id: Uuid) -> PortResult<Option<Profile>> {
        Ok(self.profiles.lock().await.iter().find(|p| p.id == id).cloned())
    }
}

//=========================================================================================
// Object storage
//=========================================================================================

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Bytes,
    pub content_type: String,
}

pub struct MemoryObjectStorage {
    base_url: String,
    objects: Mutex<HashMap<String, StoredObject>>,
    latency: Mutex<Duration>,
    pub fail_put: AtomicBool,
    pub fail_remove: AtomicBool,
    pub puts: AtomicUsize,
}

impl MemoryObjectStorage {
    /// `base_url` prefixes every locator, e.g. `http://localhost:3000/objects`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            objects: Mutex::new(HashMap::new()),
            latency: Mutex::new(Duration::ZERO),
            fail_put: AtomicBool::new(false),
            fail_remove: AtomicBool::new(false),
            puts: AtomicUsize::new(0),
        }
    }

    pub async fn set_latency(&self, latency: Duration) {
        *self.latency.lock().await = latency;
    }

    pub async fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().await.get(key).cloned()
    }

    pub async fn keys(&self) -> Vec<String> {
        self.objects.lock().await.keys().cloned().collect()
    }
}

#[async_trait]
impl ObjectStorage for MemoryObjectStorage {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> PortResult<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        let latency = *self.latency.lock().await;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(injected("put"));
        }
        self.objects.lock().await.insert(
            key.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(injected("remove"));
        }
        self.objects.lock().await.remove(key);
        Ok(())
    }

    /// `{base_url}/{key}` with every key segment percent-encoded.
    fn public_url(&self, key: &str) -> String {
        let path: Vec<String> = key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("{}/{}", self.base_url, path.join("/"))
    }
}

//=========================================================================================
// Identity provider
//=========================================================================================

struct Account {
    identity: Identity,
    password: String,
    confirmed: bool,
}

/// A password reset email that would have been sent.
#[derive(Debug, Clone)]
pub struct SentReset {
    pub email: String,
    pub redirect_to: String,
    pub access_token: String,
}

/// Accounts live in memory; sign-up writes the profile row the way the hosted
/// provider's trigger does.
pub struct MemoryIdentityProvider {
    profiles: Arc<MemoryMetadataStore>,
    require_confirmation: bool,
    accounts: Mutex<HashMap<String, Account>>,
    tokens: Mutex<HashMap<String, Uuid>>,
    outbox: Mutex<Vec<SentReset>>,
    latency: Mutex<Duration>,
    pub fail_all: AtomicBool,
    pub sign_up_calls: AtomicUsize,
    pub update_password_calls: AtomicUsize,
}

impl MemoryIdentityProvider {
    pub fn new(profiles: Arc<MemoryMetadataStore>, require_confirmation: bool) -> Self {
        Self {
            profiles,
            require_confirmation,
            accounts: Mutex::new(HashMap::new()),
            tokens: Mutex::new(HashMap::new()),
            outbox: Mutex::new(Vec::new()),
            latency: Mutex::new(Duration::ZERO),
            fail_all: AtomicBool::new(false),
            sign_up_calls: AtomicUsize::new(0),
            update_password_calls: AtomicUsize::new(0),
        }
    }

    /// Marks the account's email as confirmed, as following the emailed link would.
    pub async fn confirm(&self, email: &str) -> bool {
        match self.accounts.lock().await.get_mut(&email.to_lowercase()) {
            Some(account) => {
                account.confirmed = true;
                true
            }
            None => false,
        }
    }

    pub async fn sent_resets(&self) -> Vec<SentReset> {
        self.outbox.lock().await.clone()
    }

    /// Delays every provider call by `latency`.
    pub async fn set_latency(&self, latency: Duration) {
        *self.latency.lock().await = latency;
    }

    async fn stall(&self) {
        let latency = *self.latency.lock().await;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    fn check_available(&self) -> PortResult<()> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(injected("identity provider"));
        }
        Ok(())
    }

    async fn issue_tokens(&self, user_id: Uuid) -> AuthTokens {
        let access_token = format!("access-{}", Uuid::new_v4());
        self.tokens.lock().await.insert(access_token.clone(), user_id);
        AuthTokens {
            access_token,
            refresh_token: format!("refresh-{}", Uuid::new_v4()),
            expires_in: ACCESS_TOKEN_TTL_SECS,
        }
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        attributes: &ProfileAttributes,
    ) -> PortResult<SignUpOutcome> {
        self.sign_up_calls.fetch_add(1, Ordering::SeqCst);
        self.stall().await;
        self.check_available()?;
        let email = email.to_lowercase();

        let identity = {
            let mut accounts = self.accounts.lock().await;
            if accounts.contains_key(&email) {
                return Err(PortError::Rejected("User already registered".to_string()));
            }
            let identity = Identity {
                id: Uuid::new_v4(),
                email: email.clone(),
                name: attributes.name.clone(),
                student_code: attributes.student_code.clone(),
            };
            accounts.insert(
                email.clone(),
                Account {
                    identity: identity.clone(),
                    password: password.to_string(),
                    confirmed: !self.require_confirmation,
                },
            );
            identity
        };

        self.profiles
            .add_profile(Profile {
                id: identity.id,
                email,
                name: identity.name.clone(),
                student_code: identity.student_code.clone(),
                created_at: Utc::now(),
            })
            .await;

        let tokens = if self.require_confirmation {
            None
        } else {
            Some(self.issue_tokens(identity.id).await)
        };
        Ok(SignUpOutcome { identity, tokens })
    }

    async fn sign_in(&self, email: &str, password: &str) -> PortResult<AuthTokens> {
        self.stall().await;
        self.check_available()?;
        let user_id = {
            let accounts = self.accounts.lock().await;
            let account = accounts
                .get(&email.to_lowercase())
                .filter(|a| a.password == password)
                .ok_or_else(|| PortError::Rejected("Invalid login credentials".to_string()))?;
            if !account.confirmed {
                return Err(PortError::Rejected("Email not confirmed".to_string()));
            }
            account.identity.id
        };
        Ok(self.issue_tokens(user_id).await)
    }

    async fn resolve_identity(&self, access_token: &str) -> PortResult<Identity> {
        self.stall().await;
        self.check_available()?;
        let user_id = *self
            .tokens
            .lock()
            .await
            .get(access_token)
            .ok_or(PortError::Unauthorized)?;
        self.accounts
            .lock()
            .await
            .values()
            .find(|a| a.identity.id == user_id)
            .map(|a| a.identity.clone())
            .ok_or(PortError::Unauthorized)
    }

    async fn send_password_reset(&self, email: &str, redirect_to: &str) -> PortResult<()> {
        self.stall().await;
        self.check_available()?;
        let email = email.to_lowercase();
        let user_id = self.accounts.lock().await.get(&email).map(|a| a.identity.id);
        // unknown addresses succeed silently, like the hosted provider
        if let Some(user_id) = user_id {
            let tokens = self.issue_tokens(user_id).await;
            self.outbox.lock().await.push(SentReset {
                email,
                redirect_to: redirect_to.to_string(),
                access_token: tokens.access_token,
            });
        }
        Ok(())
    }

    async fn update_password(&self, access_token: &str, new_password: &str) -> PortResult<()> {
        self.update_password_calls.fetch_add(1, Ordering::SeqCst);
        self.stall().await;
        self.check_available()?;
        let user_id = *self
            .tokens
            .lock()
            .await
            .get(access_token)
            .ok_or(PortError::Unauthorized)?;
        let mut accounts = self.accounts.lock().await;
        let account = accounts
            .values_mut()
            .find(|a| a.identity.id == user_id)
            .ok_or(PortError::Unauthorized)?;
        account.password = new_password.to_string();
        Ok(())
    }
}

//=========================================================================================
// Bundle
//=========================================================================================

/// The three in-memory ports wired together.
#[derive(Clone)]
pub struct MemoryBackend {
    pub identity: Arc<MemoryIdentityProvider>,
    pub storage: Arc<MemoryObjectStorage>,
    pub metadata: Arc<MemoryMetadataStore>,
}

impl MemoryBackend {
    pub fn new(locator_base: impl Into<String>, require_confirmation: bool) -> Self {
        let metadata = Arc::new(MemoryMetadataStore::new());
        Self {
            identity: Arc::new(MemoryIdentityProvider::new(metadata.clone(), require_confirmation)),
            storage: Arc::new(MemoryObjectStorage::new(locator_base)),
            metadata,
        }
    }
}
