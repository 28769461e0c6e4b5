//! services/web/src/adapters/storage.rs
//!
//! This module contains the adapter for the hosted Storage API.
//! It implements the `ObjectStorage` port from the `core` crate.

use async_trait::async_trait;
use bytes::Bytes;
use docurp_core::ports::{ObjectStorage, PortError, PortResult};
use reqwest::{header::CONTENT_TYPE, Client, Url};
use serde::Serialize;

#[derive(Serialize)]
struct RemoveRequest<'a> {
    prefixes: [&'a str; 1],
}

/// An adapter that implements the `ObjectStorage` port for one storage bucket.
#[derive(Clone)]
pub struct SupabaseStorageAdapter {
    client: Client,
    api_base: Url,
    bucket: String,
    service_key: String,
}

impl SupabaseStorageAdapter {
    /// Creates a new `SupabaseStorageAdapter`. `project_url` is the bare project URL.
    pub fn new(client: Client, project_url: &str, bucket: String, service_key: String) -> Result<Self, PortError> {
        let api_base = Url::parse(&format!("{}/storage/v1/", project_url.trim_end_matches('/')))
            .map_err(|e| PortError::Unexpected(format!("invalid storage URL: {e}")))?;
        Ok(Self {
            client,
            api_base,
            bucket,
            service_key,
        })
    }

    /// `{api}/object[/public]/{bucket}/{key...}` with every key segment escaped.
    fn object_url(&self, public: bool, key: &str) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("object");
            if public {
                segments.push("public");
            }
            segments.push(&self.bucket);
            segments.extend(key.split('/'));
        }
        url
    }

    async fn expect_success(response: reqwest::Response, action: &str) -> PortResult<()> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());
        Err(PortError::Unexpected(format!("storage {action} failed: {status} {body}")))
    }
}

#[async_trait]
impl ObjectStorage for SupabaseStorageAdapter {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> PortResult<()> {
        let response = self
            .client
            .post(self.object_url(false, key))
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header(CONTENT_TYPE, content_type)
            // same key twice in one second: the newer upload replaces the older
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("storage upload request failed: {e}")))?;
        Self::expect_success(response, "upload").await
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        let mut url = self.api_base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("object").push(&self.bucket);
        }
        let response = self
            .client
            .delete(url)
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .json(&RemoveRequest { prefixes: [key] })
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("storage remove request failed: {e}")))?;
        Self::expect_success(response, "remove").await
    }

    fn public_url(&self, key: &str) -> String {
        self.object_url(true, key).to_string()
    }
}
