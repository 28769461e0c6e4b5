//! services/web/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use docurp_core::DEFAULT_MAX_UPLOAD_BYTES;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Which implementation sits behind the ports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    /// Hosted auth + storage over HTTP, metadata in Postgres.
    Supabase,
    /// Everything in process; data is lost on restart.
    Memory,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "supabase" => Ok(Backend::Supabase),
            "memory" => Ok(Backend::Memory),
            other => Err(format!("'{}' is not one of supabase, memory", other)),
        }
    }
}

/// Credentials and endpoints of the hosted backend.
#[derive(Clone, Debug)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    /// Used for storage and admin calls. Falls back to the anon key.
    pub service_key: String,
    pub database_url: String,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub backend: Backend,
    pub supabase: Option<SupabaseConfig>,
    pub storage_bucket: String,
    pub email_domain: String,
    pub max_upload_bytes: usize,
    pub upstream_timeout: Duration,
    /// Public origin used to build the password-reset link. Derived from `Host` when unset.
    pub public_base_url: Option<String>,
    pub secure_cookies: bool,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server Settings ---
        let bind_address = parse_var("BIND_ADDRESS", "0.0.0.0:3000")?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Backend Settings ---
        let backend: Backend = parse_var("BACKEND", "supabase")?;
        let supabase = match backend {
            Backend::Supabase => {
                let url = required_var("SUPABASE_URL")?;
                let anon_key = required_var("SUPABASE_ANON_KEY")?;
                let service_key = std::env::var("SUPABASE_SERVICE_KEY").unwrap_or_else(|_| anon_key.clone());
                let database_url = required_var("DATABASE_URL")?;
                Some(SupabaseConfig {
                    url: url.trim_end_matches('/').to_string(),
                    anon_key,
                    service_key,
                    database_url,
                })
            }
            Backend::Memory => None,
        };

        let storage_bucket = std::env::var("STORAGE_BUCKET").unwrap_or_else(|_| "documents".to_string());
        let email_domain = std::env::var("EMAIL_DOMAIN").unwrap_or_else(|_| "urp.edu.pe".to_string());

        // --- Load Limits ---
        let max_upload_bytes = parse_var("MAX_UPLOAD_BYTES", &DEFAULT_MAX_UPLOAD_BYTES.to_string())?;
        let timeout_secs: u64 = parse_var("UPSTREAM_TIMEOUT_SECS", "15")?;

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .ok()
            .map(|u| u.trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty());
        let secure_cookies = parse_var("SECURE_COOKIES", "true")?;

        Ok(Self {
            bind_address,
            log_level,
            backend,
            supabase,
            storage_bucket,
            email_domain,
            max_upload_bytes,
            upstream_timeout: Duration::from_secs(timeout_secs),
            public_base_url,
            secure_cookies,
        })
    }

    /// Settings for running against the in-memory backend, used by tests.
    pub fn for_memory(bind_address: SocketAddr) -> Self {
        Self {
            bind_address,
            log_level: Level::INFO,
            backend: Backend::Memory,
            supabase: None,
            storage_bucket: "documents".to_string(),
            email_domain: "urp.edu.pe".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            upstream_timeout: Duration::from_secs(15),
            public_base_url: None,
            secure_cookies: false,
        }
    }
}

fn required_var(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingVar(key.to_string()))
}

fn parse_var<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string()))
}
