//! services/web/src/bin/docurp.rs

use docurp_core::memory::MemoryBackend;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use web_lib::{
    adapters::{DbAdapter, SupabaseAuthAdapter, SupabaseStorageAdapter},
    config::{Backend, Config},
    error::ApiError,
    web::{router, state::AppState},
};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Build the Shared AppState for the selected backend ---
    let app_state = match config.backend {
        Backend::Supabase => {
            let supabase = config
                .supabase
                .clone()
                .ok_or_else(|| ApiError::Internal("Supabase settings are missing".to_string()))?;

            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .acquire_timeout(config.upstream_timeout)
                .connect(&supabase.database_url)
                .await?;
            let db_adapter = Arc::new(DbAdapter::new(db_pool));
            info!("Running database migrations...");
            db_adapter.run_migrations().await?;
            info!("Database migrations complete.");

            let http = reqwest::Client::builder()
                .timeout(config.upstream_timeout)
                .build()?;
            let auth_adapter = Arc::new(SupabaseAuthAdapter::new(
                http.clone(),
                &supabase.url,
                supabase.anon_key.clone(),
            ));
            let storage_adapter = Arc::new(SupabaseStorageAdapter::new(
                http,
                &supabase.url,
                config.storage_bucket.clone(),
                supabase.service_key.clone(),
            )?);

            AppState::new(config.clone(), auth_adapter, storage_adapter, db_adapter)
        }
        Backend::Memory => {
            warn!("Using the in-memory backend; all data is lost on restart");
            let base = config
                .public_base_url
                .clone()
                .unwrap_or_else(|| format!("http://localhost:{}", config.bind_address.port()));
            // accounts are usable right away, there is no inbox to confirm from
            let backend = MemoryBackend::new(format!("{base}/objects"), false);
            AppState::in_memory(config.clone(), &backend)
        }
    };

    // --- 3. Create the Web Router ---
    let app = router(Arc::new(app_state));

    // --- 4. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
