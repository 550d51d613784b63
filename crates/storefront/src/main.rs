//! Cravely Storefront - JSON backend for the ordering site.
//!
//! This binary serves the menu and checkout API on port 3000.
//!
//! # Architecture
//!
//! - Axum web framework, JSON only
//! - Store traits with two backends:
//!   - `PostgreSQL` when `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`) is set
//!   - In-memory otherwise, optionally seeded from `STOREFRONT_SEED_FILE`
//! - `moka` cache in front of menu listings
//! - Sentry for error tracking

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use cravely_storefront::config::StorefrontConfig;
use cravely_storefront::seed::CatalogSeed;
use cravely_storefront::state::AppState;
use cravely_storefront::store::{MemoryStore, Stores};
use cravely_storefront::{app, db};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Build the store bundle for the configured backend.
async fn build_stores(config: &StorefrontConfig) -> (Stores, Option<sqlx::PgPool>) {
    if let Some(database_url) = &config.database_url {
        let pool = db::create_pool(database_url)
            .await
            .expect("Failed to create database pool");
        tracing::info!("Database pool created");

        // NOTE: Migrations are NOT run automatically on startup.
        // Run them explicitly via: cargo run -p cravely-cli -- migrate
        return (db::postgres_stores(&pool), Some(pool));
    }

    let store = Arc::new(MemoryStore::new());
    if let Some(path) = &config.seed_file {
        let seed = CatalogSeed::from_path(path).expect("Failed to read seed file");
        seed.apply_to_memory(&store)
            .expect("Failed to apply seed file");
    }
    tracing::warn!("No database configured, using the in-memory store");
    (Stores::memory(store), None)
}

#[tokio::main]
async fn main() {
    // Load .env if present; real environment variables win
    let _ = dotenvy::dotenv();

    // Load configuration from environment (needed for Sentry init)
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Initialize tracing with EnvFilter and Sentry integration
    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cravely_storefront=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let (stores, pool) = build_stores(&config).await;
    let state = AppState::new(config.clone(), stores, pool);
    let router = app(state);

    // Start server
    let addr = config.socket_addr();
    tracing::info!("storefront listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
