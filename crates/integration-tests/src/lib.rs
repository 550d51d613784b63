//! Integration tests for the Cravely storefront.
//!
//! Each test boots the real router on an ephemeral port, backed by an
//! in-memory store seeded from `seed/catalog.yaml`, and talks to it over
//! HTTP with `reqwest`. No database is needed.
//!
//! ```bash
//! cargo test -p cravely-integration-tests
//! ```

use std::sync::Arc;

use cravely_storefront::config::StorefrontConfig;
use cravely_storefront::seed::CatalogSeed;
use cravely_storefront::state::AppState;
use cravely_storefront::store::{MemoryStore, Stores};
use reqwest::Client;

/// The demo catalog shipped with the repository.
pub const DEMO_CATALOG: &str = include_str!("../../../seed/catalog.yaml");

/// A storefront running in the background for the duration of a test.
pub struct TestServer {
    pub base_url: String,
    pub client: Client,
    pub store: Arc<MemoryStore>,
}

impl TestServer {
    /// Boot a storefront over the demo catalog.
    ///
    /// # Panics
    ///
    /// Panics if the seed is invalid or the listener cannot be bound.
    #[allow(clippy::unwrap_used)]
    pub async fn spawn() -> Self {
        let store = Arc::new(MemoryStore::new());
        CatalogSeed::from_yaml(DEMO_CATALOG)
            .unwrap()
            .apply_to_memory(&store)
            .unwrap();
        Self::spawn_with(store).await
    }

    /// Boot a storefront over an existing store.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    #[allow(clippy::unwrap_used)]
    pub async fn spawn_with(store: Arc<MemoryStore>) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let config = StorefrontConfig::local(&base_url);
        let state = AppState::new(config, Stores::memory(Arc::clone(&store)), None);
        let router = cravely_storefront::app(state);

        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let client = Client::builder().cookie_store(true).build().unwrap();

        Self {
            base_url,
            client,
            store,
        }
    }

    /// Absolute URL for a path on this server.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}
