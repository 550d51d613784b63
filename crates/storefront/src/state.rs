//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::services::MenuService;
use crate::store::Stores;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// stores, the menu service and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    stores: Stores,
    menu: MenuService,
    pool: Option<PgPool>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `stores` - Catalog, customer and order stores
    /// * `pool` - `PostgreSQL` pool backing `stores`, if any; used by the
    ///   readiness check
    #[must_use]
    pub fn new(config: StorefrontConfig, stores: Stores, pool: Option<PgPool>) -> Self {
        let menu = MenuService::new(stores.catalog.clone(), config.menu.clone(), &config.base_url);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                stores,
                menu,
                pool,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the store bundle.
    #[must_use]
    pub fn stores(&self) -> &Stores {
        &self.inner.stores
    }

    /// Get a reference to the menu service.
    #[must_use]
    pub fn menu(&self) -> &MenuService {
        &self.inner.menu
    }

    /// Get the database pool, if the server runs against `PostgreSQL`.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }
}
