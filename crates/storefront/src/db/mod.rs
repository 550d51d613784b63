//! `PostgreSQL` implementations of the store traits.
//!
//! # Schema: `storefront`
//!
//! ## Tables
//!
//! - `category` - Menu categories
//! - `product` / `product_image` - Catalog entries and their gallery images
//! - `country` / `country_state` - Address reference data
//! - `customer` - Customer identities, keyed by email
//! - `sales_order` / `sales_order_line` - Placed orders
//!
//! Order names come from the `sales_order_name_seq` sequence.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p cravely-cli -- migrate
//! ```

pub mod catalog;
pub mod customers;
pub mod orders;

use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use catalog::PgCatalogStore;
pub use customers::PgCustomerDirectory;
pub use orders::PgOrderStore;

use crate::store::Stores;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate order name).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// An amount could not be computed without overflowing.
    #[error("amount out of range: {0}")]
    AmountOutOfRange(&'static str),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Build the store bundle backed by one pool.
#[must_use]
pub fn postgres_stores(pool: &PgPool) -> Stores {
    Stores {
        catalog: Arc::new(PgCatalogStore::new(pool.clone())),
        customers: Arc::new(PgCustomerDirectory::new(pool.clone())),
        orders: Arc::new(PgOrderStore::new(pool.clone())),
    }
}

/// Map a unique violation to `Conflict`, everything else to `Database`.
fn conflict_or_database(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}
