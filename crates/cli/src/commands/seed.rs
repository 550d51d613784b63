//! Seed the storefront database from a YAML catalog file.
//!
//! Categories are upserted by name, products are inserted only when no
//! entry with the same name exists, and countries/states are created on
//! first sight. Running the same file twice is harmless.

use std::path::Path;

use cravely_storefront::db;
use cravely_storefront::seed::CatalogSeed;
use tracing::info;

use super::{CommandError, storefront_database_url};

/// Seed catalog data from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, the connection
/// string is missing, or a database write fails.
pub async fn catalog(file_path: &Path) -> Result<(), CommandError> {
    // Parse before connecting so a bad file fails fast
    info!(path = %file_path.display(), "Loading catalog seed");
    let seed = CatalogSeed::from_path(file_path)?;
    info!(
        categories = seed.categories.len(),
        products = seed.products.len(),
        countries = seed.countries.len(),
        "Parsed seed file"
    );

    let database_url = storefront_database_url()?;
    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let summary = seed.apply_to_postgres(&pool).await?;

    info!("Seeding complete!");
    info!("  Categories upserted: {}", summary.categories);
    info!("  Products inserted: {}", summary.products);
    info!("  Countries: {}", summary.countries);
    info!("  States: {}", summary.states);
    Ok(())
}
