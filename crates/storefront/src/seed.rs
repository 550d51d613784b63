//! Catalog seed files.
//!
//! A seed is a YAML document describing categories, products and the
//! country/state reference data:
//!
//! ```yaml
//! categories:
//!   - name: Rice Box
//!     sequence: 1
//!     default: true
//! products:
//!   - name: Chicken Tikka Rice Box
//!     category: Rice Box
//!     list_price: 650
//!     sale_price: 600
//!     description: Smoky tikka over buttered rice
//!     qty_available: 25
//!     has_image: true
//!     extra_images: 2
//! countries:
//!   - name: Pakistan
//!     code: PK
//!     states:
//!       - name: Punjab
//! ```
//!
//! Seeds can be loaded into the in-memory store at startup or into
//! `PostgreSQL` with `cravely-cli seed`.

use std::collections::HashMap;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{debug, info};

use cravely_core::{CategoryId, ProductKind};

use crate::db::{PgCatalogStore, PgCustomerDirectory, RepositoryError};
use crate::models::{NameMatch, NewCatalogEntry};
use crate::store::{CatalogStore, MemoryStore};

/// Errors that can occur while loading or applying a seed.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid seed file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("product {product:?} references unknown category {category:?}")]
    UnknownCategory { product: String, category: String },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// A parsed seed document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogSeed {
    #[serde(default)]
    pub categories: Vec<CategorySeed>,
    #[serde(default)]
    pub products: Vec<ProductSeed>,
    #[serde(default)]
    pub countries: Vec<CountrySeed>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategorySeed {
    pub name: String,
    #[serde(default = "default_sequence")]
    pub sequence: i32,
    #[serde(default)]
    pub default: bool,
}

const fn default_sequence() -> i32 {
    10
}

const fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductSeed {
    pub name: String,
    pub category: Option<String>,
    pub list_price: Decimal,
    pub sale_price: Option<Decimal>,
    pub description: Option<String>,
    #[serde(default)]
    pub kind: ProductKind,
    #[serde(default = "default_true")]
    pub published: bool,
    pub qty_available: Option<Decimal>,
    #[serde(default)]
    pub has_image: bool,
    #[serde(default)]
    pub extra_images: u8,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CountrySeed {
    pub name: String,
    pub code: Option<String>,
    #[serde(default)]
    pub states: Vec<StateSeed>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StateSeed {
    pub name: String,
    pub code: Option<String>,
}

/// Counts of what a seed run wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub products: usize,
    pub countries: usize,
    pub states: usize,
}

impl CatalogSeed {
    /// Parse a seed from YAML text.
    ///
    /// # Errors
    ///
    /// Returns `SeedError::Parse` if the document is malformed.
    pub fn from_yaml(yaml: &str) -> Result<Self, SeedError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read and parse a seed file.
    ///
    /// # Errors
    ///
    /// Returns `SeedError::Io` if the file cannot be read, or
    /// `SeedError::Parse` if it is malformed.
    pub fn from_path(path: &Path) -> Result<Self, SeedError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// Load the seed into an in-memory store.
    ///
    /// # Errors
    ///
    /// Returns `SeedError::UnknownCategory` if a product names a category the
    /// seed does not define.
    pub fn apply_to_memory(&self, store: &MemoryStore) -> Result<SeedSummary, SeedError> {
        let mut summary = SeedSummary::default();
        let mut categories = HashMap::new();
        for category in &self.categories {
            let created = store.insert_category(&category.name, category.sequence, category.default);
            categories.insert(category.name.to_lowercase(), created.id);
            summary.categories += 1;
        }

        for product in &self.products {
            let category_id = resolve_category(&categories, product)?;
            let created = store.insert_product(product.to_new_entry(category_id));
            for _ in 0..product.extra_images {
                store.insert_product_image(created.id);
            }
            summary.products += 1;
        }

        for country in &self.countries {
            let created = store.insert_country(&country.name, country.code.as_deref());
            summary.countries += 1;
            for state in &country.states {
                store.insert_state(created.id, &state.name, state.code.as_deref());
                summary.states += 1;
            }
        }

        info!(?summary, "Seeded in-memory store");
        Ok(summary)
    }

    /// Load the seed into `PostgreSQL`.
    ///
    /// Categories are upserted by name. Products whose name already exists
    /// are left untouched, so the seed can be re-applied safely.
    ///
    /// # Errors
    ///
    /// Returns `SeedError::Repository` if a query fails, or
    /// `SeedError::UnknownCategory` for a dangling category reference.
    pub async fn apply_to_postgres(&self, pool: &PgPool) -> Result<SeedSummary, SeedError> {
        let catalog = PgCatalogStore::new(pool.clone());
        let directory = PgCustomerDirectory::new(pool.clone());
        let mut summary = SeedSummary::default();

        let mut categories = HashMap::new();
        for category in &self.categories {
            let saved = catalog
                .upsert_category(&category.name, category.sequence, category.default)
                .await?;
            categories.insert(category.name.to_lowercase(), saved.id);
            summary.categories += 1;
        }

        for product in &self.products {
            let category_id = resolve_category(&categories, product)?;
            if catalog
                .find_product_by_name(&product.name, NameMatch::Exact)
                .await?
                .is_some()
            {
                debug!(name = %product.name, "Product already exists, skipping");
                continue;
            }
            let created = catalog
                .create_product(product.to_new_entry(category_id))
                .await?;
            for sequence in 0..product.extra_images {
                catalog
                    .add_product_image(created.id, i32::from(sequence))
                    .await?;
            }
            summary.products += 1;
        }

        for country in &self.countries {
            let saved = directory
                .ensure_country(&country.name, country.code.as_deref())
                .await?;
            summary.countries += 1;
            for state in &country.states {
                directory
                    .ensure_state(saved.id, &state.name, state.code.as_deref())
                    .await?;
                summary.states += 1;
            }
        }

        info!(?summary, "Seeded database");
        Ok(summary)
    }
}

impl ProductSeed {
    fn to_new_entry(&self, category_id: Option<CategoryId>) -> NewCatalogEntry {
        NewCatalogEntry {
            description_sale: self.description.clone(),
            sale_price: self.sale_price,
            kind: self.kind,
            is_published: self.published,
            website_published: self.published,
            category_id,
            qty_available: self.qty_available,
            has_image: self.has_image,
            ..NewCatalogEntry::minimal(self.name.clone(), self.list_price)
        }
    }
}

fn resolve_category(
    categories: &HashMap<String, CategoryId>,
    product: &ProductSeed,
) -> Result<Option<CategoryId>, SeedError> {
    let Some(name) = &product.category else {
        return Ok(None);
    };
    categories
        .get(&name.to_lowercase())
        .copied()
        .map(Some)
        .ok_or_else(|| SeedError::UnknownCategory {
            product: product.name.clone(),
            category: name.clone(),
        })
}
