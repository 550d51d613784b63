//! Read-only menu listings.
//!
//! Categories and visible products are cached with `moka` for the configured
//! TTL. Product cards are built from the cached snapshots on every request,
//! so slug and image URL rules always apply to the current data.

use std::collections::HashMap;
use std::sync::Arc;

use moka::future::Cache;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, instrument};

use cravely_core::text::SHORT_DESCRIPTION_LENGTH;
use cravely_core::{
    CategoryId, DEFAULT_DESCRIPTION, ProductId, round_money, slug_matches, slugify,
    truncate_description,
};

use crate::config::MenuConfig;
use crate::db::RepositoryError;
use crate::models::{CatalogEntry, Category, ProductSearch};
use crate::store::CatalogStore;

/// Shown when a product has no images at all.
pub const PLACEHOLDER_IMAGE: &str = "/static/images/product_placeholder.jpg";

/// Name of the pseudo-category for products without one.
pub const GENERAL_CATEGORY: &str = "General";

/// Stock figure reported for products that do not track stock.
const UNTRACKED_STOCK: Decimal = Decimal::from_parts(999, 0, 0, false, 0);

/// Default number of search results.
pub const DEFAULT_SEARCH_LIMIT: usize = 50;

// =============================================================================
// Views
// =============================================================================

/// Category reference embedded in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRef {
    pub id: i32,
    pub name: String,
    pub slug: String,
}

impl CategoryRef {
    fn general() -> Self {
        Self {
            id: 0,
            name: GENERAL_CATEGORY.to_owned(),
            slug: slugify(GENERAL_CATEGORY),
        }
    }

    fn from_category(category: &Category) -> Self {
        Self {
            id: category.id.as_i32(),
            name: category.name.clone(),
            slug: slugify(&category.name),
        }
    }
}

/// Category with the number of visible products in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub product_count: usize,
}

/// Category entry for the plain category list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryListing {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub sequence: i32,
}

/// Product card as consumed by the order-mode frontend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductView {
    /// `product-<n>`, echoed back by the cart.
    pub id: String,
    pub catalog_id: ProductId,
    pub name: String,
    pub description: String,
    pub short_description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub original_price: Decimal,
    /// Display symbol, e.g. `Rs.`.
    pub currency: String,
    pub currency_code: &'static str,
    pub image: String,
    pub image_urls: Vec<String>,
    pub category: String,
    pub category_id: i32,
    pub category_slug: String,
    pub in_stock: bool,
    #[serde(with = "rust_decimal::serde::float")]
    pub stock_quantity: Decimal,
    pub is_published: bool,
    pub website_url: String,
}

/// All visible products with per-category counts.
#[derive(Debug, Clone, Serialize)]
pub struct MenuListing {
    pub products: Vec<ProductView>,
    pub categories: Vec<CategorySummary>,
}

/// Products of a single category.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryProducts {
    pub category: CategoryRef,
    pub products: Vec<ProductView>,
}

// =============================================================================
// Cache
// =============================================================================

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
enum CacheKey {
    Categories,
    VisibleProducts,
}

#[derive(Debug, Clone)]
enum CacheValue {
    Categories(Arc<Vec<Category>>),
    Products(Arc<Vec<CatalogEntry>>),
}

// =============================================================================
// MenuService
// =============================================================================

/// Builds menu listings from the catalog store.
#[derive(Clone)]
pub struct MenuService {
    inner: Arc<MenuServiceInner>,
}

struct MenuServiceInner {
    catalog: Arc<dyn CatalogStore>,
    config: MenuConfig,
    base_url: String,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for MenuService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MenuService")
            .field("base_url", &self.inner.base_url)
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl MenuService {
    /// Create a menu service. `base_url` prefixes product image URLs.
    #[must_use]
    pub fn new(catalog: Arc<dyn CatalogStore>, config: MenuConfig, base_url: &str) -> Self {
        let cache = Cache::builder()
            .max_capacity(16)
            .time_to_live(config.cache_ttl)
            .build();

        Self {
            inner: Arc::new(MenuServiceInner {
                catalog,
                config,
                base_url: base_url.trim_end_matches('/').to_owned(),
                cache,
            }),
        }
    }

    /// Drop cached snapshots so the next request reads the store.
    pub fn invalidate(&self) {
        self.inner.cache.invalidate_all();
    }

    async fn categories(&self) -> Result<Arc<Vec<Category>>, RepositoryError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let categories = Arc::new(self.inner.catalog.list_categories().await?);
        self.inner
            .cache
            .insert(CacheKey::Categories, CacheValue::Categories(categories.clone()))
            .await;
        Ok(categories)
    }

    async fn visible_products(&self) -> Result<Arc<Vec<CatalogEntry>>, RepositoryError> {
        if let Some(CacheValue::Products(products)) =
            self.inner.cache.get(&CacheKey::VisibleProducts).await
        {
            debug!("Cache hit for visible products");
            return Ok(products);
        }

        let products = Arc::new(self.inner.catalog.list_visible_products().await?);
        self.inner
            .cache
            .insert(CacheKey::VisibleProducts, CacheValue::Products(products.clone()))
            .await;
        Ok(products)
    }

    /// Every category ordered by sequence, then name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the catalog store fails.
    pub async fn all_categories(&self) -> Result<Vec<CategoryListing>, RepositoryError> {
        Ok(self
            .categories()
            .await?
            .iter()
            .map(|c| CategoryListing {
                id: c.id.as_i32(),
                name: c.name.clone(),
                slug: slugify(&c.name),
                sequence: c.sequence,
            })
            .collect())
    }

    /// Categories that contain at least one visible product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the catalog store fails.
    #[instrument(skip(self))]
    pub async fn categories_with_products(&self) -> Result<Vec<CategorySummary>, RepositoryError> {
        let categories = self.categories().await?;
        let products = self.visible_products().await?;
        Ok(summarize(&categories, &products))
    }

    /// All visible products and their categories.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the catalog store fails.
    #[instrument(skip(self))]
    pub async fn all_products(&self) -> Result<MenuListing, RepositoryError> {
        let categories = self.categories().await?;
        let products = self.visible_products().await?;
        let by_id = index(&categories);

        Ok(MenuListing {
            products: products.iter().map(|p| self.product_view(p, &by_id)).collect(),
            categories: summarize(&categories, &products),
        })
    }

    /// Visible products of the category whose slug matches.
    ///
    /// Both the full slug (`fish-and-chips-section`) and the short form
    /// (`fish-and-chips`) are accepted. `general-section` lists products
    /// without a category unless a real category has that slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the catalog store fails.
    #[instrument(skip(self))]
    pub async fn products_in_category(
        &self,
        slug: &str,
    ) -> Result<Option<CategoryProducts>, RepositoryError> {
        let slug = slug.trim().to_lowercase();
        let categories = self.categories().await?;
        let products = self.visible_products().await?;
        let by_id = index(&categories);

        let (category, category_id) =
            match categories.iter().find(|c| slug_matches(&c.name, &slug)) {
                Some(category) => (CategoryRef::from_category(category), Some(category.id)),
                None if slug_matches(GENERAL_CATEGORY, &slug) => (CategoryRef::general(), None),
                None => return Ok(None),
            };

        let products = products
            .iter()
            .filter(|p| known_category(p, &by_id) == category_id)
            .map(|p| self.product_view(p, &by_id))
            .collect();

        Ok(Some(CategoryProducts { category, products }))
    }

    /// Search visible products by name or sale description.
    ///
    /// `category` is matched against category names by slug or substring.
    /// An unknown category is ignored rather than yielding no results.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the catalog store fails.
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        query: Option<&str>,
        category: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ProductView>, RepositoryError> {
        let categories = self.categories().await?;
        let category_id = category
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .and_then(|wanted| {
                let lowered = wanted.to_lowercase();
                let found = categories
                    .iter()
                    .find(|c| {
                        slug_matches(&c.name, &lowered) || c.name.to_lowercase().contains(&lowered)
                    })
                    .map(|c| c.id);
                if found.is_none() {
                    debug!(category = %wanted, "Search category not found, ignoring filter");
                }
                found
            });

        let search = ProductSearch {
            query: query.map(str::to_owned),
            category_id,
            limit: limit.max(1),
        };
        let by_id = index(&categories);
        Ok(self
            .inner
            .catalog
            .search_products(&search)
            .await?
            .iter()
            .map(|p| self.product_view(p, &by_id))
            .collect())
    }

    /// A single visible product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the catalog store fails.
    #[instrument(skip(self))]
    pub async fn single_product(
        &self,
        id: ProductId,
    ) -> Result<Option<ProductView>, RepositoryError> {
        let Some(entry) = self.inner.catalog.get_product(id).await? else {
            return Ok(None);
        };
        if !entry.is_visible() {
            return Ok(None);
        }
        let categories = self.categories().await?;
        Ok(Some(self.product_view(&entry, &index(&categories))))
    }

    fn product_view(
        &self,
        entry: &CatalogEntry,
        categories: &HashMap<CategoryId, &Category>,
    ) -> ProductView {
        let category = entry
            .category_id
            .and_then(|id| categories.get(&id))
            .map_or_else(CategoryRef::general, |c| CategoryRef::from_category(c));

        let raw_description = [entry.description_sale.as_deref(), entry.description.as_deref()]
            .into_iter()
            .flatten()
            .find(|d| !d.trim().is_empty());

        let (image, image_urls) = self.images(entry);

        ProductView {
            id: entry.id.reference(),
            catalog_id: entry.id,
            name: entry.name.clone(),
            description: raw_description.unwrap_or(DEFAULT_DESCRIPTION).to_owned(),
            short_description: truncate_description(raw_description, SHORT_DESCRIPTION_LENGTH),
            price: round_money(entry.effective_price()),
            original_price: round_money(entry.list_price),
            currency: self.inner.config.currency_symbol.clone(),
            currency_code: self.inner.config.currency.code(),
            image,
            image_urls,
            category: category.name,
            category_id: category.id,
            category_slug: category.slug,
            in_stock: entry.in_stock(),
            stock_quantity: entry.qty_available.unwrap_or(UNTRACKED_STOCK),
            is_published: entry.is_published,
            website_url: format!("/shop/product/{}", entry.id),
        }
    }

    /// Main image URL and the full gallery.
    fn images(&self, entry: &CatalogEntry) -> (String, Vec<String>) {
        let base = &self.inner.base_url;
        let main = entry
            .has_image
            .then(|| format!("{base}/web/image/product.template/{}/image_1920", entry.id));

        let mut all: Vec<String> = main.iter().cloned().collect();
        all.extend(
            entry
                .extra_image_ids
                .iter()
                .map(|image_id| format!("{base}/web/image/product.image/{image_id}/image_1920")),
        );

        if all.is_empty() {
            all.push(PLACEHOLDER_IMAGE.to_owned());
        }
        (main.unwrap_or_else(|| PLACEHOLDER_IMAGE.to_owned()), all)
    }
}

fn index(categories: &[Category]) -> HashMap<CategoryId, &Category> {
    categories.iter().map(|c| (c.id, c)).collect()
}

/// The product's category if it still exists. Products without one, or
/// pointing at a deleted category, belong to `General`.
fn known_category(
    entry: &CatalogEntry,
    categories: &HashMap<CategoryId, &Category>,
) -> Option<CategoryId> {
    entry.category_id.filter(|id| categories.contains_key(id))
}

/// Count visible products per category, keeping category order and putting
/// uncategorized products last under `General`.
fn summarize(categories: &[Category], products: &[CatalogEntry]) -> Vec<CategorySummary> {
    let by_id = index(categories);
    let mut counts: HashMap<Option<CategoryId>, usize> = HashMap::new();
    for product in products {
        *counts.entry(known_category(product, &by_id)).or_default() += 1;
    }

    let mut summaries: Vec<CategorySummary> = categories
        .iter()
        .filter_map(|c| {
            let count = counts.get(&Some(c.id)).copied().unwrap_or(0);
            (count > 0).then(|| CategorySummary {
                id: c.id.as_i32(),
                name: c.name.clone(),
                slug: slugify(&c.name),
                product_count: count,
            })
        })
        .collect();

    let general = counts.get(&None).copied().unwrap_or(0);
    if general > 0 {
        let general_ref = CategoryRef::general();
        summaries.push(CategorySummary {
            id: general_ref.id,
            name: general_ref.name,
            slug: general_ref.slug,
            product_count: general,
        });
    }
    summaries
}
