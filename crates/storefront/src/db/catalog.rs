//! Catalog repository: categories, products and product images.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use cravely_core::{CategoryId, ProductId, ProductImageId, ProductKind};

use super::{RepositoryError, conflict_or_database};
use crate::models::{CatalogEntry, Category, NameMatch, NewCatalogEntry, ProductSearch};
use crate::store::CatalogStore;

const PRODUCT_COLUMNS: &str = r"
    p.id, p.name, p.description, p.description_sale, p.list_price, p.sale_price,
    p.standard_price, p.kind, p.sale_ok, p.purchase_ok, p.is_published,
    p.website_published, p.category_id, p.qty_available, p.has_image,
    COALESCE(
        (SELECT array_agg(i.id ORDER BY i.sequence, i.id)
         FROM storefront.product_image i WHERE i.product_id = p.id),
        '{}'
    ) AS extra_image_ids,
    p.created_at, p.updated_at
";

const VISIBLE: &str = "p.is_published AND p.sale_ok AND p.website_published";

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    name: String,
    sequence: i32,
    is_default: bool,
}

impl From<CategoryRow> for Category {
    fn from(r: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(r.id),
            name: r.name,
            sequence: r.sequence,
            is_default: r.is_default,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    description: Option<String>,
    description_sale: Option<String>,
    list_price: Decimal,
    sale_price: Option<Decimal>,
    standard_price: Decimal,
    kind: String,
    sale_ok: bool,
    purchase_ok: bool,
    is_published: bool,
    website_published: bool,
    category_id: Option<i32>,
    qty_available: Option<Decimal>,
    has_image: bool,
    extra_image_ids: Vec<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for CatalogEntry {
    type Error = RepositoryError;

    fn try_from(r: ProductRow) -> Result<Self, Self::Error> {
        let kind: ProductKind = r.kind.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid product kind in database: {e}"))
        })?;

        Ok(Self {
            id: ProductId::new(r.id),
            name: r.name,
            description: r.description,
            description_sale: r.description_sale,
            list_price: r.list_price,
            sale_price: r.sale_price,
            standard_price: r.standard_price,
            kind,
            sale_ok: r.sale_ok,
            purchase_ok: r.purchase_ok,
            is_published: r.is_published,
            website_published: r.website_published,
            category_id: r.category_id.map(CategoryId::new),
            qty_available: r.qty_available,
            has_image: r.has_image,
            extra_image_ids: r.extra_image_ids.into_iter().map(ProductImageId::new).collect(),
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

fn into_entries(rows: Vec<ProductRow>) -> Result<Vec<CatalogEntry>, RepositoryError> {
    rows.into_iter().map(CatalogEntry::try_from).collect()
}

/// Escape `LIKE` metacharacters so user input matches literally.
fn like_pattern(raw: &str) -> String {
    let escaped = raw
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Repository for catalog database operations.
#[derive(Debug, Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert or update a category by name. Used by catalog seeding.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_category(
        &self,
        name: &str,
        sequence: i32,
        is_default: bool,
    ) -> Result<Category, RepositoryError> {
        let existing: Option<(i32,)> =
            sqlx::query_as("SELECT id FROM storefront.category WHERE lower(name) = lower($1)")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;

        let row = match existing {
            Some((id,)) => {
                sqlx::query_as::<_, CategoryRow>(
                    r"
                    UPDATE storefront.category
                    SET sequence = $2, is_default = $3
                    WHERE id = $1
                    RETURNING id, name, sequence, is_default
                    ",
                )
                .bind(id)
                .bind(sequence)
                .bind(is_default)
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, CategoryRow>(
                    r"
                    INSERT INTO storefront.category (name, sequence, is_default)
                    VALUES ($1, $2, $3)
                    RETURNING id, name, sequence, is_default
                    ",
                )
                .bind(name)
                .bind(sequence)
                .bind(is_default)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| conflict_or_database(e, "category"))?
            }
        };

        Ok(row.into())
    }

    /// Attach a gallery image to a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn add_product_image(
        &self,
        product_id: ProductId,
        sequence: i32,
    ) -> Result<ProductImageId, RepositoryError> {
        let (id,): (i32,) = sqlx::query_as(
            r"
            INSERT INTO storefront.product_image (product_id, sequence)
            VALUES ($1, $2)
            RETURNING id
            ",
        )
        .bind(product_id)
        .bind(sequence)
        .fetch_one(&self.pool)
        .await?;

        Ok(ProductImageId::new(id))
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, name, sequence, is_default
            FROM storefront.category
            ORDER BY sequence, name
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn list_visible_products(&self) -> Result<Vec<CatalogEntry>, RepositoryError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product p WHERE {VISIBLE} ORDER BY lower(p.name), p.id"
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        into_entries(rows)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<CatalogEntry>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM storefront.product p WHERE p.id = $1");
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(CatalogEntry::try_from).transpose()
    }

    async fn find_product_by_name(
        &self,
        name: &str,
        mode: NameMatch,
    ) -> Result<Option<CatalogEntry>, RepositoryError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }

        let (predicate, param) = match mode {
            NameMatch::Exact => ("lower(p.name) = lower($1)", name.to_owned()),
            NameMatch::Contains => ("p.name ILIKE $1", like_pattern(name)),
        };
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product p WHERE {predicate} ORDER BY p.id LIMIT 1"
        );
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(param)
            .fetch_optional(&self.pool)
            .await?;

        row.map(CatalogEntry::try_from).transpose()
    }

    async fn search_products(
        &self,
        search: &ProductSearch,
    ) -> Result<Vec<CatalogEntry>, RepositoryError> {
        let pattern = search
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(like_pattern);
        let limit = i64::try_from(search.limit).unwrap_or(i64::MAX);

        let sql = format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM storefront.product p
            WHERE {VISIBLE}
              AND ($1::text IS NULL OR p.name ILIKE $1 OR p.description_sale ILIKE $1)
              AND ($2::int IS NULL OR p.category_id = $2)
            ORDER BY lower(p.name), p.id
            LIMIT $3
            "
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(pattern)
            .bind(search.category_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        into_entries(rows)
    }

    async fn create_product(
        &self,
        entry: NewCatalogEntry,
    ) -> Result<CatalogEntry, RepositoryError> {
        let (id,): (i32,) = sqlx::query_as(
            r"
            INSERT INTO storefront.product (
                name, description_sale, list_price, sale_price, standard_price, kind,
                sale_ok, purchase_ok, is_published, website_published, category_id,
                qty_available, has_image
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id
            ",
        )
        .bind(&entry.name)
        .bind(&entry.description_sale)
        .bind(entry.list_price)
        .bind(entry.sale_price)
        .bind(entry.standard_price)
        .bind(entry.kind.as_str())
        .bind(entry.sale_ok)
        .bind(entry.purchase_ok)
        .bind(entry.is_published)
        .bind(entry.website_published)
        .bind(entry.category_id)
        .bind(entry.qty_available)
        .bind(entry.has_image)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or_database(e, "product"))?;

        self.get_product(ProductId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn default_category(&self) -> Result<Option<CategoryId>, RepositoryError> {
        let row: Option<(i32,)> = sqlx::query_as(
            r"
            SELECT id FROM storefront.category
            ORDER BY is_default DESC, sequence, id
            LIMIT 1
            ",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id,)| CategoryId::new(id)))
    }
}
