//! Catalog models: categories and the products sold under them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cravely_core::{CategoryId, ProductId, ProductImageId, ProductKind};

/// A menu category such as "Rice Box" or "Fish & Chips".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    /// Display order on the menu, lowest first.
    pub sequence: i32,
    /// Receives auto-created catalog entries.
    pub is_default: bool,
}

/// A sellable product record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: ProductId,
    pub name: String,
    /// Internal description.
    pub description: Option<String>,
    /// Customer-facing description; preferred on the menu.
    pub description_sale: Option<String>,
    pub list_price: Decimal,
    /// Promotional price. Only applied when lower than `list_price`.
    pub sale_price: Option<Decimal>,
    /// Cost estimate used for margin reporting.
    pub standard_price: Decimal,
    pub kind: ProductKind,
    /// Can be sold to customers.
    pub sale_ok: bool,
    /// Can be bought from suppliers.
    pub purchase_ok: bool,
    pub is_published: bool,
    pub website_published: bool,
    pub category_id: Option<CategoryId>,
    /// On-hand quantity, when stock is tracked at all.
    pub qty_available: Option<Decimal>,
    pub has_image: bool,
    pub extra_image_ids: Vec<ProductImageId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CatalogEntry {
    /// Visible on the public menu.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.is_published && self.sale_ok && self.website_published
    }

    /// Price the customer pays before any cart-level adjustments.
    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        match self.sale_price {
            Some(sale) if sale < self.list_price => sale,
            _ => self.list_price,
        }
    }

    /// Untracked stock counts as available.
    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.qty_available.is_none_or(|qty| qty > Decimal::ZERO)
    }
}

/// Fields for a catalog entry created outside the back office.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCatalogEntry {
    pub name: String,
    pub description_sale: Option<String>,
    pub list_price: Decimal,
    pub sale_price: Option<Decimal>,
    pub standard_price: Decimal,
    pub kind: ProductKind,
    pub sale_ok: bool,
    pub purchase_ok: bool,
    pub is_published: bool,
    pub website_published: bool,
    pub category_id: Option<CategoryId>,
    pub qty_available: Option<Decimal>,
    pub has_image: bool,
}

impl NewCatalogEntry {
    /// An unpublished, sellable entry with only a name and a price.
    #[must_use]
    pub fn minimal(name: impl Into<String>, list_price: Decimal) -> Self {
        Self {
            name: name.into(),
            description_sale: None,
            list_price,
            sale_price: None,
            standard_price: Decimal::ZERO,
            kind: ProductKind::Consumable,
            sale_ok: true,
            purchase_ok: false,
            is_published: false,
            website_published: false,
            category_id: None,
            qty_available: None,
            has_image: false,
        }
    }
}

/// How a product name lookup compares names. Both are case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameMatch {
    Exact,
    Contains,
}

/// Filter for menu search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductSearch {
    /// Matched against name and sale description.
    pub query: Option<String>,
    pub category_id: Option<CategoryId>,
    pub limit: usize,
}
