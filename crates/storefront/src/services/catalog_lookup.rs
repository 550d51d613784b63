//! Catalog lookup for cart items.
//!
//! Cart items carry a display name and, from newer clients, a stable product
//! reference. The reference is always tried first. Name matching is the
//! legacy path and can be switched off with `CATALOG_LEGACY_NAME_MATCHING`.

use rust_decimal::Decimal;
use tracing::{debug, info, instrument};

use cravely_core::{ProductId, ProductKind, round_money};

use crate::db::RepositoryError;
use crate::models::{CatalogEntry, NameMatch, NewCatalogEntry};
use crate::store::CatalogStore;

/// Share of the sale price recorded as cost on synthesized entries.
const SYNTHESIZED_COST_RATIO: Decimal = Decimal::from_parts(6, 0, 0, false, 1);

/// Outcome of resolving a cart item against the catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Matched by stable product reference.
    ById(CatalogEntry),
    /// Matched by name.
    ByName(CatalogEntry),
    /// No match, so a placeholder entry was created.
    Created(CatalogEntry),
    /// Could not be resolved; the caller skips the item.
    Unresolved,
}

impl Resolution {
    #[must_use]
    pub const fn entry(&self) -> Option<&CatalogEntry> {
        match self {
            Self::ById(entry) | Self::ByName(entry) | Self::Created(entry) => Some(entry),
            Self::Unresolved => None,
        }
    }
}

/// Resolves cart items to catalog entries, creating placeholders as needed.
pub struct CatalogLookup<'a> {
    catalog: &'a dyn CatalogStore,
    legacy_name_matching: bool,
}

impl<'a> CatalogLookup<'a> {
    #[must_use]
    pub const fn new(catalog: &'a dyn CatalogStore, legacy_name_matching: bool) -> Self {
        Self {
            catalog,
            legacy_name_matching,
        }
    }

    /// Resolve one cart item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the catalog store fails. A product that
    /// simply does not exist is `Resolution::Unresolved`, not an error.
    #[instrument(skip(self), fields(legacy = self.legacy_name_matching))]
    pub async fn resolve_cart_item(
        &self,
        name: &str,
        product_id: Option<ProductId>,
        unit_price: Decimal,
    ) -> Result<Resolution, RepositoryError> {
        if let Some(id) = product_id {
            if let Some(entry) = self.catalog.get_product(id).await? {
                return Ok(Resolution::ById(entry));
            }
            debug!(%id, "Product reference not found in catalog");
        }

        if !self.legacy_name_matching {
            return Ok(Resolution::Unresolved);
        }

        self.resolve_or_create_catalog_entry(name, unit_price).await
    }

    /// Find an entry by name, creating a minimal one when nothing matches.
    ///
    /// Exact (case-insensitive) matches win over substring matches. Blank
    /// names never match and never create anything.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the catalog store fails.
    pub async fn resolve_or_create_catalog_entry(
        &self,
        name: &str,
        unit_price: Decimal,
    ) -> Result<Resolution, RepositoryError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(Resolution::Unresolved);
        }

        for mode in [NameMatch::Exact, NameMatch::Contains] {
            if let Some(entry) = self.catalog.find_product_by_name(name, mode).await? {
                return Ok(Resolution::ByName(entry));
            }
        }

        let category_id = self.catalog.default_category().await?;
        let entry = self
            .catalog
            .create_product(NewCatalogEntry {
                standard_price: round_money(unit_price * SYNTHESIZED_COST_RATIO),
                category_id,
                ..NewCatalogEntry::minimal(name, unit_price)
            })
            .await?;

        info!(
            product_id = %entry.id,
            name = %entry.name,
            list_price = %entry.list_price,
            "Created catalog entry for unknown cart item"
        );
        Ok(Resolution::Created(entry))
    }

    /// Find or create the service entry used for delivery charge lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the catalog store fails.
    pub async fn resolve_delivery_entry(&self, name: &str) -> Result<CatalogEntry, RepositoryError> {
        if let Some(entry) = self
            .catalog
            .find_product_by_name(name, NameMatch::Exact)
            .await?
        {
            return Ok(entry);
        }

        let entry = self
            .catalog
            .create_product(NewCatalogEntry {
                kind: ProductKind::Service,
                ..NewCatalogEntry::minimal(name, Decimal::ZERO)
            })
            .await?;

        info!(product_id = %entry.id, name = %entry.name, "Created delivery charge entry");
        Ok(entry)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn published(name: &str, price: i64) -> NewCatalogEntry {
        NewCatalogEntry {
            is_published: true,
            website_published: true,
            ..NewCatalogEntry::minimal(name, Decimal::new(price, 0))
        }
    }

    #[tokio::test]
    async fn test_stable_id_wins_over_name() {
        let store = MemoryStore::new();
        let by_name = store.insert_product(published("Zinger Burger", 700));
        let by_id = store.insert_product(published("Zinger Burger Deluxe", 900));
        let lookup = CatalogLookup::new(&store, true);

        let resolution = lookup
            .resolve_cart_item("Zinger Burger", Some(by_id.id), Decimal::new(900, 0))
            .await
            .unwrap();
        assert_eq!(resolution, Resolution::ById(by_id));

        let fallback = lookup
            .resolve_cart_item("Zinger Burger", Some(ProductId::new(404)), Decimal::new(700, 0))
            .await
            .unwrap();
        assert_eq!(fallback, Resolution::ByName(by_name));
    }

    #[tokio::test]
    async fn test_exact_match_beats_substring() {
        let store = MemoryStore::new();
        store.insert_product(published("Large Fries Combo", 500));
        let fries = store.insert_product(published("Fries", 250));
        let lookup = CatalogLookup::new(&store, true);

        let resolution = lookup
            .resolve_or_create_catalog_entry("fries", Decimal::new(250, 0))
            .await
            .unwrap();
        assert_eq!(resolution.entry().unwrap().id, fries.id);
    }

    #[tokio::test]
    async fn test_unknown_item_is_synthesized() {
        let store = MemoryStore::new();
        store.insert_category("Drinks", 5, false);
        let mains = store.insert_category("Mains", 1, false);
        let lookup = CatalogLookup::new(&store, true);

        let resolution = lookup
            .resolve_or_create_catalog_entry("Mango Lassi", Decimal::new(33_333, 2))
            .await
            .unwrap();
        let Resolution::Created(entry) = resolution else {
            panic!("expected a synthesized entry");
        };
        assert_eq!(entry.list_price, Decimal::new(33_333, 2));
        assert_eq!(entry.standard_price, Decimal::new(20_000, 2));
        assert_eq!(entry.category_id, Some(mains.id));
        assert!(entry.sale_ok);
        assert!(!entry.purchase_ok);
        assert!(!entry.is_published);
        assert_eq!(entry.kind, ProductKind::Consumable);
    }

    #[tokio::test]
    async fn test_name_matching_disabled() {
        let store = MemoryStore::new();
        store.insert_product(published("Fries", 250));
        let lookup = CatalogLookup::new(&store, false);

        let resolution = lookup
            .resolve_cart_item("Fries", None, Decimal::new(250, 0))
            .await
            .unwrap();
        assert_eq!(resolution, Resolution::Unresolved);
        assert_eq!(store.products().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_name_creates_nothing() {
        let store = MemoryStore::new();
        let lookup = CatalogLookup::new(&store, true);

        let resolution = lookup
            .resolve_or_create_catalog_entry("   ", Decimal::ONE)
            .await
            .unwrap();
        assert_eq!(resolution, Resolution::Unresolved);
        assert!(store.products().is_empty());
    }

    #[tokio::test]
    async fn test_delivery_entry_is_created_once() {
        let store = MemoryStore::new();
        let lookup = CatalogLookup::new(&store, true);

        let first = lookup.resolve_delivery_entry("Delivery Charges").await.unwrap();
        let second = lookup.resolve_delivery_entry("delivery charges").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.kind, ProductKind::Service);
        assert_eq!(first.list_price, Decimal::ZERO);
        assert_eq!(store.products().len(), 1);
    }
}
