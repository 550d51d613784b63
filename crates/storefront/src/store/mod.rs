//! Persistence seams for the catalog, customer directory and order store.
//!
//! Services depend on these traits only. The server wires either the
//! `PostgreSQL` repositories from [`crate::db`] or the [`MemoryStore`].

pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;

use cravely_core::{CategoryId, CountryId, CustomerId, Email, OrderId, ProductId};

use crate::db::RepositoryError;
use crate::models::{
    CatalogEntry, Category, ContactUpdate, Country, CountryState, Customer, NameMatch,
    NewCatalogEntry, NewCustomer, NewOrder, NewOrderLine, OrderLine, OrderTotals, ProductSearch,
    SalesOrder,
};

pub use memory::MemoryStore;

/// Product catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// All categories ordered by sequence, then name.
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError>;

    /// Published, sellable, website-visible entries ordered by name.
    async fn list_visible_products(&self) -> Result<Vec<CatalogEntry>, RepositoryError>;

    async fn get_product(&self, id: ProductId) -> Result<Option<CatalogEntry>, RepositoryError>;

    /// Case-insensitive name lookup. The lowest id wins when several match.
    async fn find_product_by_name(
        &self,
        name: &str,
        mode: NameMatch,
    ) -> Result<Option<CatalogEntry>, RepositoryError>;

    /// Visible entries matching a search, ordered by name.
    async fn search_products(
        &self,
        search: &ProductSearch,
    ) -> Result<Vec<CatalogEntry>, RepositoryError>;

    async fn create_product(&self, entry: NewCatalogEntry)
    -> Result<CatalogEntry, RepositoryError>;

    /// The category flagged as default, else the first by sequence.
    async fn default_category(&self) -> Result<Option<CategoryId>, RepositoryError>;
}

/// Customer identities and the country/state reference tables.
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    /// First customer with exactly this email.
    async fn find_by_email(&self, email: &Email) -> Result<Option<Customer>, RepositoryError>;

    async fn create(&self, customer: NewCustomer) -> Result<Customer, RepositoryError>;

    async fn update_contact(
        &self,
        id: CustomerId,
        update: ContactUpdate,
    ) -> Result<Customer, RepositoryError>;

    /// Case-insensitive country lookup by name.
    async fn find_country(&self, name: &str) -> Result<Option<Country>, RepositoryError>;

    /// Case-insensitive state lookup, optionally scoped to a country.
    async fn find_state(
        &self,
        country_id: Option<CountryId>,
        name: &str,
    ) -> Result<Option<CountryState>, RepositoryError>;
}

/// Sales orders and their lines.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Create an order, consuming the next name from the order sequence.
    async fn create_order(&self, order: NewOrder) -> Result<SalesOrder, RepositoryError>;

    async fn add_line(
        &self,
        order_id: OrderId,
        line: NewOrderLine,
    ) -> Result<OrderLine, RepositoryError>;

    /// Recompute and store the order amounts from its lines.
    async fn recompute_totals(&self, order_id: OrderId) -> Result<OrderTotals, RepositoryError>;

    /// The name the next order would get, without consuming it.
    async fn next_order_name(&self) -> Result<String, RepositoryError>;

    async fn get_order(&self, order_id: OrderId) -> Result<Option<SalesOrder>, RepositoryError>;

    async fn order_lines(&self, order_id: OrderId) -> Result<Vec<OrderLine>, RepositoryError>;
}

/// The three stores the checkout pipeline and listings talk to.
#[derive(Clone)]
pub struct Stores {
    pub catalog: Arc<dyn CatalogStore>,
    pub customers: Arc<dyn CustomerDirectory>,
    pub orders: Arc<dyn OrderStore>,
}

impl Stores {
    /// Back every store with one shared in-memory store.
    #[must_use]
    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            catalog: store.clone(),
            customers: store.clone(),
            orders: store,
        }
    }
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}

