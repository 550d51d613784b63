//! In-memory store backend.
//!
//! Used by the test suites and by the server when no database URL is
//! configured. All three store traits share one lock-protected state so
//! cross-table invariants (lines belong to an existing order) hold the same
//! way they do in `PostgreSQL`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use rust_decimal::Decimal;

use cravely_core::{
    CategoryId, CountryId, CountryStateId, CustomerId, Email, OrderId, OrderLineId, ProductId,
    ProductImageId,
};

use super::{CatalogStore, CustomerDirectory, OrderStore};
use crate::db::RepositoryError;
use crate::models::order::{line_subtotal, order_name};
use crate::models::{
    CatalogEntry, Category, ContactUpdate, Country, CountryState, Customer, NameMatch,
    NewCatalogEntry, NewCustomer, NewOrder, NewOrderLine, OrderLine, OrderTotals, ProductSearch,
    SalesOrder,
};

#[derive(Debug, Default)]
struct Counters {
    category: i32,
    product: i32,
    product_image: i32,
    country: i32,
    state: i32,
    customer: i32,
    order: i32,
    order_line: i32,
    order_name: i64,
}

fn bump(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

#[derive(Debug, Default)]
struct Tables {
    categories: BTreeMap<CategoryId, Category>,
    products: BTreeMap<ProductId, CatalogEntry>,
    countries: BTreeMap<CountryId, Country>,
    states: BTreeMap<CountryStateId, CountryState>,
    customers: BTreeMap<CustomerId, Customer>,
    orders: BTreeMap<OrderId, SalesOrder>,
    lines: BTreeMap<OrderLineId, OrderLine>,
    counters: Counters,
}

/// Thread-safe in-memory implementation of every store trait.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a category.
    pub fn insert_category(&self, name: &str, sequence: i32, is_default: bool) -> Category {
        let mut tables = self.tables.write();
        let category = Category {
            id: CategoryId::new(bump(&mut tables.counters.category)),
            name: name.to_owned(),
            sequence,
            is_default,
        };
        tables.categories.insert(category.id, category.clone());
        category
    }

    /// Add a catalog entry.
    pub fn insert_product(&self, entry: NewCatalogEntry) -> CatalogEntry {
        let mut tables = self.tables.write();
        let now = Utc::now();
        let product = CatalogEntry {
            id: ProductId::new(bump(&mut tables.counters.product)),
            name: entry.name,
            description: None,
            description_sale: entry.description_sale,
            list_price: entry.list_price,
            sale_price: entry.sale_price,
            standard_price: entry.standard_price,
            kind: entry.kind,
            sale_ok: entry.sale_ok,
            purchase_ok: entry.purchase_ok,
            is_published: entry.is_published,
            website_published: entry.website_published,
            category_id: entry.category_id,
            qty_available: entry.qty_available,
            has_image: entry.has_image,
            extra_image_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        tables.products.insert(product.id, product.clone());
        product
    }

    /// Attach an extra gallery image to a product. Returns `None` if the
    /// product does not exist.
    pub fn insert_product_image(&self, product_id: ProductId) -> Option<ProductImageId> {
        let mut tables = self.tables.write();
        let image_id = ProductImageId::new(bump(&mut tables.counters.product_image));
        let product = tables.products.get_mut(&product_id)?;
        product.extra_image_ids.push(image_id);
        Some(image_id)
    }

    pub fn insert_country(&self, name: &str, code: Option<&str>) -> Country {
        let mut tables = self.tables.write();
        let country = Country {
            id: CountryId::new(bump(&mut tables.counters.country)),
            name: name.to_owned(),
            code: code.map(str::to_owned),
        };
        tables.countries.insert(country.id, country.clone());
        country
    }

    pub fn insert_state(&self, country_id: CountryId, name: &str, code: Option<&str>) -> CountryState {
        let mut tables = self.tables.write();
        let state = CountryState {
            id: CountryStateId::new(bump(&mut tables.counters.state)),
            country_id,
            name: name.to_owned(),
            code: code.map(str::to_owned),
        };
        tables.states.insert(state.id, state.clone());
        state
    }

    /// Snapshot of every catalog entry, including unpublished ones.
    #[must_use]
    pub fn products(&self) -> Vec<CatalogEntry> {
        self.tables.read().products.values().cloned().collect()
    }

    #[must_use]
    pub fn customers(&self) -> Vec<Customer> {
        self.tables.read().customers.values().cloned().collect()
    }

    #[must_use]
    pub fn orders(&self) -> Vec<SalesOrder> {
        self.tables.read().orders.values().cloned().collect()
    }

    /// Number of order lines across all orders.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.tables.read().lines.len()
    }
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let mut categories: Vec<Category> =
            self.tables.read().categories.values().cloned().collect();
        categories.sort_by(|a, b| a.sequence.cmp(&b.sequence).then_with(|| a.name.cmp(&b.name)));
        Ok(categories)
    }

    async fn list_visible_products(&self) -> Result<Vec<CatalogEntry>, RepositoryError> {
        let mut products: Vec<CatalogEntry> = self
            .tables
            .read()
            .products
            .values()
            .filter(|p| p.is_visible())
            .cloned()
            .collect();
        products.sort_by_key(|p| (p.name.to_lowercase(), p.id));
        Ok(products)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<CatalogEntry>, RepositoryError> {
        Ok(self.tables.read().products.get(&id).cloned())
    }

    async fn find_product_by_name(
        &self,
        name: &str,
        mode: NameMatch,
    ) -> Result<Option<CatalogEntry>, RepositoryError> {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(None);
        }
        let tables = self.tables.read();
        // BTreeMap iteration is ordered by id, so the first hit is the lowest id.
        let found = tables.products.values().find(|p| match mode {
            NameMatch::Exact => p.name.to_lowercase() == needle,
            NameMatch::Contains => contains_ci(&p.name, &needle),
        });
        Ok(found.cloned())
    }

    async fn search_products(
        &self,
        search: &ProductSearch,
    ) -> Result<Vec<CatalogEntry>, RepositoryError> {
        let needle = search
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);

        let mut products: Vec<CatalogEntry> = self
            .tables
            .read()
            .products
            .values()
            .filter(|p| p.is_visible())
            .filter(|p| search.category_id.is_none_or(|c| p.category_id == Some(c)))
            .filter(|p| {
                needle.as_deref().is_none_or(|q| {
                    contains_ci(&p.name, q)
                        || p.description_sale.as_deref().is_some_and(|d| contains_ci(d, q))
                })
            })
            .cloned()
            .collect();
        products.sort_by_key(|p| (p.name.to_lowercase(), p.id));
        products.truncate(search.limit);
        Ok(products)
    }

    async fn create_product(
        &self,
        entry: NewCatalogEntry,
    ) -> Result<CatalogEntry, RepositoryError> {
        Ok(self.insert_product(entry))
    }

    async fn default_category(&self) -> Result<Option<CategoryId>, RepositoryError> {
        let tables = self.tables.read();
        if let Some(category) = tables.categories.values().find(|c| c.is_default) {
            return Ok(Some(category.id));
        }
        Ok(tables
            .categories
            .values()
            .min_by_key(|c| (c.sequence, c.id))
            .map(|c| c.id))
    }
}

#[async_trait]
impl CustomerDirectory for MemoryStore {
    async fn find_by_email(&self, email: &Email) -> Result<Option<Customer>, RepositoryError> {
        Ok(self
            .tables
            .read()
            .customers
            .values()
            .find(|c| c.email == *email)
            .cloned())
    }

    async fn create(&self, customer: NewCustomer) -> Result<Customer, RepositoryError> {
        let mut tables = self.tables.write();
        let now = Utc::now();
        let record = Customer {
            id: CustomerId::new(bump(&mut tables.counters.customer)),
            name: customer.name,
            email: customer.email,
            phone: customer.phone,
            street: customer.street,
            city: customer.city,
            zip: customer.zip,
            country_id: customer.country_id,
            state_id: customer.state_id,
            customer_rank: customer.customer_rank,
            created_at: now,
            updated_at: now,
        };
        tables.customers.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_contact(
        &self,
        id: CustomerId,
        update: ContactUpdate,
    ) -> Result<Customer, RepositoryError> {
        let mut tables = self.tables.write();
        let customer = tables
            .customers
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        customer.name = update.name;
        customer.phone = update.phone;
        customer.street = update.street;
        customer.zip = update.zip;
        if update.city.is_some() {
            customer.city = update.city;
        }
        customer.updated_at = Utc::now();
        Ok(customer.clone())
    }

    async fn find_country(&self, name: &str) -> Result<Option<Country>, RepositoryError> {
        let needle = name.trim().to_lowercase();
        Ok(self
            .tables
            .read()
            .countries
            .values()
            .find(|c| c.name.to_lowercase() == needle)
            .cloned())
    }

    async fn find_state(
        &self,
        country_id: Option<CountryId>,
        name: &str,
    ) -> Result<Option<CountryState>, RepositoryError> {
        let needle = name.trim().to_lowercase();
        Ok(self
            .tables
            .read()
            .states
            .values()
            .filter(|s| country_id.is_none_or(|c| s.country_id == c))
            .find(|s| s.name.to_lowercase() == needle)
            .cloned())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn create_order(&self, order: NewOrder) -> Result<SalesOrder, RepositoryError> {
        let mut tables = self.tables.write();
        if !tables.customers.contains_key(&order.customer_id) {
            return Err(RepositoryError::NotFound);
        }
        tables.counters.order_name += 1;
        let record = SalesOrder {
            id: OrderId::new(bump(&mut tables.counters.order)),
            name: order_name(tables.counters.order_name),
            customer_id: order.customer_id,
            status: order.status,
            note: order.note,
            totals: OrderTotals::default(),
            created_at: Utc::now(),
        };
        tables.orders.insert(record.id, record.clone());
        Ok(record)
    }

    async fn add_line(
        &self,
        order_id: OrderId,
        line: NewOrderLine,
    ) -> Result<OrderLine, RepositoryError> {
        let price_subtotal = line_subtotal(line.quantity, line.price_unit)
            .ok_or(RepositoryError::AmountOutOfRange("line subtotal"))?;
        let mut tables = self.tables.write();
        if !tables.orders.contains_key(&order_id) {
            return Err(RepositoryError::NotFound);
        }
        let record = OrderLine {
            id: OrderLineId::new(bump(&mut tables.counters.order_line)),
            order_id,
            product_id: line.product_id,
            description: line.description,
            price_subtotal,
            quantity: line.quantity,
            price_unit: line.price_unit,
            is_delivery: line.is_delivery,
        };
        tables.lines.insert(record.id, record.clone());
        Ok(record)
    }

    async fn recompute_totals(&self, order_id: OrderId) -> Result<OrderTotals, RepositoryError> {
        let mut tables = self.tables.write();
        let lines: Vec<OrderLine> = tables
            .lines
            .values()
            .filter(|l| l.order_id == order_id)
            .cloned()
            .collect();
        let order = tables
            .orders
            .get_mut(&order_id)
            .ok_or(RepositoryError::NotFound)?;
        order.totals = OrderTotals::from_lines(&lines)
            .ok_or(RepositoryError::AmountOutOfRange("order total"))?;
        Ok(order.totals)
    }

    async fn next_order_name(&self) -> Result<String, RepositoryError> {
        Ok(order_name(self.tables.read().counters.order_name + 1))
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<SalesOrder>, RepositoryError> {
        Ok(self.tables.read().orders.get(&order_id).cloned())
    }

    async fn order_lines(&self, order_id: OrderId) -> Result<Vec<OrderLine>, RepositoryError> {
        Ok(self
            .tables
            .read()
            .lines
            .values()
            .filter(|l| l.order_id == order_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use cravely_core::OrderStatus;

    fn published(name: &str, price: i64, category_id: Option<CategoryId>) -> NewCatalogEntry {
        NewCatalogEntry {
            is_published: true,
            website_published: true,
            category_id,
            ..NewCatalogEntry::minimal(name, Decimal::new(price, 0))
        }
    }

    #[tokio::test]
    async fn test_name_lookup_prefers_lowest_id() {
        let store = MemoryStore::new();
        let first = store.insert_product(published("Chicken Tikka", 900, None));
        store.insert_product(published("chicken tikka", 950, None));

        let found = store
            .find_product_by_name("CHICKEN TIKKA", NameMatch::Exact)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, first.id);

        let partial = store
            .find_product_by_name("tikka", NameMatch::Contains)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(partial.id, first.id);

        assert!(
            store
                .find_product_by_name("tikka", NameMatch::Exact)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_visible_products_filter() {
        let store = MemoryStore::new();
        store.insert_product(published("Visible", 100, None));
        store.insert_product(NewCatalogEntry::minimal("Hidden", Decimal::new(100, 0)));
        store.insert_product(NewCatalogEntry {
            sale_ok: false,
            ..published("Not For Sale", 100, None)
        });

        let visible = store.list_visible_products().await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "Visible");
    }

    #[tokio::test]
    async fn test_search_by_description_and_category() {
        let store = MemoryStore::new();
        let rice = store.insert_category("Rice Box", 1, false);
        let burgers = store.insert_category("Burgers", 2, false);
        store.insert_product(NewCatalogEntry {
            description_sale: Some("Spicy chicken over rice".to_owned()),
            ..published("Rice Box Classic", 650, Some(rice.id))
        });
        store.insert_product(published("Zinger Burger", 700, Some(burgers.id)));
        store.insert_product(published("Chicken Burger", 600, Some(burgers.id)));

        let search = ProductSearch {
            query: Some("chicken".to_owned()),
            category_id: None,
            limit: 50,
        };
        let names: Vec<String> = store
            .search_products(&search)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Chicken Burger", "Rice Box Classic"]);

        let scoped = ProductSearch {
            category_id: Some(burgers.id),
            ..search
        };
        assert_eq!(store.search_products(&scoped).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_default_category_falls_back_to_first_by_sequence() {
        let store = MemoryStore::new();
        assert!(store.default_category().await.unwrap().is_none());

        store.insert_category("Drinks", 5, false);
        let mains = store.insert_category("Mains", 1, false);
        assert_eq!(store.default_category().await.unwrap(), Some(mains.id));

        let flagged = store.insert_category("Misc", 9, true);
        assert_eq!(store.default_category().await.unwrap(), Some(flagged.id));
    }

    #[tokio::test]
    async fn test_order_names_and_totals() {
        let store = MemoryStore::new();
        let customer = store
            .create(NewCustomer {
                name: "Ayesha".to_owned(),
                email: Email::parse("ayesha@example.com").unwrap(),
                phone: "0300".to_owned(),
                street: "1 Mall Road".to_owned(),
                city: None,
                zip: None,
                country_id: None,
                state_id: None,
                customer_rank: 1,
            })
            .await
            .unwrap();
        let product = store.insert_product(published("Biryani", 500, None));

        assert_eq!(store.next_order_name().await.unwrap(), "S00001");
        let order = store
            .create_order(NewOrder {
                customer_id: customer.id,
                status: OrderStatus::Draft,
                note: String::new(),
            })
            .await
            .unwrap();
        assert_eq!(order.name, "S00001");
        assert_eq!(store.next_order_name().await.unwrap(), "S00002");

        store
            .add_line(
                order.id,
                NewOrderLine {
                    product_id: product.id,
                    description: product.name.clone(),
                    quantity: Decimal::new(3, 0),
                    price_unit: Decimal::new(33_333, 2),
                    is_delivery: false,
                },
            )
            .await
            .unwrap();
        let totals = store.recompute_totals(order.id).await.unwrap();
        assert_eq!(totals.amount_total, Decimal::new(99_999, 2));
        assert_eq!(
            store.get_order(order.id).await.unwrap().unwrap().totals,
            totals
        );
    }

    #[tokio::test]
    async fn test_line_requires_existing_order() {
        let store = MemoryStore::new();
        let err = store
            .add_line(
                OrderId::new(99),
                NewOrderLine {
                    product_id: ProductId::new(1),
                    description: "x".to_owned(),
                    quantity: Decimal::ONE,
                    price_unit: Decimal::ONE,
                    is_delivery: false,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_overflowing_line_is_an_error_not_a_panic() {
        let store = MemoryStore::new();
        let customer = store
            .create(NewCustomer {
                name: "Bilal".to_owned(),
                email: Email::parse("bilal@example.com").unwrap(),
                phone: "0300".to_owned(),
                street: "Street 1".to_owned(),
                city: None,
                zip: None,
                country_id: None,
                state_id: None,
                customer_rank: 1,
            })
            .await
            .unwrap();
        let order = store
            .create_order(NewOrder {
                customer_id: customer.id,
                status: OrderStatus::Draft,
                note: String::new(),
            })
            .await
            .unwrap();

        let err = store
            .add_line(
                order.id,
                NewOrderLine {
                    product_id: ProductId::new(1),
                    description: "Big".to_owned(),
                    quantity: Decimal::MAX,
                    price_unit: Decimal::TWO,
                    is_delivery: false,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::AmountOutOfRange(_)));
        assert_eq!(store.line_count(), 0);
    }
}
