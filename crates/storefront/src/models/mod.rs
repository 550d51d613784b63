//! Domain models for the storefront.
//!
//! These are the records the checkout pipeline and the menu listings work
//! with, independent of the store backend that persists them.

pub mod catalog;
pub mod customer;
pub mod order;
pub mod session;

pub use catalog::{CatalogEntry, Category, NameMatch, NewCatalogEntry, ProductSearch};
pub use customer::{ContactUpdate, Country, CountryState, Customer, NewCustomer};
pub use order::{NewOrder, NewOrderLine, OrderLine, OrderTotals, SalesOrder};
