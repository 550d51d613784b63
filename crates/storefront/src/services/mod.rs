//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `catalog_lookup` - Resolve cart items to catalog entries
//! - `customers` - Find or create customers by email
//! - `checkout` - Assemble orders from cart submissions
//! - `payment` - Payment method validation (no gateway)
//! - `menu` - Cached category and product listings

pub mod catalog_lookup;
pub mod checkout;
pub mod customers;
pub mod menu;
pub mod payment;

pub use checkout::{CartPayload, CheckoutContext, CheckoutError, OrderAssembler, PlacedOrder};
pub use menu::MenuService;
pub use payment::{PaymentDetails, PaymentError};
