//! Domain types for the order service.
//!
//! This module provides type-safe wrappers for the values that flow through
//! the checkout pipeline and the menu listings.

pub mod email;
pub mod id;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CurrencyCode, round_money};
pub use status::*;
