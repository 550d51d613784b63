//! Cravely Core - Shared domain types.
//!
//! This crate provides the types and pure helpers used across the Cravely
//! order service:
//! - `storefront` - JSON menu and checkout service
//! - `cli` - Command-line tools for migrations and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money, emails, and statuses
//! - [`slug`] - Category slug normalization
//! - [`text`] - Product description formatting

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod slug;
pub mod text;
pub mod types;

pub use slug::{slug_matches, slugify};
pub use text::{DEFAULT_DESCRIPTION, truncate_description};
pub use types::*;
