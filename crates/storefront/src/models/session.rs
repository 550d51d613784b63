//! Session-stored data.
//!
//! The browser pushes cart snapshots via `/checkout/update-cart` so a reload
//! of the checkout page can restore them. The checkout pipeline itself never
//! reads the session; orders are built only from the submitted payload.

/// Session keys.
pub mod keys {
    /// Latest cart snapshot pushed by the browser.
    pub const CART_SNAPSHOT: &str = "cart_snapshot";
}
