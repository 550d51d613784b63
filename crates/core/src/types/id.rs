//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create ID wrappers so that a customer ID can
//! never be passed where a catalog entry ID is expected.

use serde::{Deserialize, Serialize};

/// Macro to define a type-safe ID wrapper around `i32`.
///
/// Generated types are `Copy`, hashable, serialize transparently and (with the
/// `postgres` feature) bind directly as `INTEGER` columns.
///
/// # Example
///
/// ```rust
/// # use cravely_core::define_id;
/// define_id!(TableId);
/// define_id!(WaiterId);
///
/// let table = TableId::new(4);
/// assert_eq!(table.as_i32(), 4);
///
/// // Different types, so this won't compile:
/// // let _: WaiterId = table;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Wrap a raw database identifier.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// The raw database identifier.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                <i32 as ::sqlx::Decode<::sqlx::Postgres>>::decode(value).map(Self)
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <i32 as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

define_id!(CategoryId);
define_id!(CountryId);
define_id!(CountryStateId);
define_id!(CustomerId);
define_id!(OrderId);
define_id!(OrderLineId);
define_id!(ProductId);
define_id!(ProductImageId);

/// Prefix used by the storefront when it exposes product IDs to the browser.
pub const PRODUCT_REFERENCE_PREFIX: &str = "product-";

impl ProductId {
    /// Parse the product reference sent back by the browser.
    ///
    /// Accepts both the prefixed listing form (`product-42`) and a bare
    /// number (`42`). Anything else yields `None`.
    #[must_use]
    pub fn from_reference(reference: &str) -> Option<Self> {
        let raw = reference.trim();
        let digits = raw.strip_prefix(PRODUCT_REFERENCE_PREFIX).unwrap_or(raw);
        digits.parse::<i32>().ok().filter(|id| *id > 0).map(Self)
    }

    /// The prefixed form used in listing payloads.
    #[must_use]
    pub fn reference(&self) -> String {
        format!("{PRODUCT_REFERENCE_PREFIX}{}", self.0)
    }
}

/// Reference to a product as sent by the browser: either a string such as
/// `"product-42"` or a JSON number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductReference {
    Numeric(i64),
    Text(String),
}

impl ProductReference {
    /// Resolve to a typed ID if the reference is well formed.
    #[must_use]
    pub fn product_id(&self) -> Option<ProductId> {
        match self {
            Self::Numeric(n) => i32::try_from(*n)
                .ok()
                .filter(|id| *id > 0)
                .map(ProductId::new),
            Self::Text(s) => ProductId::from_reference(s),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_reference_accepts_prefixed_and_bare() {
        assert_eq!(ProductId::from_reference("product-42"), Some(ProductId::new(42)));
        assert_eq!(ProductId::from_reference(" 7 "), Some(ProductId::new(7)));
    }

    #[test]
    fn test_from_reference_rejects_garbage() {
        assert_eq!(ProductId::from_reference("product-"), None);
        assert_eq!(ProductId::from_reference("cart-item-3"), None);
        assert_eq!(ProductId::from_reference("product-0"), None);
        assert_eq!(ProductId::from_reference("-5"), None);
    }

    #[test]
    fn test_reference_round_trips_through_listing_form() {
        let id = ProductId::new(13);
        assert_eq!(id.reference(), "product-13");
        assert_eq!(ProductId::from_reference(&id.reference()), Some(id));
    }

    #[test]
    fn test_product_reference_untagged() {
        let numeric: ProductReference = serde_json::from_str("12").unwrap();
        assert_eq!(numeric.product_id(), Some(ProductId::new(12)));

        let text: ProductReference = serde_json::from_str("\"product-9\"").unwrap();
        assert_eq!(text.product_id(), Some(ProductId::new(9)));

        let junk: ProductReference = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(junk.product_id(), None);
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&CustomerId::new(5)).unwrap();
        assert_eq!(json, "5");
    }
}
