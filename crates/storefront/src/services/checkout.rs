//! Order assembly for checkout submissions.
//!
//! A submission moves through these stages:
//!
//! ```text
//! Received -> Validated -> CustomerResolved -> OrderCreated -> LinesCreated
//!          -> (DeliveryAdded) -> TotalsRecomputed -> Succeeded
//! ```
//!
//! Validation happens before any write. After that each step writes through
//! the stores directly, without a surrounding transaction: a store failure
//! aborts the remaining steps and leaves earlier writes in place. Items that
//! cannot be matched to the catalog are skipped, and a failed totals
//! recomputation only downgrades the reported total to the client's figure.

use std::fmt;

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use cravely_core::{
    Email, EmailError, OrderId, OrderStatus, OrderType, PaymentMethod, ProductId,
    ProductReference,
};

use super::catalog_lookup::{CatalogLookup, Resolution};
use super::customers::{ContactDetails, CustomerResolver};
use crate::config::CheckoutConfig;
use crate::db::RepositoryError;
use crate::models::{NewOrder, NewOrderLine};
use crate::store::Stores;

/// Largest quantity accepted for one cart item.
pub const MAX_ITEM_QUANTITY: Decimal = Decimal::from_parts(1_000, 0, 0, false, 0);

/// Largest unit price, and delivery fee, accepted from the client.
pub const MAX_ITEM_PRICE: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

// =============================================================================
// Stages and Errors
// =============================================================================

/// Pipeline stage of a checkout submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStage {
    Received,
    Validated,
    CustomerResolved,
    OrderCreated,
    LinesCreated,
    DeliveryAdded,
    TotalsRecomputed,
    Succeeded,
}

impl SubmissionStage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Validated => "validated",
            Self::CustomerResolved => "customer_resolved",
            Self::OrderCreated => "order_created",
            Self::LinesCreated => "lines_created",
            Self::DeliveryAdded => "delivery_added",
            Self::TotalsRecomputed => "totals_recomputed",
            Self::Succeeded => "succeeded",
        }
    }
}

impl fmt::Display for SubmissionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The submitted payload is unusable. Nothing has been written.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Invalid email address: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Invalid payment method: {0}")]
    InvalidPaymentMethod(String),

    #[error("Invalid order type: {0}")]
    InvalidOrderType(String),

    #[error("Invalid item at position {index}: {reason}")]
    InvalidItem { index: usize, reason: &'static str },

    #[error("Invalid delivery fee")]
    InvalidDeliveryFee,
}

/// Errors that stop a checkout submission.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A store write or read failed. `stage` is the stage being entered.
    #[error("store failure before {stage}: {source}")]
    Persistence {
        stage: SubmissionStage,
        #[source]
        source: RepositoryError,
    },
}

impl CheckoutError {
    fn persistence(stage: SubmissionStage) -> impl FnOnce(RepositoryError) -> Self {
        move |source| Self::Persistence { stage, source }
    }

    /// Stage the pipeline failed in.
    #[must_use]
    pub const fn stage(&self) -> SubmissionStage {
        match self {
            Self::Validation(_) => SubmissionStage::Validated,
            Self::Persistence { stage, .. } => *stage,
        }
    }
}

// =============================================================================
// Payload
// =============================================================================

/// Cart submission as posted by the browser.
///
/// Every field is optional at the wire level so that a missing field is
/// reported by [`CartPayload::validate`] rather than as a decode error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartPayload {
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub customer_address: Option<String>,
    pub customer_country: Option<String>,
    pub customer_state: Option<String>,
    pub customer_city: Option<String>,
    pub customer_zipcode: Option<String>,
    pub payment_method: Option<String>,
    pub order_type: Option<String>,
    pub items: Option<Vec<CartItem>>,
    pub subtotal: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub delivery_fee: Option<Decimal>,
    pub grand_total: Option<Decimal>,
    pub order_date: Option<String>,
    pub order_time: Option<String>,
}

/// One cart item as posted by the browser.
#[derive(Debug, Clone, Deserialize)]
pub struct CartItem {
    #[serde(default)]
    pub name: String,
    /// Defaults to one when omitted.
    pub quantity: Option<Decimal>,
    pub price: Option<Decimal>,
    pub id: Option<ProductReference>,
}

/// A payload that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCart {
    pub contact: ContactDetails,
    pub payment_method: PaymentMethod,
    pub order_type: OrderType,
    pub items: Vec<ValidatedItem>,
    pub delivery_fee: Decimal,
    pub grand_total: Decimal,
    pub order_date: String,
    pub order_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedItem {
    /// May be blank; blank items are skipped when lines are created.
    pub name: String,
    pub quantity: Decimal,
    pub price: Decimal,
    pub product_id: Option<ProductId>,
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn optional(value: Option<&String>) -> Option<String> {
    present(value).map(str::to_owned)
}

impl CartPayload {
    /// Check the payload and convert it into typed values.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MissingFields` listing every required field
    /// that is absent or blank, otherwise the first malformed value found.
    pub fn validate(&self) -> Result<ValidatedCart, ValidationError> {
        let name = present(self.customer_name.as_ref());
        let phone = present(self.customer_phone.as_ref());
        let email = present(self.customer_email.as_ref());
        let address = present(self.customer_address.as_ref());
        let payment = present(self.payment_method.as_ref());
        let items = self.items.as_deref().filter(|items| !items.is_empty());

        let mut missing = Vec::new();
        for (field, is_present) in [
            ("customerName", name.is_some()),
            ("customerPhone", phone.is_some()),
            ("customerEmail", email.is_some()),
            ("customerAddress", address.is_some()),
            ("paymentMethod", payment.is_some()),
            ("grandTotal", self.grand_total.is_some()),
            ("items", items.is_some()),
        ] {
            if !is_present {
                missing.push(field);
            }
        }

        let (
            Some(name),
            Some(phone),
            Some(email),
            Some(address),
            Some(payment),
            Some(grand_total),
            Some(items),
        ) = (name, phone, email, address, payment, self.grand_total, items)
        else {
            return Err(ValidationError::MissingFields(missing));
        };

        let email = Email::parse(email)?;
        let payment_method: PaymentMethod = payment
            .parse()
            .map_err(|_| ValidationError::InvalidPaymentMethod(payment.to_owned()))?;
        let order_type = match present(self.order_type.as_ref()) {
            Some(raw) => raw
                .parse()
                .map_err(|_| ValidationError::InvalidOrderType(raw.to_owned()))?,
            None => OrderType::default(),
        };

        let items = items
            .iter()
            .enumerate()
            .map(|(index, item)| item.validate(index))
            .collect::<Result<Vec<_>, _>>()?;

        let delivery_fee = self.delivery_fee.unwrap_or(Decimal::ZERO);
        if delivery_fee > MAX_ITEM_PRICE {
            return Err(ValidationError::InvalidDeliveryFee);
        }

        Ok(ValidatedCart {
            contact: ContactDetails {
                name: name.to_owned(),
                email,
                phone: phone.to_owned(),
                street: address.to_owned(),
                city: optional(self.customer_city.as_ref()),
                zip: optional(self.customer_zipcode.as_ref()),
                country: optional(self.customer_country.as_ref()),
                state: optional(self.customer_state.as_ref()),
            },
            payment_method,
            order_type,
            items,
            delivery_fee,
            grand_total,
            order_date: optional(self.order_date.as_ref()).unwrap_or_default(),
            order_time: optional(self.order_time.as_ref()).unwrap_or_default(),
        })
    }
}

impl CartItem {
    fn validate(&self, index: usize) -> Result<ValidatedItem, ValidationError> {
        let quantity = self.quantity.unwrap_or(Decimal::ONE);
        if quantity <= Decimal::ZERO {
            return Err(ValidationError::InvalidItem {
                index,
                reason: "quantity must be positive",
            });
        }
        if quantity > MAX_ITEM_QUANTITY {
            return Err(ValidationError::InvalidItem {
                index,
                reason: "quantity is too large",
            });
        }
        let price = self.price.ok_or(ValidationError::InvalidItem {
            index,
            reason: "price is required",
        })?;
        if price < Decimal::ZERO {
            return Err(ValidationError::InvalidItem {
                index,
                reason: "price must not be negative",
            });
        }
        if price > MAX_ITEM_PRICE {
            return Err(ValidationError::InvalidItem {
                index,
                reason: "price is too large",
            });
        }

        Ok(ValidatedItem {
            name: self.name.trim().to_owned(),
            quantity,
            price,
            product_id: self.id.as_ref().and_then(ProductReference::product_id),
        })
    }
}

impl ValidatedCart {
    /// Free-text order note recording how the order should be fulfilled.
    #[must_use]
    pub fn note(&self) -> String {
        let mut note = format!(
            "Payment method: {}\nOrder type: {}",
            self.payment_method, self.order_type
        );
        if !self.order_date.is_empty() {
            note.push_str("\nOrder date: ");
            note.push_str(&self.order_date);
        }
        if !self.order_time.is_empty() {
            note.push_str("\nOrder time: ");
            note.push_str(&self.order_time);
        }
        note
    }
}

// =============================================================================
// Assembler
// =============================================================================

/// Request-scoped data passed into the pipeline.
#[derive(Debug, Clone)]
pub struct CheckoutContext {
    pub request_id: String,
}

/// Result of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOrder {
    pub order_id: OrderId,
    /// Sequence name, e.g. `S00042`.
    pub order_name: String,
    pub total: Decimal,
    /// False when recomputation failed and `total` is the client's figure.
    pub totals_recomputed: bool,
    pub line_count: usize,
    pub skipped_items: usize,
    pub estimated_delivery: String,
}

/// Turns a cart submission into a persisted order.
pub struct OrderAssembler<'a> {
    stores: &'a Stores,
    config: &'a CheckoutConfig,
}

impl<'a> OrderAssembler<'a> {
    #[must_use]
    pub const fn new(stores: &'a Stores, config: &'a CheckoutConfig) -> Self {
        Self { stores, config }
    }

    /// Run the full pipeline for one submission.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Validation` before any write, or
    /// `CheckoutError::Persistence` if a store fails part way.
    #[instrument(skip_all, fields(request_id = %ctx.request_id, order = tracing::field::Empty))]
    pub async fn submit(
        &self,
        ctx: &CheckoutContext,
        payload: &CartPayload,
    ) -> Result<PlacedOrder, CheckoutError> {
        let cart = payload.validate()?;

        let customer = CustomerResolver::new(self.stores.customers.as_ref())
            .resolve_or_create_customer(&cart.contact)
            .await
            .map_err(CheckoutError::persistence(SubmissionStage::CustomerResolved))?;

        let order = self
            .stores
            .orders
            .create_order(NewOrder {
                customer_id: customer.id,
                status: OrderStatus::Draft,
                note: cart.note(),
            })
            .await
            .map_err(CheckoutError::persistence(SubmissionStage::OrderCreated))?;
        tracing::Span::current().record("order", order.name.as_str());
        info!(order_id = %order.id, customer_id = %customer.id, "Order created");

        let lookup = CatalogLookup::new(
            self.stores.catalog.as_ref(),
            self.config.legacy_name_matching,
        );

        let mut line_count = 0;
        let mut skipped_items = 0;
        for (index, item) in cart.items.iter().enumerate() {
            if item.name.is_empty() {
                warn!(index, "Skipping cart item without a name");
                skipped_items += 1;
                continue;
            }

            let resolution = lookup
                .resolve_cart_item(&item.name, item.product_id, item.price)
                .await
                .map_err(CheckoutError::persistence(SubmissionStage::LinesCreated))?;
            let Some(entry) = resolution.entry() else {
                warn!(index, name = %item.name, "Skipping cart item not found in catalog");
                skipped_items += 1;
                continue;
            };

            self.stores
                .orders
                .add_line(
                    order.id,
                    NewOrderLine {
                        product_id: entry.id,
                        description: item.name.clone(),
                        quantity: item.quantity,
                        price_unit: item.price,
                        is_delivery: false,
                    },
                )
                .await
                .map_err(CheckoutError::persistence(SubmissionStage::LinesCreated))?;
            line_count += 1;
        }

        if line_count != cart.items.len() {
            warn!(
                expected = cart.items.len(),
                created = line_count,
                "Order has fewer lines than submitted items"
            );
        }

        if cart.delivery_fee > Decimal::ZERO {
            let delivery = lookup
                .resolve_delivery_entry(&self.config.delivery_product_name)
                .await
                .map_err(CheckoutError::persistence(SubmissionStage::DeliveryAdded))?;
            self.stores
                .orders
                .add_line(
                    order.id,
                    NewOrderLine {
                        product_id: delivery.id,
                        description: delivery.name.clone(),
                        quantity: Decimal::ONE,
                        price_unit: cart.delivery_fee,
                        is_delivery: true,
                    },
                )
                .await
                .map_err(CheckoutError::persistence(SubmissionStage::DeliveryAdded))?;
            line_count += 1;
        }

        let (total, totals_recomputed) = match self.stores.orders.recompute_totals(order.id).await
        {
            Ok(totals) => (totals.amount_total, true),
            Err(e) => {
                warn!(
                    order_id = %order.id,
                    error = %e,
                    fallback_total = %cart.grand_total,
                    "Totals recomputation failed, using submitted total"
                );
                (cart.grand_total, false)
            }
        };

        info!(
            order_id = %order.id,
            %total,
            line_count,
            skipped_items,
            "Order placed"
        );

        Ok(PlacedOrder {
            order_id: order.id,
            order_name: order.name,
            total,
            totals_recomputed,
            line_count,
            skipped_items,
            estimated_delivery: self.config.estimated_delivery.clone(),
        })
    }

    /// Peek the name the next order will receive.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the order store fails.
    pub async fn next_order_name(&self) -> Result<String, RepositoryError> {
        self.stores.orders.next_order_name().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::models::{NewCatalogEntry, OrderLine, OrderTotals, SalesOrder};
    use crate::store::{MemoryStore, OrderStore};

    /// Delegates to the memory store but fails selected operations.
    struct FlakyOrders {
        inner: Arc<MemoryStore>,
        fail_line_after: Option<usize>,
        fail_recompute: bool,
        lines_added: AtomicUsize,
    }

    fn outage() -> RepositoryError {
        RepositoryError::Database(sqlx::Error::PoolTimedOut)
    }

    #[async_trait]
    impl OrderStore for FlakyOrders {
        async fn create_order(&self, order: NewOrder) -> Result<SalesOrder, RepositoryError> {
            self.inner.create_order(order).await
        }

        async fn add_line(
            &self,
            order_id: OrderId,
            line: NewOrderLine,
        ) -> Result<OrderLine, RepositoryError> {
            let added = self.lines_added.fetch_add(1, Ordering::SeqCst);
            if self.fail_line_after.is_some_and(|limit| added >= limit) {
                return Err(outage());
            }
            self.inner.add_line(order_id, line).await
        }

        async fn recompute_totals(&self, order_id: OrderId) -> Result<OrderTotals, RepositoryError> {
            if self.fail_recompute {
                return Err(outage());
            }
            self.inner.recompute_totals(order_id).await
        }

        async fn next_order_name(&self) -> Result<String, RepositoryError> {
            self.inner.next_order_name().await
        }

        async fn get_order(&self, order_id: OrderId) -> Result<Option<SalesOrder>, RepositoryError> {
            self.inner.get_order(order_id).await
        }

        async fn order_lines(&self, order_id: OrderId) -> Result<Vec<OrderLine>, RepositoryError> {
            self.inner.order_lines(order_id).await
        }
    }

    fn seeded_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let category = store.insert_category("Rice Box", 1, true);
        for (name, price) in [("Chicken Tikka Rice Box", 650), ("Mint Margarita", 250)] {
            store.insert_product(NewCatalogEntry {
                is_published: true,
                website_published: true,
                category_id: Some(category.id),
                ..NewCatalogEntry::minimal(name, Decimal::new(price, 0))
            });
        }
        store
    }

    fn flaky(store: &Arc<MemoryStore>, fail_line_after: Option<usize>, fail_recompute: bool) -> Stores {
        Stores {
            orders: Arc::new(FlakyOrders {
                inner: store.clone(),
                fail_line_after,
                fail_recompute,
                lines_added: AtomicUsize::new(0),
            }),
            ..Stores::memory(store.clone())
        }
    }

    fn payload(value: serde_json::Value) -> CartPayload {
        serde_json::from_value(value).unwrap()
    }

    fn valid_payload() -> serde_json::Value {
        json!({
            "customerName": "Sana Tariq",
            "customerPhone": "0321-5555555",
            "customerEmail": "sana@example.com",
            "customerAddress": "House 4, Street 9, DHA",
            "customerCountry": "Pakistan",
            "customerCity": "Karachi",
            "paymentMethod": "cash",
            "items": [
                {"name": "Chicken Tikka Rice Box", "quantity": 2, "price": 650},
                {"name": "Mint Margarita", "quantity": 1, "price": 250}
            ],
            "subtotal": 1550,
            "tax": 0,
            "deliveryFee": 100,
            "grandTotal": 1650,
            "orderDate": "2026-10-19",
            "orderTime": "19:30"
        })
    }

    fn ctx() -> CheckoutContext {
        CheckoutContext {
            request_id: "test-request".to_owned(),
        }
    }

    #[test]
    fn test_missing_fields_are_all_reported() {
        let err = payload(json!({"customerName": "  ", "items": []}))
            .validate()
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingFields(vec![
                "customerName",
                "customerPhone",
                "customerEmail",
                "customerAddress",
                "paymentMethod",
                "grandTotal",
                "items",
            ])
        );
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut body = valid_payload();
        body["paymentMethod"] = json!("bitcoin");
        assert!(matches!(
            payload(body).validate(),
            Err(ValidationError::InvalidPaymentMethod(_))
        ));

        let mut body = valid_payload();
        body["customerEmail"] = json!("not-an-email");
        assert!(matches!(
            payload(body).validate(),
            Err(ValidationError::InvalidEmail(_))
        ));

        let mut body = valid_payload();
        body["items"][1]["quantity"] = json!(0);
        assert_eq!(
            payload(body).validate().unwrap_err(),
            ValidationError::InvalidItem {
                index: 1,
                reason: "quantity must be positive"
            }
        );
    }

    #[test]
    fn test_out_of_range_amounts_are_rejected() {
        let mut body = valid_payload();
        body["items"][0]["quantity"] = json!(1e15);
        assert_eq!(
            payload(body).validate().unwrap_err(),
            ValidationError::InvalidItem {
                index: 0,
                reason: "quantity is too large"
            }
        );

        let mut body = valid_payload();
        body["items"][1]["price"] = json!(1e15);
        assert_eq!(
            payload(body).validate().unwrap_err(),
            ValidationError::InvalidItem {
                index: 1,
                reason: "price is too large"
            }
        );

        let mut body = valid_payload();
        body["deliveryFee"] = json!(1e15);
        assert_eq!(
            payload(body).validate().unwrap_err(),
            ValidationError::InvalidDeliveryFee
        );

        // The limits themselves are accepted
        let mut body = valid_payload();
        body["items"][0]["quantity"] = json!(1000);
        body["items"][0]["price"] = json!(1_000_000);
        assert!(payload(body).validate().is_ok());
    }

    #[tokio::test]
    async fn test_huge_item_is_rejected_before_any_write() {
        let store = seeded_store();
        let stores = Stores::memory(store.clone());
        let config = CheckoutConfig::default();
        let mut body = valid_payload();
        body["items"] = json!([{"name": "Big", "quantity": 1e15, "price": 1e15}]);

        let err = OrderAssembler::new(&stores, &config)
            .submit(&ctx(), &payload(body))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::Validation(ValidationError::InvalidItem { index: 0, .. })
        ));
        assert!(store.customers().is_empty());
        assert!(store.orders().is_empty());
    }

    #[test]
    fn test_note_records_fulfilment_details() {
        let mut body = valid_payload();
        body["orderType"] = json!("pickup");
        let cart = payload(body).validate().unwrap();
        assert_eq!(
            cart.note(),
            "Payment method: cash\nOrder type: pickup\nOrder date: 2026-10-19\nOrder time: 19:30"
        );
    }

    #[test]
    fn test_item_reference_is_parsed() {
        let mut body = valid_payload();
        body["items"][0]["id"] = json!("product-7");
        body["items"][1]["id"] = json!(3);
        let cart = payload(body).validate().unwrap();
        assert_eq!(cart.items[0].product_id, Some(ProductId::new(7)));
        assert_eq!(cart.items[1].product_id, Some(ProductId::new(3)));
    }

    #[tokio::test]
    async fn test_missing_email_writes_nothing() {
        let store = seeded_store();
        let stores = Stores::memory(store.clone());
        let config = CheckoutConfig::default();
        let mut body = valid_payload();
        body.as_object_mut().unwrap().remove("customerEmail");

        let err = OrderAssembler::new(&stores, &config)
            .submit(&ctx(), &payload(body))
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Validation(_)));
        assert!(store.customers().is_empty());
        assert!(store.orders().is_empty());
        assert_eq!(store.products().len(), 2);
    }

    #[tokio::test]
    async fn test_two_items_and_delivery_make_three_lines() {
        let store = seeded_store();
        let stores = Stores::memory(store.clone());
        let config = CheckoutConfig::default();

        let placed = OrderAssembler::new(&stores, &config)
            .submit(&ctx(), &payload(valid_payload()))
            .await
            .unwrap();

        assert_eq!(placed.order_name, "S00001");
        assert_eq!(placed.line_count, 3);
        assert_eq!(placed.skipped_items, 0);
        assert!(placed.totals_recomputed);
        assert_eq!(placed.total, Decimal::new(1650, 0));
        assert_eq!(placed.estimated_delivery, "35-45 minutes");

        let lines = store.order_lines(placed.order_id).await.unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines.iter().filter(|l| l.is_delivery).count(), 1);

        let order = store.get_order(placed.order_id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Draft);
        assert!(order.note.contains("Payment method: cash"));
    }

    #[tokio::test]
    async fn test_same_email_keeps_one_customer_with_latest_phone() {
        let store = seeded_store();
        let stores = Stores::memory(store.clone());
        let config = CheckoutConfig::default();
        let assembler = OrderAssembler::new(&stores, &config);

        assembler
            .submit(&ctx(), &payload(valid_payload()))
            .await
            .unwrap();
        let mut second = valid_payload();
        second["customerPhone"] = json!("0333-7777777");
        assembler.submit(&ctx(), &payload(second)).await.unwrap();

        let customers = store.customers();
        assert_eq!(customers.len(), 1);
        assert_eq!(customers[0].phone, "0333-7777777");
        assert_eq!(store.orders().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_items_are_synthesized_and_blank_names_skipped() {
        let store = seeded_store();
        let stores = Stores::memory(store.clone());
        let config = CheckoutConfig::default();
        let mut body = valid_payload();
        body["items"] = json!([
            {"name": "Seekh Kabab Platter", "quantity": 1, "price": 1100},
            {"name": "   ", "quantity": 1, "price": 50}
        ]);
        body["deliveryFee"] = json!(0);

        let placed = OrderAssembler::new(&stores, &config)
            .submit(&ctx(), &payload(body))
            .await
            .unwrap();

        assert_eq!(placed.line_count, 1);
        assert_eq!(placed.skipped_items, 1);
        assert!(
            store
                .products()
                .iter()
                .any(|p| p.name == "Seekh Kabab Platter" && !p.is_published)
        );
    }

    #[tokio::test]
    async fn test_unresolvable_items_skipped_without_name_matching() {
        let store = seeded_store();
        let stores = Stores::memory(store.clone());
        let config = CheckoutConfig {
            legacy_name_matching: false,
            ..CheckoutConfig::default()
        };

        let placed = OrderAssembler::new(&stores, &config)
            .submit(&ctx(), &payload(valid_payload()))
            .await
            .unwrap();

        // Only the delivery line; neither item carried a product reference.
        assert_eq!(placed.line_count, 1);
        assert_eq!(placed.skipped_items, 2);
    }

    #[tokio::test]
    async fn test_recompute_failure_falls_back_to_grand_total() {
        let store = seeded_store();
        let stores = flaky(&store, None, true);
        let config = CheckoutConfig::default();
        let mut body = valid_payload();
        body["grandTotal"] = json!(1999.5);

        let placed = OrderAssembler::new(&stores, &config)
            .submit(&ctx(), &payload(body))
            .await
            .unwrap();

        assert!(!placed.totals_recomputed);
        assert_eq!(placed.total, Decimal::new(19_995, 1));
    }

    #[tokio::test]
    async fn test_line_failure_leaves_earlier_writes() {
        let store = seeded_store();
        let stores = flaky(&store, Some(1), false);
        let config = CheckoutConfig::default();

        let err = OrderAssembler::new(&stores, &config)
            .submit(&ctx(), &payload(valid_payload()))
            .await
            .unwrap_err();

        assert_eq!(err.stage(), SubmissionStage::LinesCreated);
        assert_eq!(store.customers().len(), 1);
        assert_eq!(store.orders().len(), 1);
        assert_eq!(store.line_count(), 1);
    }
}
