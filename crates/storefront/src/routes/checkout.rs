//! Checkout endpoints.
//!
//! Orders are built only from the submitted JSON body. The session holds
//! nothing but the cart snapshot the page pushes via `update-cart`, which is
//! cleared once an order is placed.

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequestId;
use crate::models::session::keys;
use crate::services::payment::{PaymentApproval, validate_payment};
use crate::services::{CartPayload, CheckoutContext, OrderAssembler, PaymentDetails};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct OrderPlacedResponse {
    pub success: bool,
    /// Order name shown to the customer, e.g. `S00042`.
    pub order_id: String,
    pub sales_order_id: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub message: &'static str,
    pub estimated_delivery: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub success: bool,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TestResponse {
    pub success: bool,
    pub message: &'static str,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct NextOrderIdResponse {
    pub success: bool,
    pub next_order_id: String,
}

fn malformed_body(rejection: &JsonRejection) -> AppError {
    tracing::debug!(error = %rejection, "Rejected request body");
    AppError::BadRequest("Invalid JSON body".to_owned())
}

/// Place an order from a cart submission.
#[instrument(skip_all)]
pub async fn process_order(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    session: Session,
    payload: std::result::Result<Json<CartPayload>, JsonRejection>,
) -> Result<Json<OrderPlacedResponse>> {
    let Json(payload) = payload.map_err(|e| malformed_body(&e))?;
    let ctx = CheckoutContext {
        request_id: request_id.0.clone(),
    };

    let placed = OrderAssembler::new(state.stores(), &state.config().checkout)
        .submit(&ctx, &payload)
        .await
        .inspect_err(|e| {
            add_breadcrumb("checkout", "Order failed", Some(&[("stage", e.stage().as_str())]));
        })?;

    add_breadcrumb(
        "checkout",
        "Order placed",
        Some(&[("order", placed.order_name.as_str())]),
    );

    if let Err(e) = session.remove::<serde_json::Value>(keys::CART_SNAPSHOT).await {
        tracing::warn!(error = %e, "Failed to clear cart snapshot from session");
    }

    Ok(Json(OrderPlacedResponse {
        success: true,
        order_id: placed.order_name,
        sales_order_id: placed.order_id.as_i32(),
        total: placed.total,
        message: "Order placed successfully!",
        estimated_delivery: placed.estimated_delivery,
    }))
}

/// Store the browser's cart snapshot in the session.
#[instrument(skip_all)]
pub async fn update_cart(
    session: Session,
    payload: std::result::Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let Json(cart) = payload.map_err(|e| malformed_body(&e))?;

    session
        .insert(keys::CART_SNAPSHOT, cart)
        .await
        .map_err(|e| AppError::Internal(format!("session write failed: {e}")))?;

    Ok(Json(MessageResponse {
        success: true,
        message: "Cart updated successfully".to_owned(),
    }))
}

/// Check payment details. No gateway is contacted.
#[instrument(skip_all)]
pub async fn validate_payment_details(
    payload: std::result::Result<Json<PaymentDetails>, JsonRejection>,
) -> Result<Json<PaymentResponse>> {
    let Json(details) = payload.map_err(|e| malformed_body(&e))?;
    let approval = validate_payment(&details)?;

    let message = approval.message();
    let transaction_id = match approval {
        PaymentApproval::Online { transaction_id } => Some(transaction_id),
        PaymentApproval::CashOnDelivery => None,
    };
    Ok(Json(PaymentResponse {
        success: true,
        message,
        transaction_id,
    }))
}

/// Diagnostic endpoint for the checkout page.
pub async fn test() -> Json<TestResponse> {
    Json(TestResponse {
        success: true,
        message: "Checkout controller is working!",
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Name the next order will receive. Informational only.
#[instrument(skip_all)]
pub async fn next_order_id(State(state): State<AppState>) -> Result<Json<NextOrderIdResponse>> {
    let next = OrderAssembler::new(state.stores(), &state.config().checkout)
        .next_order_name()
        .await?;

    Ok(Json(NextOrderIdResponse {
        success: true,
        next_order_id: next,
    }))
}
