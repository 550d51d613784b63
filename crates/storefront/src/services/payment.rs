//! Payment method checks.
//!
//! There is no gateway behind this: online payments only get a shape check
//! on the card fields and a locally generated transaction reference.

use chrono::Utc;
use rand::Rng;
use serde::Deserialize;
use thiserror::Error;

/// Accepted card number length range, after removing spaces.
const CARD_NUMBER_LENGTH: std::ops::RangeInclusive<usize> = 13..=19;

/// Payment details posted by the checkout page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub payment_method: Option<String>,
    pub card_number: Option<String>,
    pub card_expiry: Option<String>,
    pub card_cvv: Option<String>,
    pub card_name: Option<String>,
}

/// Errors from payment validation. Messages are safe to show to the customer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaymentError {
    #[error("Missing card information: {0}")]
    MissingCardField(&'static str),

    #[error("Invalid card number")]
    InvalidCardNumber,
}

/// Outcome of a successful validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentApproval {
    Online { transaction_id: String },
    CashOnDelivery,
}

impl PaymentApproval {
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Online { .. } => "Payment validated successfully",
            Self::CashOnDelivery => "Cash on delivery selected",
        }
    }
}

/// Validate payment details.
///
/// Anything other than `online` is treated as cash on delivery.
///
/// # Errors
///
/// Returns `PaymentError` if an online payment is missing a card field or
/// the card number has the wrong length.
pub fn validate_payment(details: &PaymentDetails) -> Result<PaymentApproval, PaymentError> {
    let is_online = details
        .payment_method
        .as_deref()
        .is_some_and(|m| m.trim().eq_ignore_ascii_case("online"));
    if !is_online {
        return Ok(PaymentApproval::CashOnDelivery);
    }

    for (field, value) in [
        ("cardNumber", &details.card_number),
        ("cardExpiry", &details.card_expiry),
        ("cardCvv", &details.card_cvv),
        ("cardName", &details.card_name),
    ] {
        if value.as_deref().is_none_or(|v| v.trim().is_empty()) {
            return Err(PaymentError::MissingCardField(field));
        }
    }

    let digits = details
        .card_number
        .as_deref()
        .unwrap_or_default()
        .replace(' ', "");
    if !CARD_NUMBER_LENGTH.contains(&digits.chars().count()) {
        return Err(PaymentError::InvalidCardNumber);
    }

    Ok(PaymentApproval::Online {
        transaction_id: generate_transaction_id(),
    })
}

/// `TXN_<unix seconds><4 random digits>`.
fn generate_transaction_id() -> String {
    let seconds = Utc::now().timestamp();
    let suffix: u16 = rand::rng().random_range(1000..=9999);
    format!("TXN_{seconds}{suffix}")
}
