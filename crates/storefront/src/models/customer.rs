//! Customer directory models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cravely_core::{CountryId, CountryStateId, CustomerId, Email};

/// A customer identity, keyed by email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: Email,
    pub phone: String,
    pub street: String,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub country_id: Option<CountryId>,
    pub state_id: Option<CountryStateId>,
    /// Incremented when the contact first orders.
    pub customer_rank: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new customer record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub name: String,
    pub email: Email,
    pub phone: String,
    pub street: String,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub country_id: Option<CountryId>,
    pub state_id: Option<CountryStateId>,
    pub customer_rank: i32,
}

/// Contact fields overwritten on a returning customer.
///
/// `city` is only overwritten when supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactUpdate {
    pub name: String,
    pub phone: String,
    pub street: String,
    pub zip: Option<String>,
    pub city: Option<String>,
}

/// Country reference record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub id: CountryId,
    pub name: String,
    pub code: Option<String>,
}

/// Province or state within a country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryState {
    pub id: CountryStateId,
    pub country_id: CountryId,
    pub name: String,
    pub code: Option<String>,
}
