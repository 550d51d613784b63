//! Customer directory repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use cravely_core::{CountryId, CountryStateId, CustomerId, Email};

use super::RepositoryError;
use crate::models::{ContactUpdate, Country, CountryState, Customer, NewCustomer};
use crate::store::CustomerDirectory;

const CUSTOMER_COLUMNS: &str = r"
    id, name, email, phone, street, city, zip, country_id, state_id,
    customer_rank, created_at, updated_at
";

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: i32,
    name: String,
    email: String,
    phone: String,
    street: String,
    city: Option<String>,
    zip: Option<String>,
    country_id: Option<i32>,
    state_id: Option<i32>,
    customer_rank: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = RepositoryError;

    fn try_from(r: CustomerRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&r.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: CustomerId::new(r.id),
            name: r.name,
            email,
            phone: r.phone,
            street: r.street,
            city: r.city,
            zip: r.zip,
            country_id: r.country_id.map(CountryId::new),
            state_id: r.state_id.map(CountryStateId::new),
            customer_rank: r.customer_rank,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CountryRow {
    id: i32,
    name: String,
    code: Option<String>,
}

#[derive(sqlx::FromRow)]
struct CountryStateRow {
    id: i32,
    country_id: i32,
    name: String,
    code: Option<String>,
}

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct PgCustomerDirectory {
    pool: PgPool,
}

impl PgCustomerDirectory {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a country unless one with the same name exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn ensure_country(
        &self,
        name: &str,
        code: Option<&str>,
    ) -> Result<Country, RepositoryError> {
        if let Some(country) = self.find_country(name).await? {
            return Ok(country);
        }

        let row = sqlx::query_as::<_, CountryRow>(
            r"
            INSERT INTO storefront.country (name, code)
            VALUES ($1, $2)
            RETURNING id, name, code
            ",
        )
        .bind(name)
        .bind(code)
        .fetch_one(&self.pool)
        .await?;

        Ok(Country {
            id: CountryId::new(row.id),
            name: row.name,
            code: row.code,
        })
    }

    /// Insert a state unless the country already has one with the same name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn ensure_state(
        &self,
        country_id: CountryId,
        name: &str,
        code: Option<&str>,
    ) -> Result<CountryState, RepositoryError> {
        if let Some(state) = self.find_state(Some(country_id), name).await? {
            return Ok(state);
        }

        let row = sqlx::query_as::<_, CountryStateRow>(
            r"
            INSERT INTO storefront.country_state (country_id, name, code)
            VALUES ($1, $2, $3)
            RETURNING id, country_id, name, code
            ",
        )
        .bind(country_id)
        .bind(name)
        .bind(code)
        .fetch_one(&self.pool)
        .await?;

        Ok(state_from_row(row))
    }
}

fn state_from_row(r: CountryStateRow) -> CountryState {
    CountryState {
        id: CountryStateId::new(r.id),
        country_id: CountryId::new(r.country_id),
        name: r.name,
        code: r.code,
    }
}

#[async_trait]
impl CustomerDirectory for PgCustomerDirectory {
    async fn find_by_email(&self, email: &Email) -> Result<Option<Customer>, RepositoryError> {
        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM storefront.customer WHERE email = $1 ORDER BY id LIMIT 1"
        );
        let row = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Customer::try_from).transpose()
    }

    async fn create(&self, customer: NewCustomer) -> Result<Customer, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO storefront.customer (
                name, email, phone, street, city, zip, country_id, state_id, customer_rank
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {CUSTOMER_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(&customer.name)
            .bind(customer.email.as_str())
            .bind(&customer.phone)
            .bind(&customer.street)
            .bind(&customer.city)
            .bind(&customer.zip)
            .bind(customer.country_id)
            .bind(customer.state_id)
            .bind(customer.customer_rank)
            .fetch_one(&self.pool)
            .await?;

        row.try_into()
    }

    async fn update_contact(
        &self,
        id: CustomerId,
        update: ContactUpdate,
    ) -> Result<Customer, RepositoryError> {
        let sql = format!(
            r"
            UPDATE storefront.customer
            SET name = $2, phone = $3, street = $4, zip = $5,
                city = COALESCE($6, city), updated_at = NOW()
            WHERE id = $1
            RETURNING {CUSTOMER_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(id)
            .bind(&update.name)
            .bind(&update.phone)
            .bind(&update.street)
            .bind(&update.zip)
            .bind(&update.city)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    async fn find_country(&self, name: &str) -> Result<Option<Country>, RepositoryError> {
        let row = sqlx::query_as::<_, CountryRow>(
            r"
            SELECT id, name, code FROM storefront.country
            WHERE lower(name) = lower($1)
            ORDER BY id
            LIMIT 1
            ",
        )
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Country {
            id: CountryId::new(r.id),
            name: r.name,
            code: r.code,
        }))
    }

    async fn find_state(
        &self,
        country_id: Option<CountryId>,
        name: &str,
    ) -> Result<Option<CountryState>, RepositoryError> {
        let row = sqlx::query_as::<_, CountryStateRow>(
            r"
            SELECT id, country_id, name, code FROM storefront.country_state
            WHERE lower(name) = lower($2)
              AND ($1::int IS NULL OR country_id = $1)
            ORDER BY id
            LIMIT 1
            ",
        )
        .bind(country_id)
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(state_from_row))
    }
}
