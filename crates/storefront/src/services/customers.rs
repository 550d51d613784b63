//! Customer resolution for checkout.
//!
//! Customers are keyed by email. A returning customer's contact details are
//! overwritten with whatever the latest order carried.

use tracing::{info, instrument, warn};

use cravely_core::{CountryId, CountryStateId, Email};

use crate::db::RepositoryError;
use crate::models::{ContactUpdate, Customer, NewCustomer};
use crate::store::CustomerDirectory;

/// Contact details taken from a checkout submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactDetails {
    pub name: String,
    pub email: Email,
    pub phone: String,
    pub street: String,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
}

/// Finds or creates customer records.
pub struct CustomerResolver<'a> {
    directory: &'a dyn CustomerDirectory,
}

impl<'a> CustomerResolver<'a> {
    #[must_use]
    pub const fn new(directory: &'a dyn CustomerDirectory) -> Self {
        Self { directory }
    }

    /// Resolve the customer for `contact`, creating one if needed.
    ///
    /// Country and state are only looked up for new customers. A failed
    /// lookup leaves the field empty rather than failing the checkout.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if finding, updating or creating the
    /// customer fails.
    #[instrument(skip_all, fields(email = %contact.email))]
    pub async fn resolve_or_create_customer(
        &self,
        contact: &ContactDetails,
    ) -> Result<Customer, RepositoryError> {
        if let Some(existing) = self.directory.find_by_email(&contact.email).await? {
            let updated = self
                .directory
                .update_contact(
                    existing.id,
                    ContactUpdate {
                        name: contact.name.clone(),
                        phone: contact.phone.clone(),
                        street: contact.street.clone(),
                        zip: contact.zip.clone(),
                        city: contact.city.clone(),
                    },
                )
                .await?;
            info!(customer_id = %updated.id, "Updated returning customer");
            return Ok(updated);
        }

        let country_id = self.lookup_country(contact.country.as_deref()).await;
        let state_id = self
            .lookup_state(country_id, contact.state.as_deref())
            .await;

        let created = self
            .directory
            .create(NewCustomer {
                name: contact.name.clone(),
                email: contact.email.clone(),
                phone: contact.phone.clone(),
                street: contact.street.clone(),
                city: contact.city.clone(),
                zip: contact.zip.clone(),
                country_id,
                state_id,
                customer_rank: 1,
            })
            .await?;
        info!(customer_id = %created.id, "Created customer");
        Ok(created)
    }

    async fn lookup_country(&self, name: Option<&str>) -> Option<CountryId> {
        let name = name.map(str::trim).filter(|n| !n.is_empty())?;
        match self.directory.find_country(name).await {
            Ok(Some(country)) => Some(country.id),
            Ok(None) => {
                warn!(country = %name, "Country not found, leaving it empty");
                None
            }
            Err(e) => {
                warn!(country = %name, error = %e, "Country lookup failed, leaving it empty");
                None
            }
        }
    }

    async fn lookup_state(
        &self,
        country_id: Option<CountryId>,
        name: Option<&str>,
    ) -> Option<CountryStateId> {
        let name = name.map(str::trim).filter(|n| !n.is_empty())?;
        match self.directory.find_state(country_id, name).await {
            Ok(Some(state)) => Some(state.id),
            Ok(None) => {
                warn!(state = %name, "State not found, leaving it empty");
                None
            }
            Err(e) => {
                warn!(state = %name, error = %e, "State lookup failed, leaving it empty");
                None
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn contact(email: &str, phone: &str) -> ContactDetails {
        ContactDetails {
            name: "Bilal Khan".to_owned(),
            email: Email::parse(email).unwrap(),
            phone: phone.to_owned(),
            street: "12 Canal View".to_owned(),
            city: Some("Lahore".to_owned()),
            zip: Some("54000".to_owned()),
            country: Some("pakistan".to_owned()),
            state: Some("PUNJAB".to_owned()),
        }
    }

    #[tokio::test]
    async fn test_new_customer_gets_location_and_rank() {
        let store = MemoryStore::new();
        let pakistan = store.insert_country("Pakistan", Some("PK"));
        let punjab = store.insert_state(pakistan.id, "Punjab", None);
        let resolver = CustomerResolver::new(&store);

        let customer = resolver
            .resolve_or_create_customer(&contact("bilal@example.com", "0300"))
            .await
            .unwrap();
        assert_eq!(customer.country_id, Some(pakistan.id));
        assert_eq!(customer.state_id, Some(punjab.id));
        assert_eq!(customer.customer_rank, 1);
    }

    #[tokio::test]
    async fn test_unknown_location_is_left_empty() {
        let store = MemoryStore::new();
        let resolver = CustomerResolver::new(&store);

        let customer = resolver
            .resolve_or_create_customer(&contact("bilal@example.com", "0300"))
            .await
            .unwrap();
        assert!(customer.country_id.is_none());
        assert!(customer.state_id.is_none());
    }

    #[tokio::test]
    async fn test_returning_customer_is_overwritten() {
        let store = MemoryStore::new();
        let resolver = CustomerResolver::new(&store);

        let first = resolver
            .resolve_or_create_customer(&contact("bilal@example.com", "0300-1111111"))
            .await
            .unwrap();
        let mut second_contact = contact("bilal@example.com", "0300-2222222");
        second_contact.city = None;
        let second = resolver
            .resolve_or_create_customer(&second_contact)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.phone, "0300-2222222");
        assert_eq!(second.city.as_deref(), Some("Lahore"));
        assert_eq!(store.customers().len(), 1);
    }
}
