//! Customer directory service
//!
//! Search and detail views over the customer table, joined with the
//! treatment history.

use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::errors::{AppError, AppResult, StoreError};
use crate::models::{CustomerRecord, SheetRecord, TreatmentRecord};
use crate::repositories::{BatchOutcome, ColumnUpdates, RecordStore};

/// One customer with their visit history
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerDetails {
    pub customer: CustomerRecord,
    /// Newest first; undated treatments last, in table order
    pub treatments: Vec<TreatmentRecord>,
    pub last_visit: Option<NaiveDate>,
}

pub struct CustomerDirectory {
    customers: Arc<RecordStore<CustomerRecord>>,
    treatments: Arc<RecordStore<TreatmentRecord>>,
}

impl CustomerDirectory {
    pub fn new(
        customers: Arc<RecordStore<CustomerRecord>>,
        treatments: Arc<RecordStore<TreatmentRecord>>,
    ) -> Self {
        Self {
            customers,
            treatments,
        }
    }

    pub async fn list(&self) -> AppResult<Vec<CustomerRecord>> {
        Ok(self.customers.list().await?)
    }

    /// Customers whose name or furigana contains `query`, ignoring case.
    /// An empty query returns everyone.
    pub async fn search(&self, query: &str) -> AppResult<Vec<CustomerRecord>> {
        let needle = query.trim().to_lowercase();
        let customers = self.customers.list().await?;
        if needle.is_empty() {
            return Ok(customers);
        }
        Ok(customers
            .into_iter()
            .filter(|c| {
                c.name.to_lowercase().contains(&needle)
                    || c.furigana.to_lowercase().contains(&needle)
            })
            .collect())
    }

    pub async fn details(&self, name: &str) -> AppResult<CustomerDetails> {
        let customer = self.customers.find_by_key(name).await?.ok_or_else(|| {
            StoreError::not_found(self.customers.table().to_string(), name.trim())
        })?;

        let mut treatments: Vec<TreatmentRecord> = self
            .treatments
            .list()
            .await?
            .into_iter()
            .filter(|t| t.customer_name.trim() == customer.name.trim())
            .collect();
        // Stable: equal dates keep table order, `None` sorts after every date
        treatments.sort_by(|a, b| b.date.cmp(&a.date));
        let last_visit = treatments.iter().find_map(|t| t.date);

        Ok(CustomerDetails {
            customer,
            treatments,
            last_visit,
        })
    }

    pub async fn add(&self, customer: &CustomerRecord) -> AppResult<()> {
        if customer.key().trim().is_empty() {
            return Err(AppError::validation("Customer name must not be empty"));
        }
        self.customers.append(customer).await?;
        info!("Added customer '{}'", customer.name);
        Ok(())
    }

    pub async fn update(&self, name: &str, updates: &ColumnUpdates) -> AppResult<BatchOutcome> {
        Ok(self.customers.update_by_key(name, updates).await?)
    }

    pub async fn remove(&self, name: &str) -> AppResult<()> {
        Ok(self.customers.delete_by_key(name).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TableId;
    use crate::repositories::TableCache;
    use crate::transport::InMemorySheetTransport;
    use std::time::Duration;

    async fn directory() -> CustomerDirectory {
        let customers = TableId::new("SalonDatabase", "Customers");
        let treatments = TableId::new("SalonDatabase", "Treatments");
        let transport = InMemorySheetTransport::new()
            .with_table(
                customers.clone(),
                CustomerRecord::COLUMNS,
                &[
                    ["Sato Hanako", "サトウ ハナコ", "0311112222", "Tokyo", ""],
                    ["Suzuki Ichiro", "スズキ イチロウ", "", "", "allergy"],
                ],
            )
            .await
            .with_table(
                treatments.clone(),
                TreatmentRecord::COLUMNS,
                &[
                    ["Sato Hanako", "Cut", "2024-01-10", "", ""],
                    ["Suzuki Ichiro", "Color", "2024-02-01", "", ""],
                    ["Sato Hanako", "Perm", "2024-03-05", "", "short"],
                    ["Sato Hanako", "Trim", "", "", ""],
                ],
            )
            .await;
        let transport: Arc<InMemorySheetTransport> = Arc::new(transport);
        let cache = Arc::new(TableCache::new(4));
        let ttl = Duration::from_secs(60);
        CustomerDirectory::new(
            Arc::new(RecordStore::new(transport.clone(), customers, cache.clone(), ttl)),
            Arc::new(RecordStore::new(transport, treatments, cache, ttl)),
        )
    }

    #[tokio::test]
    async fn test_search_matches_name_or_furigana() {
        let directory = directory().await;

        let by_name = directory.search("sato").await.unwrap();
        assert_eq!(by_name.len(), 1);
        let by_furigana = directory.search("イチロウ").await.unwrap();
        assert_eq!(by_furigana[0].name, "Suzuki Ichiro");
        assert_eq!(directory.search("  ").await.unwrap().len(), 2);
        assert!(directory.search("tanaka").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_details_sorted_newest_first() {
        let directory = directory().await;

        let details = directory.details("Sato Hanako").await.unwrap();
        let texts: Vec<&str> = details.treatments.iter().map(|t| t.treatment_text.as_str()).collect();
        assert_eq!(texts, vec!["Perm", "Cut", "Trim"]);
        assert_eq!(details.last_visit, NaiveDate::from_ymd_opt(2024, 3, 5));
    }

    #[tokio::test]
    async fn test_details_unknown_customer_not_found() {
        let directory = directory().await;
        let err = directory.details("Nobody").await.unwrap_err();
        assert!(matches!(err, AppError::Store(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_add_rejects_blank_name() {
        let directory = directory().await;
        let err = directory.add(&CustomerRecord::new("  ")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
        assert_eq!(directory.list().await.unwrap().len(), 2);
    }
}
