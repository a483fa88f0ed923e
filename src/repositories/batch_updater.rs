//! Multi-column row updates as one remote write
//!
//! Column names are resolved against the live header. Names the header does
//! not know are skipped with a warning and the rest is still written, so a
//! logical update is either one batched write or nothing at all.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::errors::StoreResult;
use crate::models::{CellUpdate, HeaderIndex, TableId};
use crate::transport::SheetTransport;

/// Column name -> new value for one row
pub type ColumnUpdates = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    /// One batched write was issued
    Applied {
        cells: usize,
        /// Column names that did not resolve and were left alone
        skipped: Vec<String>,
    },
    /// Empty update; nothing was sent
    NothingToWrite,
    /// No column resolved; nothing was sent
    Unresolved { skipped: Vec<String> },
}

impl BatchOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    pub fn skipped(&self) -> &[String] {
        match self {
            Self::Applied { skipped, .. } | Self::Unresolved { skipped } => skipped,
            Self::NothingToWrite => &[],
        }
    }
}

#[derive(Clone)]
pub struct BatchUpdater {
    transport: Arc<dyn SheetTransport>,
}

impl BatchUpdater {
    pub fn new(transport: Arc<dyn SheetTransport>) -> Self {
        Self { transport }
    }

    /// Fetch the header, then write `updates` into `row`
    pub async fn apply(
        &self,
        table: &TableId,
        row: usize,
        updates: &ColumnUpdates,
    ) -> StoreResult<BatchOutcome> {
        if updates.is_empty() {
            return Ok(BatchOutcome::NothingToWrite);
        }
        let header = self.transport.read_header(table).await?;
        self.apply_with_header(table, row, &header, updates).await
    }

    /// Write `updates` into `row` using a header the caller fetched in the same call
    pub async fn apply_with_header(
        &self,
        table: &TableId,
        row: usize,
        header: &[String],
        updates: &ColumnUpdates,
    ) -> StoreResult<BatchOutcome> {
        if updates.is_empty() {
            return Ok(BatchOutcome::NothingToWrite);
        }

        let (cells, skipped) = resolve(&HeaderIndex::from_header(header), row, updates);
        if !skipped.is_empty() {
            warn!(
                "Skipping unknown column(s) {:?} while updating {} row {}",
                skipped, table, row
            );
        }
        if cells.is_empty() {
            return Ok(BatchOutcome::Unresolved { skipped });
        }

        let count = cells.len();
        self.transport.batch_write(table, cells).await?;
        debug!("Updated {} cell(s) in {} row {}", count, table, row);
        Ok(BatchOutcome::Applied {
            cells: count,
            skipped,
        })
    }
}

fn resolve(index: &HeaderIndex, row: usize, updates: &ColumnUpdates) -> (Vec<CellUpdate>, Vec<String>) {
    let mut cells = Vec::with_capacity(updates.len());
    let mut skipped = Vec::new();
    for (column, value) in updates {
        match index.column(column.trim()) {
            Some(col) => cells.push(CellUpdate::new(row, col, value.clone())),
            None => skipped.push(column.clone()),
        }
    }
    (cells, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::InMemorySheetTransport;
    use tracing_test::traced_test;

    fn table() -> TableId {
        TableId::new("SalonDatabase", "Customers")
    }

    fn updates(pairs: &[(&str, &str)]) -> ColumnUpdates {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    async fn setup() -> (InMemorySheetTransport, BatchUpdater) {
        let transport = InMemorySheetTransport::new()
            .with_table(
                table(),
                &["Name", "Furigana", "Phone"],
                &[["A", "エー", "1"], ["B", "ビー", "2"]],
            )
            .await;
        let updater = BatchUpdater::new(Arc::new(transport.clone()));
        (transport, updater)
    }

    #[tokio::test]
    async fn test_resolved_columns_written_in_one_call() {
        let (transport, updater) = setup().await;

        let outcome = updater
            .apply(&table(), 3, &updates(&[("Phone", "0312"), ("Furigana", "ビイ")]))
            .await
            .unwrap();

        assert_eq!(outcome, BatchOutcome::Applied { cells: 2, skipped: vec![] });
        assert_eq!(transport.call_count("batch_write").await, 1);
        assert_eq!(transport.rows(&table()).await[2], vec!["B", "ビイ", "0312"]);
        assert_eq!(transport.rows(&table()).await[1], vec!["A", "エー", "1"]);
    }

    #[traced_test]
    #[tokio::test]
    async fn test_unknown_columns_skipped_with_warning() {
        let (transport, updater) = setup().await;

        let outcome = updater
            .apply(&table(), 2, &updates(&[("Phone", "9"), ("Nickname", "x")]))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            BatchOutcome::Applied { cells: 1, skipped: vec!["Nickname".to_string()] }
        );
        assert_eq!(transport.rows(&table()).await[1][2], "9");
        assert!(logs_contain("Skipping unknown column"));
    }

    #[tokio::test]
    async fn test_no_resolved_column_sends_nothing() {
        let (transport, updater) = setup().await;

        let outcome = updater
            .apply(&table(), 2, &updates(&[("Nickname", "x")]))
            .await
            .unwrap();

        assert!(!outcome.is_applied());
        assert_eq!(outcome.skipped(), ["Nickname".to_string()]);
        assert_eq!(transport.call_count("batch_write").await, 0);
    }

    #[tokio::test]
    async fn test_empty_update_skips_header_fetch() {
        let (transport, updater) = setup().await;

        let outcome = updater.apply(&table(), 2, &ColumnUpdates::new()).await.unwrap();

        assert_eq!(outcome, BatchOutcome::NothingToWrite);
        assert_eq!(transport.call_count("read_header").await, 0);
    }

    #[tokio::test]
    async fn test_failed_write_surfaces_error() {
        let (transport, updater) = setup().await;
        transport
            .fail_next_on(
                "batch_write",
                crate::errors::StoreError::unavailable("batch_write", "HTTP 500", true),
            )
            .await;

        let result = updater.apply(&table(), 2, &updates(&[("Phone", "9")])).await;
        assert!(result.is_err());
        assert_eq!(transport.rows(&table()).await[1][2], "1");
    }
}
