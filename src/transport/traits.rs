//! Remote tabular store boundary
//!
//! The remote is a headered, line-numbered table with no transactions.
//! Row 1 is the header, data rows start at row 2, columns are 1-based.
//! Nothing here caches row numbers; callers rescan before every mutation.

use async_trait::async_trait;

use crate::errors::StoreResult;
use crate::models::{CellUpdate, TableId};

#[async_trait]
pub trait SheetTransport: Send + Sync {
    /// Every row of the table, header included, in remote order
    async fn list_rows(&self, table: &TableId) -> StoreResult<Vec<Vec<String>>>;

    /// Header row only
    async fn read_header(&self, table: &TableId) -> StoreResult<Vec<String>> {
        Ok(self
            .list_rows(table)
            .await?
            .into_iter()
            .next()
            .unwrap_or_default())
    }

    /// Write one new row after the last populated row
    async fn append_row(&self, table: &TableId, values: Vec<String>) -> StoreResult<()>;

    /// Remove one row; every following row shifts up by one
    async fn delete_row(&self, table: &TableId, row_number: usize) -> StoreResult<()>;

    async fn write_cell(
        &self,
        table: &TableId,
        row: usize,
        col: usize,
        value: String,
    ) -> StoreResult<()>;

    /// Apply many cell writes in a single remote call
    async fn batch_write(&self, table: &TableId, updates: Vec<CellUpdate>) -> StoreResult<()>;
}
