//! Transport wrapper adding bounded retries to idempotent calls
//!
//! Reads and cell writes are safe to repeat. Appends and row deletes are
//! not: a request that timed out may still have been applied remotely, and a
//! repeat would add a duplicate row or remove the wrong one. Those pass
//! through unchanged.

use async_trait::async_trait;

use super::traits::SheetTransport;
use crate::errors::StoreResult;
use crate::models::{CellUpdate, TableId};
use crate::utils::{RetryConfig, with_retry};

/// Wrapper that adds retry functionality to any transport
pub struct RetryingTransport<T> {
    inner: T,
    retry_config: RetryConfig,
}

impl<T: SheetTransport> RetryingTransport<T> {
    pub fn new(inner: T, retry_config: RetryConfig) -> Self {
        Self {
            inner,
            retry_config,
        }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

pub trait SheetTransportRetryExt: SheetTransport + Sized {
    fn with_retries(self, retry_config: RetryConfig) -> RetryingTransport<Self> {
        RetryingTransport::new(self, retry_config)
    }
}

impl<T: SheetTransport> SheetTransportRetryExt for T {}

#[async_trait]
impl<T: SheetTransport> SheetTransport for RetryingTransport<T> {
    async fn list_rows(&self, table: &TableId) -> StoreResult<Vec<Vec<String>>> {
        with_retry(
            &self.retry_config,
            || self.inner.list_rows(table),
            "list_rows",
        )
        .await
    }

    async fn read_header(&self, table: &TableId) -> StoreResult<Vec<String>> {
        with_retry(
            &self.retry_config,
            || self.inner.read_header(table),
            "read_header",
        )
        .await
    }

    async fn append_row(&self, table: &TableId, values: Vec<String>) -> StoreResult<()> {
        self.inner.append_row(table, values).await
    }

    async fn delete_row(&self, table: &TableId, row_number: usize) -> StoreResult<()> {
        self.inner.delete_row(table, row_number).await
    }

    async fn write_cell(
        &self,
        table: &TableId,
        row: usize,
        col: usize,
        value: String,
    ) -> StoreResult<()> {
        with_retry(
            &self.retry_config,
            || self.inner.write_cell(table, row, col, value.clone()),
            "write_cell",
        )
        .await
    }

    async fn batch_write(&self, table: &TableId, updates: Vec<CellUpdate>) -> StoreResult<()> {
        with_retry(
            &self.retry_config,
            || self.inner.batch_write(table, updates.clone()),
            "batch_write",
        )
        .await
    }
}
