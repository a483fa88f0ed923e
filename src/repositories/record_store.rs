//! Typed CRUD over one headered remote table
//!
//! Reads go through the shared [`TableCache`]. Every mutation rescans the
//! remote first, acts on the first row whose key column matches, then drops
//! the cached snapshot. Row numbers never outlive the call that found them.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::batch_updater::{BatchOutcome, BatchUpdater, ColumnUpdates};
use super::table_cache::TableCache;
use crate::errors::{StoreError, StoreResult};
use crate::models::sheet::decode_records;
use crate::models::{HeaderIndex, SheetRecord, SheetSnapshot, TableId};
use crate::transport::SheetTransport;

pub struct RecordStore<R: SheetRecord> {
    transport: Arc<dyn SheetTransport>,
    table: TableId,
    cache: Arc<TableCache>,
    ttl: Duration,
    batch: BatchUpdater,
    _record: PhantomData<fn() -> R>,
}

impl<R: SheetRecord> RecordStore<R> {
    pub fn new(
        transport: Arc<dyn SheetTransport>,
        table: TableId,
        cache: Arc<TableCache>,
        ttl: Duration,
    ) -> Self {
        Self {
            batch: BatchUpdater::new(transport.clone()),
            transport,
            table,
            cache,
            ttl,
            _record: PhantomData,
        }
    }

    pub fn table(&self) -> &TableId {
        &self.table
    }

    /// Cached snapshot of the whole table
    pub async fn snapshot(&self) -> StoreResult<Arc<SheetSnapshot>> {
        self.cache
            .get_or_fetch(&self.table, self.ttl, || self.fetch_fresh())
            .await
    }

    /// Every record in remote row order
    pub async fn list(&self) -> StoreResult<Vec<R>> {
        let snapshot = self.snapshot().await?;
        decode_records(&self.table, &snapshot)
    }

    /// First record whose key equals `key`, from the cached view
    pub async fn find_by_key(&self, key: &str) -> StoreResult<Option<R>> {
        let key = key.trim();
        if key.is_empty() {
            return Ok(None);
        }
        Ok(self.list().await?.into_iter().find(|r| r.key().trim() == key))
    }

    /// Write `record` as a new last row, laid out by the live header
    pub async fn append(&self, record: &R) -> StoreResult<()> {
        let header = self.transport.read_header(&self.table).await?;
        let index = HeaderIndex::from_header(&header);
        if !index.contains(R::KEY_COLUMN) {
            return Err(StoreError::SchemaMismatch {
                table: self.table.to_string(),
                missing: vec![R::KEY_COLUMN.to_string()],
            });
        }

        let mut row = vec![String::new(); header.len()];
        let mut skipped = Vec::new();
        for (column, value) in record.to_cells() {
            match index.column(column) {
                Some(col) => row[col - 1] = value,
                None => skipped.push(column),
            }
        }
        if !skipped.is_empty() {
            warn!(
                "{} table {} has no column(s) {:?}; appending without them",
                R::KIND,
                self.table,
                skipped
            );
        }
        while row.last().is_some_and(String::is_empty) {
            row.pop();
        }

        let result = self.transport.append_row(&self.table, row).await;
        self.cache.invalidate(&self.table).await;
        result?;
        info!("Appended {} '{}' to {}", R::KIND, record.key(), self.table);
        Ok(())
    }

    /// Rewrite the given columns of the first record keyed `key`
    pub async fn update_by_key(
        &self,
        key: &str,
        updates: &ColumnUpdates,
    ) -> StoreResult<BatchOutcome> {
        self.require_key(key)?;
        let snapshot = self.fetch_fresh().await?;
        let row = self.locate(&snapshot, key)?;

        let result = self
            .batch
            .apply_with_header(&self.table, row, &snapshot.header, updates)
            .await;
        self.cache.invalidate(&self.table).await;
        let outcome = result?;

        match &outcome {
            BatchOutcome::Applied { cells, .. } => info!(
                "Updated {} '{}' in {} ({} cell(s))",
                R::KIND,
                key,
                self.table,
                cells
            ),
            other => debug!("No cells written for {} '{}': {:?}", R::KIND, key, other),
        }
        Ok(outcome)
    }

    /// Single-column form of [`Self::update_by_key`]
    pub async fn update_cell(
        &self,
        key: &str,
        column: &str,
        value: impl Into<String>,
    ) -> StoreResult<BatchOutcome> {
        let mut updates = ColumnUpdates::new();
        updates.insert(column.to_string(), value.into());
        self.update_by_key(key, &updates).await
    }

    /// Remove the first record keyed `key`; later duplicates stay
    pub async fn delete_by_key(&self, key: &str) -> StoreResult<()> {
        self.require_key(key)?;
        let snapshot = self.fetch_fresh().await?;
        let row = self.locate(&snapshot, key)?;

        let result = self.transport.delete_row(&self.table, row).await;
        self.cache.invalidate(&self.table).await;
        result?;
        info!("Deleted {} '{}' from {} (row {})", R::KIND, key, self.table, row);
        Ok(())
    }

    /// Drop this table's cached snapshot
    pub async fn invalidate(&self) {
        self.cache.invalidate(&self.table).await;
    }

    async fn fetch_fresh(&self) -> StoreResult<SheetSnapshot> {
        let raw = self.transport.list_rows(&self.table).await?;
        Ok(SheetSnapshot::from_raw(raw))
    }

    /// A blank key would otherwise select a blank spacer row
    fn require_key(&self, key: &str) -> StoreResult<()> {
        if key.trim().is_empty() {
            return Err(StoreError::not_found(self.table.to_string(), key));
        }
        Ok(())
    }

    /// Row number of the first match in a scan taken by this same call
    fn locate(&self, snapshot: &SheetSnapshot, key: &str) -> StoreResult<usize> {
        let key_col = snapshot
            .header_index()
            .column(R::KEY_COLUMN)
            .ok_or_else(|| StoreError::SchemaMismatch {
                table: self.table.to_string(),
                missing: vec![R::KEY_COLUMN.to_string()],
            })?;
        snapshot
            .find_first_row(key_col, key.trim())
            .ok_or_else(|| StoreError::not_found(self.table.to_string(), key))
    }
}
