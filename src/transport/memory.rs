//! In-process sheet transport
//!
//! Behaves like the remote table (header row, 1-based rows, rows shifting up
//! on delete) and can be told to fail specific upcoming calls.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::traits::SheetTransport;
use crate::errors::{StoreError, StoreResult};
use crate::models::{CellUpdate, FIRST_DATA_ROW, TableId};

#[derive(Default)]
struct State {
    tables: HashMap<TableId, Vec<Vec<String>>>,
    failures: VecDeque<(Option<&'static str>, StoreError)>,
    calls: HashMap<&'static str, usize>,
}

#[derive(Clone, Default)]
pub struct InMemorySheetTransport {
    state: Arc<Mutex<State>>,
}

impl InMemorySheetTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a table with a header and data rows
    pub async fn with_table<H, R, C>(self, table: TableId, header: &[H], rows: &[R]) -> Self
    where
        H: AsRef<str>,
        R: AsRef<[C]>,
        C: AsRef<str>,
    {
        let mut all = vec![header.iter().map(|h| h.as_ref().to_string()).collect()];
        all.extend(rows.iter().map(|r| {
            r.as_ref()
                .iter()
                .map(|c| c.as_ref().to_string())
                .collect()
        }));
        self.state.lock().await.tables.insert(table, all);
        self
    }

    /// Current contents, header included
    pub async fn rows(&self, table: &TableId) -> Vec<Vec<String>> {
        self.state
            .lock()
            .await
            .tables
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Make the next call of any kind fail with `error`
    pub async fn fail_next(&self, error: StoreError) {
        self.state.lock().await.failures.push_back((None, error));
    }

    /// Make the next call to `operation` (e.g. "append_row") fail with `error`
    pub async fn fail_next_on(&self, operation: &'static str, error: StoreError) {
        self.state
            .lock()
            .await
            .failures
            .push_back((Some(operation), error));
    }

    /// Number of calls made to `operation`, failed ones included
    pub async fn call_count(&self, operation: &str) -> usize {
        self.state
            .lock()
            .await
            .calls
            .get(operation)
            .copied()
            .unwrap_or(0)
    }

    fn enter(state: &mut State, operation: &'static str) -> StoreResult<()> {
        *state.calls.entry(operation).or_insert(0) += 1;
        let position = state
            .failures
            .iter()
            .position(|(op, _)| op.is_none_or(|op| op == operation));
        match position.and_then(|i| state.failures.remove(i)) {
            Some((_, error)) => Err(error),
            None => Ok(()),
        }
    }

    fn table_mut<'a>(
        state: &'a mut State,
        table: &TableId,
        operation: &str,
    ) -> StoreResult<&'a mut Vec<Vec<String>>> {
        state.tables.get_mut(table).ok_or_else(|| {
            StoreError::unavailable(operation, format!("worksheet {table} not found"), false)
        })
    }
}

fn set_cell(rows: &mut Vec<Vec<String>>, row: usize, col: usize, value: String) -> StoreResult<()> {
    if row == 0 || col == 0 {
        return Err(StoreError::unavailable(
            "write_cell",
            format!("invalid cell position ({row}, {col})"),
            false,
        ));
    }
    if rows.len() < row {
        rows.resize(row, Vec::new());
    }
    let target = &mut rows[row - 1];
    if target.len() < col {
        target.resize(col, String::new());
    }
    target[col - 1] = value;
    Ok(())
}

#[async_trait]
impl SheetTransport for InMemorySheetTransport {
    async fn list_rows(&self, table: &TableId) -> StoreResult<Vec<Vec<String>>> {
        let mut state = self.state.lock().await;
        Self::enter(&mut state, "list_rows")?;
        Ok(Self::table_mut(&mut state, table, "list_rows")?.clone())
    }

    async fn read_header(&self, table: &TableId) -> StoreResult<Vec<String>> {
        let mut state = self.state.lock().await;
        Self::enter(&mut state, "read_header")?;
        Ok(Self::table_mut(&mut state, table, "read_header")?
            .first()
            .cloned()
            .unwrap_or_default())
    }

    async fn append_row(&self, table: &TableId, values: Vec<String>) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        Self::enter(&mut state, "append_row")?;
        Self::table_mut(&mut state, table, "append_row")?.push(values);
        Ok(())
    }

    async fn delete_row(&self, table: &TableId, row_number: usize) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        Self::enter(&mut state, "delete_row")?;
        let rows = Self::table_mut(&mut state, table, "delete_row")?;
        if row_number < FIRST_DATA_ROW || row_number > rows.len() {
            return Err(StoreError::unavailable(
                "delete_row",
                format!("row {row_number} out of range for {table}"),
                false,
            ));
        }
        rows.remove(row_number - 1);
        Ok(())
    }

    async fn write_cell(
        &self,
        table: &TableId,
        row: usize,
        col: usize,
        value: String,
    ) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        Self::enter(&mut state, "write_cell")?;
        set_cell(Self::table_mut(&mut state, table, "write_cell")?, row, col, value)
    }

    async fn batch_write(&self, table: &TableId, updates: Vec<CellUpdate>) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        Self::enter(&mut state, "batch_write")?;
        let rows = Self::table_mut(&mut state, table, "batch_write")?;
        // Validate first so a bad position leaves the table untouched
        if let Some(bad) = updates.iter().find(|u| u.row == 0 || u.col == 0) {
            return Err(StoreError::unavailable(
                "batch_write",
                format!("invalid cell position ({}, {})", bad.row, bad.col),
                false,
            ));
        }
        for update in updates {
            set_cell(rows, update.row, update.col, update.value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TableId {
        TableId::new("SalonDatabase", "Customers")
    }

    async fn seeded() -> InMemorySheetTransport {
        InMemorySheetTransport::new()
            .with_table(table(), &["Name", "Phone"], &[["A", "1"], ["B", "2"], ["C", "3"]])
            .await
    }

    #[tokio::test]
    async fn test_delete_shifts_rows_up() {
        let transport = seeded().await;
        transport.delete_row(&table(), 3).await.unwrap();
        let rows = transport.rows(&table()).await;
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2][0], "C");
    }

    #[tokio::test]
    async fn test_header_row_cannot_be_deleted() {
        let transport = seeded().await;
        assert!(transport.delete_row(&table(), 1).await.is_err());
        assert!(transport.delete_row(&table(), 9).await.is_err());
    }

    #[tokio::test]
    async fn test_write_cell_extends_short_rows() {
        let transport = InMemorySheetTransport::new()
            .with_table(table(), &["Name", "Phone", "Note"], &[["A"]])
            .await;
        transport
            .write_cell(&table(), 2, 3, "vip".to_string())
            .await
            .unwrap();
        assert_eq!(transport.rows(&table()).await[1], vec!["A", "", "vip"]);
    }

    #[tokio::test]
    async fn test_injected_failure_targets_operation() {
        let transport = seeded().await;
        transport
            .fail_next_on("append_row", StoreError::unavailable("append_row", "503", true))
            .await;

        assert!(transport.list_rows(&table()).await.is_ok());
        assert!(transport.append_row(&table(), vec![]).await.is_err());
        assert!(transport.append_row(&table(), vec!["D".into()]).await.is_ok());
        assert_eq!(transport.call_count("append_row").await, 2);
    }

    #[tokio::test]
    async fn test_untargeted_failure_hits_next_call() {
        let transport = seeded().await;
        transport
            .fail_next(StoreError::unavailable("remote", "timeout", true))
            .await;

        assert!(transport.read_header(&table()).await.is_err());
        assert!(transport.list_rows(&table()).await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_table_is_terminal_error() {
        let transport = InMemorySheetTransport::new();
        let err = transport.list_rows(&table()).await.unwrap_err();
        assert!(matches!(err, StoreError::RemoteUnavailable { retryable: false, .. }));
    }
}
