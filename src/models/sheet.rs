//! Headered, line-numbered table primitives
//!
//! Row 1 of every remote table is the header; data rows are numbered from 2.
//! Columns are 1-based. A row number is only meaningful for the scan that
//! produced it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::errors::{StoreError, StoreResult};

/// First remote row holding data (row 1 is the header)
pub const FIRST_DATA_ROW: usize = 2;

/// Identity of one remote table: (database, worksheet)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableId {
    pub database: String,
    pub worksheet: String,
}

impl TableId {
    pub fn new(database: impl Into<String>, worksheet: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            worksheet: worksheet.into(),
        }
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.database, self.worksheet)
    }
}

/// One cell write, 1-based row and column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellUpdate {
    pub row: usize,
    pub col: usize,
    pub value: String,
}

impl CellUpdate {
    pub fn new(row: usize, col: usize, value: impl Into<String>) -> Self {
        Self {
            row,
            col,
            value: value.into(),
        }
    }
}

/// Column name -> 1-based position, first occurrence wins
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderIndex {
    positions: HashMap<String, usize>,
}

impl HeaderIndex {
    pub fn from_header(header: &[String]) -> Self {
        let mut positions = HashMap::with_capacity(header.len());
        for (i, name) in header.iter().enumerate() {
            let name = name.trim();
            if !name.is_empty() {
                positions.entry(name.to_string()).or_insert(i + 1);
            }
        }
        Self { positions }
    }

    /// 1-based column of `name`
    pub fn column(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn missing<'a>(&self, names: &[&'a str]) -> Vec<&'a str> {
        names.iter().copied().filter(|n| !self.contains(n)).collect()
    }
}

/// Full contents of a remote table as the remote reported it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetSnapshot {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetSnapshot {
    /// Split raw `listRows` output into header and data rows
    pub fn from_raw(mut raw: Vec<Vec<String>>) -> Self {
        if raw.is_empty() {
            return Self::default();
        }
        let rows = raw.split_off(1);
        let header = raw.pop().unwrap_or_default();
        Self { header, rows }
    }

    pub fn header_index(&self) -> HeaderIndex {
        HeaderIndex::from_header(&self.header)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Data rows with their transient remote row numbers
    pub fn numbered_rows(&self) -> impl Iterator<Item = (usize, &[String])> {
        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| (i + FIRST_DATA_ROW, row.as_slice()))
    }

    /// Remote row number of the first row whose `key_column` equals `key`,
    /// ignoring surrounding whitespace. A blank key matches nothing.
    pub fn find_first_row(&self, key_column: usize, key: &str) -> Option<usize> {
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        self.numbered_rows()
            .find(|(_, row)| cell(row, key_column).trim() == key)
            .map(|(number, _)| number)
    }
}

/// Cell at a 1-based column; trailing cells the remote omitted read as empty
pub fn cell(row: &[String], col: usize) -> &str {
    col.checked_sub(1)
        .and_then(|i| row.get(i))
        .map(String::as_str)
        .unwrap_or("")
}

/// Read access to one data row through the header
pub struct RowView<'a> {
    index: &'a HeaderIndex,
    row: &'a [String],
}

impl<'a> RowView<'a> {
    pub fn new(index: &'a HeaderIndex, row: &'a [String]) -> Self {
        Self { index, row }
    }

    /// Cell under `column` exactly as stored; empty when the column or cell is absent
    pub fn get(&self, column: &str) -> &'a str {
        self.index
            .column(column)
            .map(|col| cell(self.row, col))
            .unwrap_or("")
    }

    pub fn get_owned(&self, column: &str) -> String {
        self.get(column).to_string()
    }

    /// `None` for an absent or whitespace-only cell
    pub fn get_optional(&self, column: &str) -> Option<String> {
        Some(self.get(column))
            .filter(|v| !v.trim().is_empty())
            .map(str::to_string)
    }
}

/// A record type stored one-per-row in a headered remote table
pub trait SheetRecord: Clone + Send + Sync + 'static {
    /// Human readable kind for logs ("customer")
    const KIND: &'static str;
    /// Header names this record reads and writes, in canonical order
    const COLUMNS: &'static [&'static str];
    /// Column holding the record's identity
    const KEY_COLUMN: &'static str;

    fn key(&self) -> &str;

    fn from_row(row: &RowView<'_>) -> Self;

    /// (column, value) pairs in canonical column order
    fn to_cells(&self) -> Vec<(&'static str, String)>;
}

/// Decode every data row of a snapshot, failing only when the key column is missing
pub fn decode_records<R: SheetRecord>(
    table: &TableId,
    snapshot: &SheetSnapshot,
) -> StoreResult<Vec<R>> {
    let index = snapshot.header_index();
    if snapshot.header.is_empty() && snapshot.rows.is_empty() {
        return Ok(Vec::new());
    }
    if !index.contains(R::KEY_COLUMN) {
        return Err(StoreError::SchemaMismatch {
            table: table.to_string(),
            missing: vec![R::KEY_COLUMN.to_string()],
        });
    }
    let missing = index.missing(R::COLUMNS);
    if !missing.is_empty() {
        tracing::debug!(
            "{} table {} lacks column(s) {:?}; reading them as empty",
            R::KIND,
            table,
            missing
        );
    }
    Ok(snapshot
        .rows
        .iter()
        .map(|row| R::from_row(&RowView::new(&index, row)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_snapshot_splits_header() {
        let snapshot = SheetSnapshot::from_raw(vec![
            strings(&["Name", "Phone"]),
            strings(&["A", "1"]),
            strings(&["B"]),
        ]);
        assert_eq!(snapshot.header, strings(&["Name", "Phone"]));
        assert_eq!(snapshot.len(), 2);
        let numbers: Vec<usize> = snapshot.numbered_rows().map(|(n, _)| n).collect();
        assert_eq!(numbers, vec![2, 3]);
    }

    #[test]
    fn test_empty_raw_is_empty_snapshot() {
        let snapshot = SheetSnapshot::from_raw(Vec::new());
        assert!(snapshot.header.is_empty());
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_find_first_row_takes_first_duplicate() {
        let snapshot = SheetSnapshot::from_raw(vec![
            strings(&["Name"]),
            strings(&["A"]),
            strings(&["B"]),
            strings(&["B"]),
        ]);
        assert_eq!(snapshot.find_first_row(1, "B"), Some(3));
        assert_eq!(snapshot.find_first_row(1, "Z"), None);
    }

    #[test]
    fn test_blank_key_matches_no_spacer_row() {
        let snapshot = SheetSnapshot::from_raw(vec![
            strings(&["Name"]),
            strings(&["A"]),
            Vec::new(),
            strings(&["  "]),
            strings(&[" B "]),
        ]);
        assert_eq!(snapshot.find_first_row(1, ""), None);
        assert_eq!(snapshot.find_first_row(1, "   "), None);
        assert_eq!(snapshot.find_first_row(1, "B"), Some(5));
    }

    #[test]
    fn test_row_view_keeps_surrounding_whitespace() {
        let header = strings(&["Name", "Note", "PhotoUrl"]);
        let index = HeaderIndex::from_header(&header);
        let row = strings(&["A", "line one\nline two\n", "  "]);
        let view = RowView::new(&index, &row);
        assert_eq!(view.get("Note"), "line one\nline two\n");
        assert_eq!(view.get_optional("PhotoUrl"), None);
    }

    #[test]
    fn test_row_view_pads_short_rows() {
        let header = strings(&["Name", "Phone", "Note"]);
        let index = HeaderIndex::from_header(&header);
        let row = strings(&["A"]);
        let view = RowView::new(&index, &row);
        assert_eq!(view.get("Name"), "A");
        assert_eq!(view.get("Note"), "");
        assert_eq!(view.get("Unknown"), "");
        assert_eq!(view.get_optional("Phone"), None);
    }

    #[test]
    fn test_header_index_first_occurrence_wins() {
        let index = HeaderIndex::from_header(&strings(&["Name", " Memo ", "Name", ""]));
        assert_eq!(index.column("Name"), Some(1));
        assert_eq!(index.column("Memo"), Some(2));
        assert_eq!(index.missing(&["Name", "Phone"]), vec!["Phone"]);
    }
}
