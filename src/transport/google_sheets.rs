//! Google Sheets v4 transport
//!
//! A database name maps to one spreadsheet, a worksheet to one tab. Spreadsheet
//! ids come from configuration or are looked up by name through Drive and
//! memoized for the life of the transport. Values are written with `RAW`
//! input so strings such as phone numbers keep their leading zeros.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::a1::{cell_range, row_range, sheet_range};
use super::traits::SheetTransport;
use crate::config::SheetsConfig;
use crate::errors::{StoreError, StoreResult};
use crate::models::{CellUpdate, TableId};
use crate::utils::GoogleApiClient;

const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

pub struct GoogleSheetsTransport {
    client: GoogleApiClient,
    sheets_base_url: String,
    drive_base_url: String,
    configured_ids: BTreeMap<String, String>,
    resolved_ids: RwLock<HashMap<String, String>>,
    sheet_ids: RwLock<HashMap<TableId, i64>>,
}

impl GoogleSheetsTransport {
    pub fn new(client: GoogleApiClient, config: &SheetsConfig) -> Self {
        Self {
            client,
            sheets_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            drive_base_url: config.drive_api_base_url.trim_end_matches('/').to_string(),
            configured_ids: config.spreadsheet_ids.clone(),
            resolved_ids: RwLock::new(HashMap::new()),
            sheet_ids: RwLock::new(HashMap::new()),
        }
    }

    async fn spreadsheet_id(&self, database: &str, operation: &str) -> StoreResult<String> {
        if let Some(id) = self.configured_ids.get(database) {
            return Ok(id.clone());
        }
        if let Some(id) = self.resolved_ids.read().await.get(database) {
            return Ok(id.clone());
        }

        let url = format!("{}/drive/v3/files", self.drive_base_url);
        let request = self.client.get(&url).query(&[
            ("q", drive_name_query(database)),
            ("fields", "files(id,name)".to_string()),
            ("pageSize", "10".to_string()),
        ]);
        let listing: DriveFileList = self
            .client
            .send_json(request)
            .await
            .map_err(|e| e.into_store_error(operation))?;

        let id = listing
            .files
            .into_iter()
            .next()
            .map(|f| f.id)
            .ok_or_else(|| {
                StoreError::unavailable(
                    operation,
                    format!("spreadsheet '{database}' not found"),
                    false,
                )
            })?;

        info!("Resolved spreadsheet '{}' to id {}", database, id);
        self.resolved_ids
            .write()
            .await
            .insert(database.to_string(), id.clone());
        Ok(id)
    }

    /// Numeric tab id, needed for structural edits such as row deletion
    async fn sheet_id(&self, table: &TableId, spreadsheet_id: &str) -> StoreResult<i64> {
        if let Some(id) = self.sheet_ids.read().await.get(table) {
            return Ok(*id);
        }

        let url = format!("{}/v4/spreadsheets/{}", self.sheets_base_url, spreadsheet_id);
        let request = self
            .client
            .get(&url)
            .query(&[("fields", "sheets.properties(sheetId,title)")]);
        let meta: SpreadsheetMeta = self
            .client
            .send_json(request)
            .await
            .map_err(|e| e.into_store_error("delete_row"))?;

        let id = meta
            .sheets
            .into_iter()
            .find(|s| s.properties.title == table.worksheet)
            .map(|s| s.properties.sheet_id)
            .ok_or_else(|| {
                StoreError::unavailable(
                    "delete_row",
                    format!("worksheet {table} not found"),
                    false,
                )
            })?;

        self.sheet_ids.write().await.insert(table.clone(), id);
        Ok(id)
    }

    fn values_url(&self, spreadsheet_id: &str, range: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.sheets_base_url,
            spreadsheet_id,
            urlencoding::encode(range)
        )
    }

    async fn get_values(&self, table: &TableId, range: &str, operation: &str) -> StoreResult<Vec<Vec<String>>> {
        let spreadsheet_id = self.spreadsheet_id(&table.database, operation).await?;
        let request = self
            .client
            .get(&self.values_url(&spreadsheet_id, range))
            .query(&[
                ("majorDimension", "ROWS"),
                ("valueRenderOption", "FORMATTED_VALUE"),
            ]);
        let body: ValueRange = self
            .client
            .send_json(request)
            .await
            .map_err(|e| e.into_store_error(operation))?;
        Ok(body
            .values
            .into_iter()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect())
    }
}

/// Render a cell value the way it reads in the sheet
fn cell_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn drive_name_query(name: &str) -> String {
    format!(
        "name = '{}' and mimeType = '{}' and trashed = false",
        name.replace('\\', "\\\\").replace('\'', "\\'"),
        SPREADSHEET_MIME_TYPE
    )
}

fn batch_update_body(worksheet: &str, updates: &[CellUpdate]) -> Value {
    let data: Vec<Value> = updates
        .iter()
        .map(|u| {
            json!({
                "range": cell_range(worksheet, u.row, u.col),
                "majorDimension": "ROWS",
                "values": [[u.value]],
            })
        })
        .collect();
    json!({ "valueInputOption": "RAW", "data": data })
}

fn delete_row_body(sheet_id: i64, row_number: usize) -> Value {
    json!({
        "requests": [{
            "deleteDimension": {
                "range": {
                    "sheetId": sheet_id,
                    "dimension": "ROWS",
                    "startIndex": row_number - 1,
                    "endIndex": row_number,
                }
            }
        }]
    })
}

#[async_trait]
impl SheetTransport for GoogleSheetsTransport {
    async fn list_rows(&self, table: &TableId) -> StoreResult<Vec<Vec<String>>> {
        let rows = self
            .get_values(table, &sheet_range(&table.worksheet), "list_rows")
            .await?;
        debug!("Fetched {} rows from {}", rows.len(), table);
        Ok(rows)
    }

    async fn read_header(&self, table: &TableId) -> StoreResult<Vec<String>> {
        Ok(self
            .get_values(table, &row_range(&table.worksheet, 1), "read_header")
            .await?
            .into_iter()
            .next()
            .unwrap_or_default())
    }

    async fn append_row(&self, table: &TableId, values: Vec<String>) -> StoreResult<()> {
        let spreadsheet_id = self.spreadsheet_id(&table.database, "append_row").await?;
        let url = format!(
            "{}:append",
            self.values_url(&spreadsheet_id, &sheet_range(&table.worksheet))
        );
        let request = self.client.post(&url).query(&[
            ("valueInputOption", "RAW"),
            ("insertDataOption", "INSERT_ROWS"),
        ]);
        let _: Value = self
            .client
            .send_json_body(request, &json!({ "majorDimension": "ROWS", "values": [values] }))
            .await
            .map_err(|e| e.into_store_error("append_row"))?;
        debug!("Appended row to {}", table);
        Ok(())
    }

    async fn delete_row(&self, table: &TableId, row_number: usize) -> StoreResult<()> {
        if row_number == 0 {
            return Err(StoreError::unavailable(
                "delete_row",
                "row numbers start at 1",
                false,
            ));
        }
        let spreadsheet_id = self.spreadsheet_id(&table.database, "delete_row").await?;
        let sheet_id = self.sheet_id(table, &spreadsheet_id).await?;
        let url = format!(
            "{}/v4/spreadsheets/{}:batchUpdate",
            self.sheets_base_url, spreadsheet_id
        );
        let _: Value = self
            .client
            .send_json_body(self.client.post(&url), &delete_row_body(sheet_id, row_number))
            .await
            .map_err(|e| e.into_store_error("delete_row"))?;
        debug!("Deleted row {} from {}", row_number, table);
        Ok(())
    }

    async fn write_cell(
        &self,
        table: &TableId,
        row: usize,
        col: usize,
        value: String,
    ) -> StoreResult<()> {
        let spreadsheet_id = self.spreadsheet_id(&table.database, "write_cell").await?;
        let range = cell_range(&table.worksheet, row, col);
        let request = self
            .client
            .put(&self.values_url(&spreadsheet_id, &range))
            .query(&[("valueInputOption", "RAW")]);
        let _: Value = self
            .client
            .send_json_body(
                request,
                &json!({ "range": range, "majorDimension": "ROWS", "values": [[value]] }),
            )
            .await
            .map_err(|e| e.into_store_error("write_cell"))?;
        Ok(())
    }

    async fn batch_write(&self, table: &TableId, updates: Vec<CellUpdate>) -> StoreResult<()> {
        if updates.is_empty() {
            return Ok(());
        }
        let spreadsheet_id = self.spreadsheet_id(&table.database, "batch_write").await?;
        let url = format!(
            "{}/v4/spreadsheets/{}/values:batchUpdate",
            self.sheets_base_url, spreadsheet_id
        );
        let _: Value = self
            .client
            .send_json_body(
                self.client.post(&url),
                &batch_update_body(&table.worksheet, &updates),
            )
            .await
            .map_err(|e| e.into_store_error("batch_write"))?;
        debug!("Wrote {} cells to {}", updates.len(), table);
        Ok(())
    }
}
