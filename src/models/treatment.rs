use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::sheet::{RowView, SheetRecord};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One visit. `customer_name` is a soft reference into the customer table;
/// nothing stops it from pointing at a deleted customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreatmentRecord {
    pub customer_name: String,
    pub treatment_text: String,
    /// `None` when the cell is empty or not `YYYY-MM-DD`
    pub date: Option<NaiveDate>,
    pub photo_url: Option<String>,
    pub memo: String,
}

impl TreatmentRecord {
    pub const CUSTOMER_NAME: &'static str = "CustomerName";
    pub const TREATMENT_TEXT: &'static str = "TreatmentText";
    pub const DATE: &'static str = "Date";
    pub const PHOTO_URL: &'static str = "PhotoUrl";
    pub const MEMO: &'static str = "Memo";

    pub fn new(
        customer_name: impl Into<String>,
        treatment_text: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            customer_name: customer_name.into(),
            treatment_text: treatment_text.into(),
            date: Some(date),
            photo_url: None,
            memo: String::new(),
        }
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }

    pub fn with_photo_url(mut self, url: impl Into<String>) -> Self {
        self.photo_url = Some(url.into());
        self
    }

    pub fn date_string(&self) -> String {
        format_date(self.date)
    }
}

pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(value, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(e) => {
            debug!("Ignoring unparseable treatment date '{}': {}", value, e);
            None
        }
    }
}

impl SheetRecord for TreatmentRecord {
    const KIND: &'static str = "treatment";
    const COLUMNS: &'static [&'static str] = &[
        Self::CUSTOMER_NAME,
        Self::TREATMENT_TEXT,
        Self::DATE,
        Self::PHOTO_URL,
        Self::MEMO,
    ];
    const KEY_COLUMN: &'static str = Self::CUSTOMER_NAME;

    fn key(&self) -> &str {
        &self.customer_name
    }

    fn from_row(row: &RowView<'_>) -> Self {
        Self {
            customer_name: row.get_owned(Self::CUSTOMER_NAME),
            treatment_text: row.get_owned(Self::TREATMENT_TEXT),
            date: parse_date(row.get(Self::DATE)),
            photo_url: row.get_optional(Self::PHOTO_URL),
            memo: row.get_owned(Self::MEMO),
        }
    }

    fn to_cells(&self) -> Vec<(&'static str, String)> {
        vec![
            (Self::CUSTOMER_NAME, self.customer_name.clone()),
            (Self::TREATMENT_TEXT, self.treatment_text.clone()),
            (Self::DATE, self.date_string()),
            (Self::PHOTO_URL, self.photo_url.clone().unwrap_or_default()),
            (Self::MEMO, self.memo.clone()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sheet::HeaderIndex;

    #[test]
    fn test_bad_date_reads_as_none() {
        let header: Vec<String> = TreatmentRecord::COLUMNS.iter().map(|c| c.to_string()).collect();
        let index = HeaderIndex::from_header(&header);
        let row: Vec<String> = vec!["A".into(), "Cut".into(), "2024/13/01".into()];
        let record = TreatmentRecord::from_row(&RowView::new(&index, &row));
        assert_eq!(record.date, None);
        assert_eq!(record.photo_url, None);
        assert_eq!(record.memo, "");
    }

    #[test]
    fn test_cells_use_iso_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let record = TreatmentRecord::new("A", "Color", date).with_memo("ash");
        let cells = record.to_cells();
        assert_eq!(cells[2], (TreatmentRecord::DATE, "2024-03-09".to_string()));
        assert_eq!(cells[3], (TreatmentRecord::PHOTO_URL, String::new()));
    }
}
