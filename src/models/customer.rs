use serde::{Deserialize, Serialize};

use super::sheet::{RowView, SheetRecord};

/// A salon customer. `name` is the intended key, but uniqueness is not
/// enforced by the remote table; duplicates resolve to the first row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub name: String,
    pub furigana: String,
    pub phone: String,
    pub address: String,
    pub note: String,
}

impl CustomerRecord {
    pub const NAME: &'static str = "Name";
    pub const FURIGANA: &'static str = "Furigana";
    pub const PHONE: &'static str = "Phone";
    pub const ADDRESS: &'static str = "Address";
    pub const NOTE: &'static str = "Note";

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_furigana(mut self, furigana: impl Into<String>) -> Self {
        self.furigana = furigana.into();
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = phone.into();
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }
}

impl SheetRecord for CustomerRecord {
    const KIND: &'static str = "customer";
    const COLUMNS: &'static [&'static str] = &[
        Self::NAME,
        Self::FURIGANA,
        Self::PHONE,
        Self::ADDRESS,
        Self::NOTE,
    ];
    const KEY_COLUMN: &'static str = Self::NAME;

    fn key(&self) -> &str {
        &self.name
    }

    fn from_row(row: &RowView<'_>) -> Self {
        Self {
            name: row.get_owned(Self::NAME),
            furigana: row.get_owned(Self::FURIGANA),
            phone: row.get_owned(Self::PHONE),
            address: row.get_owned(Self::ADDRESS),
            note: row.get_owned(Self::NOTE),
        }
    }

    fn to_cells(&self) -> Vec<(&'static str, String)> {
        vec![
            (Self::NAME, self.name.clone()),
            (Self::FURIGANA, self.furigana.clone()),
            (Self::PHONE, self.phone.clone()),
            (Self::ADDRESS, self.address.clone()),
            (Self::NOTE, self.note.clone()),
        ]
    }
}
