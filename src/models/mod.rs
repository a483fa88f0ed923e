//! Record types and table primitives

pub mod credential;
pub mod customer;
pub mod sheet;
pub mod treatment;

pub use credential::CredentialRecord;
pub use customer::CustomerRecord;
pub use sheet::{
    CellUpdate, FIRST_DATA_ROW, HeaderIndex, RowView, SheetRecord, SheetSnapshot, TableId,
};
pub use treatment::TreatmentRecord;
