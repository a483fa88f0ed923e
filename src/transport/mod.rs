//! Access to the remote headered tables
//!
//! [`SheetTransport`] is the only seam between the record layer and the
//! remote. Implementations: Google Sheets over REST, an in-process table for
//! tests and local runs, and a retrying wrapper for either.

pub mod a1;
pub mod google_sheets;
pub mod memory;
pub mod retry;
pub mod traits;

pub use google_sheets::GoogleSheetsTransport;
pub use memory::InMemorySheetTransport;
pub use retry::{RetryingTransport, SheetTransportRetryExt};
pub use traits::SheetTransport;
