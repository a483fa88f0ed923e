//! Record layer over the remote tables
//!
//! [`RecordStore`] is the typed CRUD surface, [`TableCache`] the shared
//! snapshot cache behind its reads, and [`BatchUpdater`] turns a
//! column-name update into a single batched write.

pub mod batch_updater;
pub mod record_store;
pub mod table_cache;

pub use batch_updater::{BatchOutcome, BatchUpdater, ColumnUpdates};
pub use record_store::RecordStore;
pub use table_cache::TableCache;
