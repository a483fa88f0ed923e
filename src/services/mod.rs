//! Salon record services built on the record stores

pub mod customer_directory;
pub mod treatment_log;

pub use customer_directory::{CustomerDetails, CustomerDirectory};
pub use treatment_log::{PhotoUpload, TreatmentEntry, TreatmentLog};
