//! Login by password digest or by face image similarity

pub mod gate;
pub mod password;

pub use gate::{AuthGate, AuthOutcome, Identity};
pub use password::{hash_password, verify_password};
