pub mod auth;
pub mod blob_store;
pub mod config;
pub mod errors;
pub mod image_matching;
pub mod models;
pub mod repositories;
pub mod services;
pub mod state;
pub mod transport;
pub mod utils;

pub use state::AppState;
