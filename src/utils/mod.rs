pub mod http_client;
pub mod jitter;
pub mod retry;

pub use http_client::{GoogleApiClient, HttpFailure};
pub use retry::{RetryConfig, RetryableError, with_retry};
