use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::errors::{AppError, AppResult, BlobError, StoreError};

/// Transport-neutral description of a failed HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpFailure {
    pub status: Option<u16>,
    pub message: String,
    pub retryable: bool,
    /// The exchange succeeded but the body did not decode
    pub malformed: bool,
}

impl HttpFailure {
    pub fn is_not_found(&self) -> bool {
        self.status == Some(StatusCode::NOT_FOUND.as_u16())
    }

    pub fn into_store_error(self, operation: &str) -> StoreError {
        if self.malformed {
            return StoreError::malformed(operation, self.message);
        }
        StoreError::unavailable(operation, self.message, self.retryable)
    }

    pub fn into_blob_error(self, operation: &str) -> BlobError {
        BlobError::unavailable(operation, self.message, self.retryable)
    }
}

/// Whether a response status is worth retrying
pub fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
}

fn from_reqwest(err: reqwest::Error) -> HttpFailure {
    let retryable = err.is_timeout() || err.is_connect();
    HttpFailure {
        status: err.status().map(|s| s.as_u16()),
        message: err.to_string(),
        retryable,
        malformed: err.is_decode(),
    }
}

/// Bearer-authenticated JSON/bytes client for Google REST APIs
#[derive(Clone)]
pub struct GoogleApiClient {
    client: Client,
    access_token: String,
}

impl GoogleApiClient {
    /// Client with explicit total-request and connect timeouts
    pub fn new(
        access_token: impl Into<String>,
        request_timeout: Duration,
        connect_timeout: Duration,
    ) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            access_token: access_token.into(),
        })
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.client.get(url).bearer_auth(&self.access_token)
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.client.post(url).bearer_auth(&self.access_token)
    }

    pub fn put(&self, url: &str) -> RequestBuilder {
        self.client.put(url).bearer_auth(&self.access_token)
    }

    /// Send and decode a JSON response
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, HttpFailure> {
        let response = Self::send_checked(request).await?;
        response.json::<T>().await.map_err(|e| HttpFailure {
            status: None,
            message: format!("Failed to decode response body: {e}"),
            retryable: false,
            malformed: true,
        })
    }

    /// Send with a JSON body and decode a JSON response
    pub async fn send_json_body<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        body: &B,
    ) -> Result<T, HttpFailure> {
        self.send_json(request.json(body)).await
    }

    /// Send and return the raw response body
    pub async fn send_bytes(&self, request: RequestBuilder) -> Result<Vec<u8>, HttpFailure> {
        let response = Self::send_checked(request).await?;
        let bytes = response.bytes().await.map_err(from_reqwest)?;
        debug!("Fetched {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }

    async fn send_checked(request: RequestBuilder) -> Result<reqwest::Response, HttpFailure> {
        let response = request.send().await.map_err(from_reqwest)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(HttpFailure {
            status: Some(status.as_u16()),
            message: format!(
                "HTTP {} {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown"),
                body.chars().take(300).collect::<String>()
            ),
            retryable: is_retryable_status(status),
            malformed: false,
        })
    }
}
