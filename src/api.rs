use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode, Url};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Endpoints;
use crate::model::{BatchDraft, BatchRecord};

const USER_AGENT: &str = concat!("batch-admin/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to reach batch API: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("batch API error {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("invalid batch API response: {0}")]
    Decode(String),
}

/// CRUD operations on batch records.
#[async_trait]
pub trait BatchApi: Send + Sync {
    /// Raw list payload; typed by the caller with `schema::validate_list`.
    async fn list(&self) -> Result<Value, ApiError>;

    async fn create(&self, record: &BatchRecord) -> Result<BatchRecord, ApiError>;

    async fn update(&self, id: i64, record: &BatchRecord) -> Result<BatchRecord, ApiError>;

    async fn delete(&self, id: i64) -> Result<(), ApiError>;
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    endpoints: Endpoints,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("collection", &self.endpoints.collection)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(endpoints: Endpoints, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { http, endpoints })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn build_request(
        &self,
        method: Method,
        url: Url,
        body: Option<&BatchDraft>,
    ) -> Result<reqwest::Request, ApiError> {
        let mut builder = self
            .http
            .request(method, url)
            .header("Accept", "application/json");
        if let Some(body) = body {
            builder = builder
                .header("Content-Type", "application/json")
                .json(body);
        }
        Ok(builder.build()?)
    }

    async fn execute(&self, request: reqwest::Request) -> Result<Vec<u8>, ApiError> {
        debug!(method=%request.method(), url=%request.url(), "sending batch API request");
        let res = self.http.execute(request).await?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            warn!(%status, %body, "batch API returned an error");
            return Err(ApiError::Status { status, body });
        }
        Ok(res.bytes().await?.to_vec())
    }

    /// Decode a saved record; an empty body echoes what was sent.
    fn decode_saved(body: &[u8], sent: &BatchRecord) -> Result<BatchRecord, ApiError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(sent.clone());
        }
        serde_json::from_slice(body).map_err(|err| ApiError::Decode(err.to_string()))
    }

    pub async fn list(&self) -> Result<Value, ApiError> {
        let request = self.build_request(Method::GET, self.endpoints.collection.clone(), None)?;
        let body = self.execute(request).await?;
        serde_json::from_slice(&body).map_err(|err| ApiError::Decode(err.to_string()))
    }

    pub async fn create(&self, record: &BatchRecord) -> Result<BatchRecord, ApiError> {
        let draft = record.draft();
        let request = self.build_request(
            Method::POST,
            self.endpoints.collection.clone(),
            Some(&draft),
        )?;
        let body = self.execute(request).await?;
        let sent = BatchRecord { id: None, ..record.clone() };
        Self::decode_saved(&body, &sent)
    }

    pub async fn update(&self, id: i64, record: &BatchRecord) -> Result<BatchRecord, ApiError> {
        let draft = record.draft();
        let request = self.build_request(Method::PUT, self.endpoints.item(id), Some(&draft))?;
        let body = self.execute(request).await?;
        let sent = BatchRecord { id: Some(id), ..record.clone() };
        Self::decode_saved(&body, &sent)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        let request = self.build_request(Method::DELETE, self.endpoints.item(id), None)?;
        self.execute(request).await?;
        Ok(())
    }
}

#[async_trait]
impl BatchApi for ApiClient {
    async fn list(&self) -> Result<Value, ApiError> {
        ApiClient::list(self).await
    }

    async fn create(&self, record: &BatchRecord) -> Result<BatchRecord, ApiError> {
        ApiClient::create(self, record).await
    }

    async fn update(&self, id: i64, record: &BatchRecord) -> Result<BatchRecord, ApiError> {
        ApiClient::update(self, id, record).await
    }

    async fn delete(&self, id: i64) -> Result<(), ApiError> {
        ApiClient::delete(self, id).await
    }
}
