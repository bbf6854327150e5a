//! Client for the token validation service.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::TokenMethod;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("auth service unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),
    #[error("auth service error {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("invalid auth service response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait TokenValidator: Send + Sync {
    /// Whether the service allows this token.
    async fn validate_token(&self, token: &str) -> Result<bool, AuthError>;
}

#[derive(Clone)]
pub struct AuthClient {
    http: Client,
    endpoint: Url,
    method: TokenMethod,
}

impl fmt::Debug for AuthClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthClient")
            .field("endpoint", &self.endpoint)
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}

impl AuthClient {
    pub fn new(endpoint: Url, method: TokenMethod, timeout: Duration) -> Result<Self, AuthError> {
        let http = Client::builder()
            .user_agent(concat!("batch-admin/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(AuthError::Unreachable)?;
        Ok(Self {
            http,
            endpoint,
            method,
        })
    }

    pub fn build_request(&self, token: &str) -> Result<reqwest::Request, AuthError> {
        let builder = match self.method {
            TokenMethod::Post => self
                .http
                .post(self.endpoint.clone())
                .header("Content-Type", "application/json")
                .json(&json!({ "token": token })),
            TokenMethod::Get => self
                .http
                .get(self.endpoint.clone())
                .query(&[("token", token)]),
        };
        builder
            .header("Accept", "application/json")
            .build()
            .map_err(|err| AuthError::Decode(err.to_string()))
    }

    pub async fn validate_token(&self, token: &str) -> Result<bool, AuthError> {
        let request = self.build_request(token)?;
        debug!(url=%request.url().path(), method=?self.method, "validating access token");
        let res = self
            .http
            .execute(request)
            .await
            .map_err(AuthError::Unreachable)?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(AuthError::Status { status, body });
        }

        let body = res.bytes().await.map_err(AuthError::Unreachable)?;
        let payload: Value =
            serde_json::from_slice(&body).map_err(|err| AuthError::Decode(err.to_string()))?;
        Ok(is_truthy(&payload))
    }
}

#[async_trait]
impl TokenValidator for AuthClient {
    async fn validate_token(&self, token: &str) -> Result<bool, AuthError> {
        AuthClient::validate_token(self, token).await
    }
}

/// Allow/deny reading of a validation payload: a boolean, or an identity
/// object. `false`, `null`, zero and the empty string deny.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
