#![allow(dead_code)]

use async_trait::async_trait;
use batch_admin::api::{ApiError, BatchApi};
use batch_admin::auth::{AuthError, TokenValidator};
use batch_admin::model::BatchRecord;
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List,
    Create(BatchRecord),
    Update(i64, BatchRecord),
    Delete(i64),
}

#[derive(Default)]
struct ServerState {
    records: Vec<BatchRecord>,
    next_id: i64,
    list_responses: VecDeque<Result<Value, ApiError>>,
    fail_saves: usize,
    calls: Vec<Call>,
}

/// In-memory batch API that records every call.
#[derive(Clone, Default)]
pub struct RecordingApi {
    state: Arc<Mutex<ServerState>>,
}

impl RecordingApi {
    pub fn with_records(records: Vec<BatchRecord>) -> Self {
        let next_id = records.iter().filter_map(|r| r.id).max().unwrap_or(0) + 1;
        Self {
            state: Arc::new(Mutex::new(ServerState {
                records,
                next_id,
                ..Default::default()
            })),
        }
    }

    /// Serve this payload for the next list call instead of the stored records.
    pub async fn queue_list_response(&self, response: Result<Value, ApiError>) {
        self.state.lock().await.list_responses.push_back(response);
    }

    pub async fn fail_next_save(&self) {
        self.state.lock().await.fail_saves += 1;
    }

    pub async fn calls(&self) -> Vec<Call> {
        self.state.lock().await.calls.clone()
    }

    pub async fn mutation_calls(&self) -> Vec<Call> {
        self.calls()
            .await
            .into_iter()
            .filter(|c| *c != Call::List)
            .collect()
    }

    pub async fn records(&self) -> Vec<BatchRecord> {
        self.state.lock().await.records.clone()
    }
}

fn server_error() -> ApiError {
    ApiError::Status {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: "boom".into(),
    }
}

#[async_trait]
impl BatchApi for RecordingApi {
    async fn list(&self) -> Result<Value, ApiError> {
        let mut state = self.state.lock().await;
        state.calls.push(Call::List);
        if let Some(response) = state.list_responses.pop_front() {
            return response;
        }
        Ok(serde_json::to_value(&state.records).unwrap())
    }

    async fn create(&self, record: &BatchRecord) -> Result<BatchRecord, ApiError> {
        let mut state = self.state.lock().await;
        state.calls.push(Call::Create(record.clone()));
        if state.fail_saves > 0 {
            state.fail_saves -= 1;
            return Err(server_error());
        }
        let saved = BatchRecord {
            id: Some(state.next_id),
            ..record.clone()
        };
        state.next_id += 1;
        state.records.push(saved.clone());
        Ok(saved)
    }

    async fn update(&self, id: i64, record: &BatchRecord) -> Result<BatchRecord, ApiError> {
        let mut state = self.state.lock().await;
        state.calls.push(Call::Update(id, record.clone()));
        if state.fail_saves > 0 {
            state.fail_saves -= 1;
            return Err(server_error());
        }
        let saved = BatchRecord {
            id: Some(id),
            ..record.clone()
        };
        match state.records.iter_mut().find(|r| r.id == Some(id)) {
            Some(slot) => {
                *slot = saved.clone();
                Ok(saved)
            }
            None => Err(ApiError::Status {
                status: StatusCode::NOT_FOUND,
                body: String::new(),
            }),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), ApiError> {
        let mut state = self.state.lock().await;
        state.calls.push(Call::Delete(id));
        state.records.retain(|r| r.id != Some(id));
        Ok(())
    }
}

/// Token validator that accepts a fixed set of tokens and counts calls.
#[derive(Clone, Default)]
pub struct RecordingValidator {
    accepted: HashSet<String>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl RecordingValidator {
    pub fn accepting(tokens: &[&str]) -> Self {
        Self {
            accepted: tokens.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl TokenValidator for RecordingValidator {
    async fn validate_token(&self, token: &str) -> Result<bool, AuthError> {
        self.calls.lock().await.push(token.to_string());
        Ok(self.accepted.contains(token))
    }
}

pub fn record(id: Option<i64>, name: &str, enabled: bool) -> BatchRecord {
    BatchRecord {
        id,
        job_name: name.into(),
        cron_expression: "0 0 * * *".into(),
        target_url: "https://x.example/hook".into(),
        enabled,
    }
}
