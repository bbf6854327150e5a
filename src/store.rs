//! In-memory list of batch records as last fetched from the server.
//!
//! The collection is only ever replaced as a whole. A refresh whose payload
//! fails schema validation leaves the previous collection in place.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::api::{ApiError, BatchApi};
use crate::model::{BatchEntry, BatchRecord, EntryKey};
use crate::schema::{self, SchemaError};

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("rejected list payload: {0}")]
    Malformed(#[from] SchemaError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The collection now holds this many entries.
    Replaced(usize),
    /// The response was dropped: the store was detached or a newer
    /// refresh had already been applied.
    Discarded,
}

/// Handle for a refresh started with [`BatchStore::begin_refresh`].
#[derive(Debug)]
#[must_use]
pub struct RefreshTicket {
    generation: u64,
}

#[derive(Debug)]
pub struct BatchStore {
    session: String,
    next_seq: u64,
    entries: Vec<BatchEntry>,
    in_flight: usize,
    issued: u64,
    applied: u64,
    detached: bool,
}

impl Default for BatchStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchStore {
    pub fn new() -> Self {
        let nonce = Uuid::new_v4().simple().to_string();
        Self {
            session: nonce[..8].to_string(),
            next_seq: 0,
            entries: Vec::new(),
            in_flight: 0,
            issued: 0,
            applied: 0,
            detached: false,
        }
    }

    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    pub fn find(&self, key: &EntryKey) -> Option<&BatchEntry> {
        self.entries.iter().find(|e| &e.key == key)
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    /// Whether any refresh has been applied yet.
    pub fn is_loaded(&self) -> bool {
        self.applied > 0
    }

    /// Stop applying responses; anything still in flight becomes a no-op.
    pub fn detach(&mut self) {
        self.detached = true;
    }

    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.in_flight += 1;
        self.issued += 1;
        RefreshTicket {
            generation: self.issued,
        }
    }

    pub fn finish_refresh(
        &mut self,
        ticket: RefreshTicket,
        result: Result<Value, ApiError>,
    ) -> Result<RefreshOutcome, RefreshError> {
        self.in_flight = self.in_flight.saturating_sub(1);

        if self.detached {
            debug!(generation = ticket.generation, "store detached; dropping list response");
            return Ok(RefreshOutcome::Discarded);
        }
        if ticket.generation <= self.applied {
            debug!(
                generation = ticket.generation,
                applied = self.applied,
                "newer list already applied; dropping response"
            );
            return Ok(RefreshOutcome::Discarded);
        }

        let payload = result.map_err(|err| {
            warn!(?err, "failed to fetch batches");
            err
        })?;
        let records = schema::validate_list(&payload).map_err(|err| {
            error!(%err, "Failed to validate batches; keeping previous list");
            err
        })?;

        let entries: Vec<BatchEntry> = records.into_iter().map(|r| self.keyed(r)).collect();
        self.entries = entries;
        self.applied = ticket.generation;
        info!(count = self.entries.len(), "batch list refreshed");
        Ok(RefreshOutcome::Replaced(self.entries.len()))
    }

    #[instrument(skip_all)]
    pub async fn refresh(&mut self, api: &dyn BatchApi) -> Result<RefreshOutcome, RefreshError> {
        let ticket = self.begin_refresh();
        let result = api.list().await;
        self.finish_refresh(ticket, result)
    }

    fn keyed(&mut self, record: BatchRecord) -> BatchEntry {
        let key = match record.id {
            Some(id) => EntryKey::Server(id),
            None => {
                self.next_seq += 1;
                EntryKey::Local {
                    session: self.session.clone(),
                    seq: self.next_seq,
                }
            }
        };
        BatchEntry { key, record }
    }
}
