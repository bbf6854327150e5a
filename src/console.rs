//! Management view state: list store, form and delete confirmation.
//!
//! Every mutation is split into `begin_*` / `finish_*` so the caller can drop
//! its lock while the network call runs. The `*_with` helpers chain both
//! halves for callers that own the console outright.

use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ApiError, BatchApi};
use crate::form::{FormController, FormError, SaveRequest};
use crate::model::{BatchEntry, BatchRecord, EntryKey, FieldValue};
use crate::store::{BatchStore, RefreshError, RefreshOutcome, RefreshTicket};

#[derive(Debug, Error)]
pub enum DeleteError {
    #[error("no delete is awaiting confirmation")]
    NothingPending,
    #[error("a delete is already in flight")]
    Busy,
    #[error("record {0} has no server id and cannot be deleted")]
    MissingServerId(EntryKey),
    #[error("failed to delete batch: {0}")]
    Api(#[from] ApiError),
}

#[derive(Debug, Default)]
pub struct Console {
    store: BatchStore,
    form: FormController,
    confirm_delete: Option<BatchEntry>,
    deleting: bool,
    notice: Option<String>,
}

impl Console {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> &BatchStore {
        &self.store
    }

    pub fn form(&self) -> &FormController {
        &self.form
    }

    pub fn pending_delete(&self) -> Option<&BatchEntry> {
        self.confirm_delete.as_ref()
    }

    pub fn is_deleting(&self) -> bool {
        self.deleting
    }

    /// List loading or a delete in flight; disables the list controls.
    pub fn is_busy(&self) -> bool {
        self.store.is_loading() || self.deleting
    }

    /// Last transport failure, shown as a non-blocking notice.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Ignore any refresh still in flight.
    pub fn detach(&mut self) {
        self.store.detach();
    }

    // --- list ---

    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.store.begin_refresh()
    }

    pub fn finish_refresh(
        &mut self,
        ticket: RefreshTicket,
        result: Result<serde_json::Value, ApiError>,
    ) -> Result<RefreshOutcome, RefreshError> {
        let outcome = self.store.finish_refresh(ticket, result);
        match &outcome {
            Ok(RefreshOutcome::Replaced(_)) => self.notice = None,
            Err(RefreshError::Api(err)) => {
                self.notice = Some(format!("Failed to load batches: {}", err));
            }
            _ => {}
        }
        outcome
    }

    pub async fn refresh_with(
        &mut self,
        api: &dyn BatchApi,
    ) -> Result<RefreshOutcome, RefreshError> {
        let ticket = self.begin_refresh();
        let result = api.list().await;
        self.finish_refresh(ticket, result)
    }

    // --- form ---

    pub fn open_create(&mut self) -> bool {
        self.form.open(None)
    }

    pub fn open_edit(&mut self, key: &EntryKey) -> bool {
        match self.store.find(key) {
            Some(entry) => {
                let entry = entry.clone();
                self.form.open(Some(&entry))
            }
            None => false,
        }
    }

    pub fn change_field(&mut self, value: FieldValue) -> bool {
        self.form.change_field(value)
    }

    pub fn cancel_form(&mut self) -> bool {
        self.form.cancel()
    }

    pub fn begin_save(&mut self) -> Result<SaveRequest, FormError> {
        self.form.begin_submit()
    }

    pub fn finish_save(
        &mut self,
        result: Result<BatchRecord, ApiError>,
    ) -> Result<BatchRecord, FormError> {
        let outcome = self.form.finish_submit(result);
        match &outcome {
            Ok(_) => self.notice = None,
            Err(err) => self.notice = Some(err.to_string()),
        }
        outcome
    }

    /// Submit the form and, on success, re-fetch the list.
    pub async fn save_with(&mut self, api: &dyn BatchApi) -> Result<BatchRecord, FormError> {
        let request = self.begin_save()?;
        let result = request.send(api).await;
        let saved = self.finish_save(result)?;
        if let Err(err) = self.refresh_with(api).await {
            warn!(?err, "refresh after save failed");
        }
        Ok(saved)
    }

    // --- delete ---

    /// Ask for confirmation before deleting `key`.
    pub fn request_delete(&mut self, key: &EntryKey) -> bool {
        if self.deleting {
            return false;
        }
        self.confirm_delete = self.store.find(key).cloned();
        self.confirm_delete.is_some()
    }

    pub fn dismiss_delete(&mut self) -> bool {
        if self.deleting {
            return false;
        }
        self.confirm_delete = None;
        true
    }

    pub fn begin_delete(&mut self) -> Result<i64, DeleteError> {
        if self.deleting {
            return Err(DeleteError::Busy);
        }
        let entry = self
            .confirm_delete
            .as_ref()
            .ok_or(DeleteError::NothingPending)?;
        let id = entry
            .record
            .id
            .ok_or_else(|| DeleteError::MissingServerId(entry.key.clone()))?;
        self.deleting = true;
        Ok(id)
    }

    pub fn finish_delete(&mut self, id: i64, result: Result<(), ApiError>) -> Result<(), DeleteError> {
        self.deleting = false;
        match result {
            Ok(()) => {
                info!(id, "batch deleted");
                self.confirm_delete = None;
                self.notice = None;
                Ok(())
            }
            Err(err) => {
                warn!(?err, id, "Failed to delete batch");
                self.notice = Some(format!("Failed to delete batch: {}", err));
                Err(DeleteError::Api(err))
            }
        }
    }

    /// Delete the confirmed entry and, on success, re-fetch the list.
    pub async fn delete_with(&mut self, api: &dyn BatchApi) -> Result<(), DeleteError> {
        let id = self.begin_delete()?;
        let result = api.delete(id).await;
        self.finish_delete(id, result)?;
        if let Err(err) = self.refresh_with(api).await {
            warn!(?err, "refresh after delete failed");
        }
        Ok(())
    }
}
