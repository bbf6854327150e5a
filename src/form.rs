//! Create/edit form state machine.

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::api::{ApiError, BatchApi};
use crate::model::{BatchDraft, BatchEntry, BatchRecord, EntryKey, FieldErrors, FieldValue};
use crate::schema;

#[derive(Debug, Error)]
pub enum FormError {
    #[error("form is not open")]
    Closed,
    #[error("a save is already in flight")]
    Busy,
    #[error("validation failed: {0}")]
    Invalid(FieldErrors),
    #[error("record {0} has no server id and cannot be updated")]
    MissingServerId(EntryKey),
    #[error("failed to save batch: {0}")]
    Save(#[from] ApiError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Closed,
    Create,
    Edit { key: EntryKey, target: Option<i64> },
}

/// The network call a validated submit turns into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveRequest {
    Create(BatchRecord),
    Update { id: i64, record: BatchRecord },
}

impl SaveRequest {
    pub async fn send(&self, api: &dyn BatchApi) -> Result<BatchRecord, ApiError> {
        match self {
            SaveRequest::Create(record) => api.create(record).await,
            SaveRequest::Update { id, record } => api.update(*id, record).await,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FormController {
    mode: FormMode,
    draft: BatchDraft,
    errors: FieldErrors,
    saving: bool,
}

impl Default for FormController {
    fn default() -> Self {
        Self::new()
    }
}

impl FormController {
    pub fn new() -> Self {
        Self {
            mode: FormMode::Closed,
            draft: BatchDraft::default(),
            errors: FieldErrors::new(),
            saving: false,
        }
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn is_open(&self) -> bool {
        self.mode != FormMode::Closed
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn draft(&self) -> &BatchDraft {
        &self.draft
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn submit_label(&self) -> &'static str {
        if self.saving {
            "Saving..."
        } else if matches!(self.mode, FormMode::Edit { .. }) {
            "Update"
        } else {
            "Create"
        }
    }

    /// Enter edit mode for `existing`, or create mode with defaults.
    pub fn open(&mut self, existing: Option<&BatchEntry>) -> bool {
        if self.saving {
            return false;
        }
        match existing {
            Some(entry) => {
                self.mode = FormMode::Edit {
                    key: entry.key.clone(),
                    target: entry.record.id,
                };
                self.draft = entry.record.draft();
            }
            None => {
                self.mode = FormMode::Create;
                self.draft = BatchDraft::default();
            }
        }
        self.errors = FieldErrors::new();
        true
    }

    /// Update one draft field. Validation waits for submit.
    pub fn change_field(&mut self, value: FieldValue) -> bool {
        if self.saving || !self.is_open() {
            return false;
        }
        self.draft.apply(value);
        true
    }

    /// Validate the draft and mark the save in flight.
    pub fn begin_submit(&mut self) -> Result<SaveRequest, FormError> {
        if self.saving {
            return Err(FormError::Busy);
        }
        let mode = self.mode.clone();
        if mode == FormMode::Closed {
            return Err(FormError::Closed);
        }

        let record = match schema::validate(&self.draft) {
            Ok(record) => record,
            Err(errors) => {
                self.errors = errors.clone();
                return Err(FormError::Invalid(errors));
            }
        };
        self.errors = FieldErrors::new();

        let request = match mode {
            FormMode::Edit { key, target } => match target {
                Some(id) => SaveRequest::Update { id, record },
                None => return Err(FormError::MissingServerId(key)),
            },
            _ => SaveRequest::Create(record),
        };
        self.saving = true;
        Ok(request)
    }

    /// Apply the outcome of the save started by `begin_submit`.
    pub fn finish_submit(
        &mut self,
        result: Result<BatchRecord, ApiError>,
    ) -> Result<BatchRecord, FormError> {
        self.saving = false;
        match result {
            Ok(saved) => {
                info!(id = ?saved.id, job = %saved.job_name, "batch saved");
                self.reset();
                Ok(saved)
            }
            Err(err) => {
                warn!(?err, "Failed to save batch");
                Err(FormError::Save(err))
            }
        }
    }

    #[instrument(skip_all)]
    pub async fn submit(&mut self, api: &dyn BatchApi) -> Result<BatchRecord, FormError> {
        let request = self.begin_submit()?;
        let result = request.send(api).await;
        self.finish_submit(result)
    }

    /// Discard the draft and close. Ignored while a save is in flight.
    pub fn cancel(&mut self) -> bool {
        if self.saving {
            return false;
        }
        self.reset();
        true
    }

    fn reset(&mut self) {
        self.mode = FormMode::Closed;
        self.draft = BatchDraft::default();
        self.errors = FieldErrors::new();
    }
}
