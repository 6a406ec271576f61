//! Room submission.
//!
//! [`RecordSubmitter`] owns the add-room form. Field edits are mirrored into
//! the form's nested metadata; [`RecordSubmitter::submit`] validates the form,
//! posts it as a single-element batch and, once the backend confirms, resets
//! every field to its default.

use std::sync::Arc;

use anyhow::{bail, Result};
use roomdesk_core::backend::{BackendError, CatalogBackend};
use roomdesk_core::form::{
    FormError, FormField, FormModel, SubmitState, SubmitStatus, GENERIC_SUBMIT_FAILURE,
};
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::state::{Published, SettleGuard};
use crate::status::{Flow, StatusEvent, StatusReporter};

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("{0}")]
    Invalid(#[from] FormError),
    #[error("a submission is already in progress")]
    InFlight,
    /// The backend refused the room and said why.
    #[error("{0}")]
    Rejected(String),
    #[error("{}", GENERIC_SUBMIT_FAILURE)]
    Failed(#[source] BackendError),
    #[error("the form was closed before the submission finished")]
    Cancelled,
}

impl From<BackendError> for SubmitError {
    fn from(err: BackendError) -> Self {
        match err.detail() {
            Some(detail) => SubmitError::Rejected(detail.to_string()),
            None => SubmitError::Failed(err),
        }
    }
}

pub struct RecordSubmitter {
    backend: Arc<dyn CatalogBackend>,
    state: Published<SubmitState>,
    cancel: CancellationToken,
    include_metadata: bool,
}

impl RecordSubmitter {
    pub fn new(backend: Arc<dyn CatalogBackend>, config: &Config) -> Self {
        Self::with_cancel(backend, config, CancellationToken::new())
    }

    pub fn with_cancel(
        backend: Arc<dyn CatalogBackend>,
        config: &Config,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            backend,
            state: Published::new(SubmitState::default()),
            cancel,
            include_metadata: config.submit.include_metadata,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SubmitState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SubmitState {
        self.state.snapshot()
    }

    pub fn form(&self) -> FormModel {
        self.state.read(|s| s.form.clone())
    }

    pub fn status(&self) -> SubmitStatus {
        self.state.read(|s| s.status.clone())
    }

    /// Stores `raw` in `field` and its metadata mirror.
    pub fn update_field(&self, field: FormField, raw: &str) -> Result<(), FormError> {
        self.state.update(|s| s.form.update_field(field, raw))
    }

    /// Like [`update_field`](Self::update_field), with the field given by name.
    pub fn update_named(&self, name: &str, raw: &str) -> Result<(), FormError> {
        self.state.update(|s| s.form.update_named(name, raw))
    }

    pub fn set_booked(&self, booked: bool) {
        self.state.update(|s| s.form.set_booked(booked));
    }

    /// Posts the form. On success the form is reset; on failure the input is
    /// kept and the status carries the message to show.
    pub async fn submit(&self) -> Result<(), SubmitError> {
        if self.cancel.is_cancelled() {
            return Err(SubmitError::Cancelled);
        }

        let include_metadata = self.include_metadata;
        let batch = self.state.update(|s| {
            if s.is_submitting() {
                return Err(SubmitError::InFlight);
            }
            s.begin(include_metadata).map_err(SubmitError::from)
        })?;
        debug!(payload = ?batch, "Sending data");

        let guard = SettleGuard::new(&self.state, &self.cancel, |s: &mut SubmitState| {
            s.fail(GENERIC_SUBMIT_FAILURE)
        });

        let result = tokio::select! {
            _ = self.cancel.cancelled() => {
                debug!("submitter disposed while posting");
                return Err(SubmitError::Cancelled);
            }
            result = self.backend.add_documents(&batch) => result,
        };
        guard.disarm();

        match result {
            Ok(()) => {
                info!(rooms = batch.len(), "document added");
                self.state.update(|s| s.succeed());
                Ok(())
            }
            Err(e) => {
                error!(error = %e, kind = ?e.kind(), "Error adding document");
                let err = SubmitError::from(e);
                let message = err.to_string();
                self.state.update(|s| s.fail(message));
                Err(err)
            }
        }
    }

    pub fn dispose(&self) {
        self.cancel.cancel();
    }
}

/// Field values for `rooms add`, as typed on the command line.
#[derive(Debug, Clone, Default)]
pub struct RoomInput {
    pub room_number: String,
    pub title: String,
    pub description: String,
    pub room_size: String,
    pub image_url: Option<String>,
    pub booked: bool,
}

/// CLI entry point for `rooms add`.
///
/// Every value goes through the same field updates as interactive input,
/// then the form is submitted once.
pub async fn run_add(
    config: &Config,
    backend: Arc<dyn CatalogBackend>,
    input: RoomInput,
    json: bool,
    status: &dyn StatusReporter,
) -> Result<()> {
    let submitter = RecordSubmitter::new(backend, config);
    submitter.update_field(FormField::RoomNumber, &input.room_number)?;
    submitter.update_field(FormField::PageContent, &input.title)?;
    submitter.update_field(FormField::Description, &input.description)?;
    submitter.update_field(FormField::RoomSize, &input.room_size)?;
    if let Some(url) = &input.image_url {
        submitter.update_field(FormField::ImageUrl, url)?;
    }
    submitter.set_booked(input.booked);

    status.report(StatusEvent::Busy { flow: Flow::Submit });
    let result = submitter.submit().await;
    status.report(StatusEvent::Settled {
        flow: Flow::Submit,
        ok: result.is_ok(),
    });

    if let Err(e) = result {
        bail!("{}", e);
    }

    if json {
        println!("{}", serde_json::json!({ "added": 1, "room_number": input.room_number }));
    } else {
        println!("Room {} added.", input.room_number);
    }
    Ok(())
}
