//! Async coordinator around a [`Wizard`].
//!
//! A [`CustomizationFlow`] is the one owner of a customer's wizard. It adds the
//! two things the pure core leaves to the caller:
//!
//! - image batches are encoded concurrently on the blocking pool and applied
//!   to the wizard in one step once every file has resolved;
//! - submission goes through the [`OrderIntake`] collaborator, with at most one
//!   request in flight. The request runs on its own task, so a dropped HTTP
//!   connection cannot leave the wizard stuck in the submitting state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use keepsake_core::images::{ImageRejection, IncomingFile, UploadedImage, prepare_file};
use keepsake_core::order::{OrderPayload, SubmissionError, TrackingId};
use keepsake_core::wizard::ImageBatchReport;
use keepsake_core::{Wizard, WizardError};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::instrument;
use uuid::Uuid;

use crate::intake::OrderIntake;

/// Errors from flow operations.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    Wizard(#[from] WizardError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    /// A background task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(String),
}

/// A successfully submitted order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionReceipt {
    pub tracking_id: TrackingId,
    pub payload: OrderPayload,
    pub submitted_at: DateTime<Utc>,
}

struct FlowState {
    wizard: Wizard,
    receipt: Option<SubmissionReceipt>,
}

/// One customer's customization flow. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct CustomizationFlow {
    id: Uuid,
    state: Arc<Mutex<FlowState>>,
    intake: Arc<dyn OrderIntake>,
}

impl CustomizationFlow {
    #[must_use]
    pub fn new(wizard: Wizard, intake: Arc<dyn OrderIntake>) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: Arc::new(Mutex::new(FlowState {
                wizard,
                receipt: None,
            })),
            intake,
        }
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Read the wizard.
    pub async fn read<R>(&self, f: impl FnOnce(&Wizard) -> R) -> R {
        f(&self.state.lock().await.wizard)
    }

    /// Apply a synchronous edit to the wizard.
    ///
    /// # Errors
    ///
    /// Returns whatever the edit returns.
    pub async fn edit<R>(
        &self,
        f: impl FnOnce(&mut Wizard) -> Result<R, WizardError>,
    ) -> Result<R, FlowError> {
        Ok(f(&mut self.state.lock().await.wizard)?)
    }

    /// The receipt of the submitted order, if any.
    pub async fn receipt(&self) -> Option<SubmissionReceipt> {
        self.state.lock().await.receipt.clone()
    }

    /// Validate and encode a batch of files concurrently, then attach them.
    ///
    /// The wizard is not locked while files are encoded. The batch is
    /// applied in upload order, in one step.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::Task`] if an encoding task fails, or a wizard
    /// error if the flow can no longer be edited.
    #[instrument(skip(self, files), fields(flow_id = %self.id, files = files.len()))]
    pub async fn add_images(&self, files: Vec<IncomingFile>) -> Result<ImageBatchReport, FlowError> {
        let limits = Arc::new(self.read(|w| w.policy().images.clone()).await);
        let count = files.len();

        let mut tasks = JoinSet::new();
        for (index, file) in files.into_iter().enumerate() {
            let limits = Arc::clone(&limits);
            tasks.spawn_blocking(move || (index, prepare_file(file, &limits)));
        }

        let mut slots: Vec<Option<Result<UploadedImage, ImageRejection>>> = vec![None; count];
        while let Some(joined) = tasks.join_next().await {
            let (index, prepared) = joined.map_err(|e| FlowError::Task(e.to_string()))?;
            if let Some(slot) = slots.get_mut(index) {
                *slot = Some(prepared);
            }
        }

        let report = self
            .edit(|w| w.apply_prepared(slots.into_iter().flatten().collect()))
            .await?;
        tracing::debug!(
            accepted = report.accepted.len(),
            rejected = report.rejections.len(),
            "Image batch applied"
        );
        Ok(report)
    }

    /// Submit the order.
    ///
    /// On failure the wizard stays at the confirm step with every field
    /// unchanged, so the same order can be submitted again.
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionError::AlreadyInFlight`] if a submission is
    /// outstanding, the intake service's failure, or a wizard error if the
    /// flow is not ready to submit.
    #[instrument(skip(self), fields(flow_id = %self.id))]
    pub async fn submit(&self) -> Result<SubmissionReceipt, FlowError> {
        let payload = {
            let mut state = self.state.lock().await;
            state.wizard.begin_submission().map_err(|e| match e {
                WizardError::SubmissionInFlight => {
                    FlowError::Submission(SubmissionError::AlreadyInFlight)
                }
                other => FlowError::Wizard(other),
            })?
        };

        let state = Arc::clone(&self.state);
        let intake = Arc::clone(&self.intake);
        let task = tokio::spawn(async move {
            let result = intake.submit(&payload).await;
            let mut state = state.lock().await;
            match result {
                Ok(tracking_id) => {
                    state.wizard.complete_submission(tracking_id.clone())?;
                    let receipt = SubmissionReceipt {
                        tracking_id,
                        payload,
                        submitted_at: Utc::now(),
                    };
                    state.receipt = Some(receipt.clone());
                    Ok(receipt)
                }
                Err(error) => {
                    state.wizard.abort_submission();
                    Err(FlowError::Submission(error))
                }
            }
        });

        match task.await {
            Ok(result) => result,
            Err(join_error) => {
                self.state.lock().await.wizard.abort_submission();
                Err(FlowError::Task(join_error.to_string()))
            }
        }
    }
}
