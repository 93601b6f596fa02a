//! Job lifecycle operations shared by every front end.

use std::sync::Arc;

use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, Instrument};

use crate::jobs::{Artifact, DcfJob, JobSnapshot, JobStats, JobStore, JobSummary};
use crate::pipeline::{PipelineError, PipelineFactory, Stage, StagePrompts};
use crate::sanitize::short_job_id;

/// Placeholder the front end sends when no key has been configured.
const PLACEHOLDER_API_KEY: &str = "NO_KEY";

#[derive(Error, Debug)]
pub enum ControlError {
    #[error("Company name is required")]
    MissingCompanyName,

    #[error("Please configure a valid OpenAI API key in Settings.")]
    InvalidApiKey,

    #[error("Job not found")]
    JobNotFound,

    #[error("Download is not ready yet")]
    DownloadNotReady,

    #[error("Failed to start analysis: {0}")]
    Launch(#[source] PipelineError),
}

/// Parameters for starting an analysis.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StartRequest {
    pub company_name: String,
    pub api_key: String,
    pub prompts: StagePrompts,
}

/// Starts, observes and cancels valuation jobs.
pub struct JobControl {
    store: Arc<JobStore>,
    factory: Arc<dyn PipelineFactory>,
}

impl JobControl {
    pub fn new(store: Arc<JobStore>, factory: Arc<dyn PipelineFactory>) -> Self {
        Self { store, factory }
    }

    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    /// Validates the request, registers a running job and spawns its pipeline.
    ///
    /// Must be called from within a tokio runtime. Returns the new job id
    /// without waiting for any stage.
    pub fn start(&self, request: StartRequest) -> Result<String, ControlError> {
        let company_name = request.company_name.trim().to_string();
        let api_key = request.api_key.trim();

        if company_name.is_empty() {
            return Err(ControlError::MissingCompanyName);
        }
        if api_key.is_empty() || api_key == PLACEHOLDER_API_KEY {
            return Err(ControlError::InvalidApiKey);
        }

        let pipeline = self
            .factory
            .build(SecretString::from(api_key.to_string()), self.store.clone())
            .map_err(ControlError::Launch)?;

        let job_id = self.store.insert(DcfJob::new(
            company_name.clone(),
            Stage::ExistenceValidation.label(),
        ));
        info!(job = %short_job_id(&job_id), company = %company_name, "analysis started");

        let id = job_id.clone();
        let prompts = request.prompts;
        tokio::spawn(
            async move {
                pipeline.run(&id, &company_name, prompts).await;
            }
            .in_current_span(),
        );

        Ok(job_id)
    }

    pub fn status(&self, job_id: &str) -> Result<JobSnapshot, ControlError> {
        self.store.snapshot(job_id).ok_or(ControlError::JobNotFound)
    }

    /// Requests cancellation; the response always reports `cancelled: true`.
    pub fn cancel(&self, job_id: &str) -> Result<JobSnapshot, ControlError> {
        let snapshot = self
            .store
            .request_cancel(job_id)
            .ok_or(ControlError::JobNotFound)?;
        info!(job = %short_job_id(job_id), status = %snapshot.status, "cancel requested");
        Ok(snapshot)
    }

    pub fn download(&self, job_id: &str) -> Result<Artifact, ControlError> {
        if !self.store.contains(job_id) {
            return Err(ControlError::JobNotFound);
        }
        self.store
            .artifact(job_id)
            .ok_or(ControlError::DownloadNotReady)
    }

    pub fn list(&self) -> Vec<JobSummary> {
        self.store.list()
    }

    pub fn stats(&self) -> JobStats {
        self.store.stats()
    }
}
