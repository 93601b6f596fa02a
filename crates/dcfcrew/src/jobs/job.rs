use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label shown once a user has cancelled a job.
pub const CANCELLED_LABEL: &str = "Cancelled by user";

/// Lifecycle status of a valuation job.
///
/// A job starts `Running` and moves to exactly one of the other three
/// variants. Terminal values are never overwritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Complete,
    Error,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Running)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Running => write!(f, "running"),
            JobStatus::Complete => write!(f, "complete"),
            JobStatus::Error => write!(f, "error"),
            JobStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Output of one agent stage, as shown to API clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageResult {
    #[serde(rename = "agent")]
    pub stage_index: u8,
    #[serde(rename = "name")]
    pub stage_name: String,
    #[serde(rename = "result")]
    pub text: String,
}

/// The downloadable ZIP produced by a successful run.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub bytes: Arc<[u8]>,
    pub filename: String,
}

/// Full record of one valuation run.
#[derive(Debug, Clone)]
pub struct DcfJob {
    pub id: String,
    pub company_name: String,
    pub status: JobStatus,
    /// 1-4 while an agent stage runs, 0 during post-processing and after completion.
    pub current_stage: u8,
    pub current_stage_label: String,
    pub stage_results: Vec<StageResult>,
    pub error_message: Option<String>,
    pub cancel_requested: bool,
    pub artifact: Option<Artifact>,
    /// Validation label reported by the audit stage, recorded on completion.
    pub validation_status: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl DcfJob {
    /// Creates a running job positioned at the first stage.
    pub fn new(company_name: impl Into<String>, first_stage_label: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            company_name: company_name.into(),
            status: JobStatus::Running,
            current_stage: 1,
            current_stage_label: first_stage_label.into(),
            stage_results: Vec::new(),
            error_message: None,
            cancel_requested: false,
            artifact: None,
            validation_status: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn set_progress(&mut self, stage: u8, label: impl Into<String>) {
        self.current_stage = stage;
        self.current_stage_label = label.into();
    }

    pub fn push_result(&mut self, result: StageResult) {
        self.stage_results.push(result);
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = JobStatus::Error;
        self.error_message = Some(message.into());
        self.finished_at = Some(Utc::now());
    }

    pub fn cancel(&mut self) {
        self.status = JobStatus::Cancelled;
        self.current_stage_label = CANCELLED_LABEL.to_string();
        self.finished_at = Some(Utc::now());
    }

    pub fn complete(&mut self, artifact: Artifact, validation_status: Option<String>) {
        self.artifact = Some(artifact);
        self.validation_status = validation_status;
        self.status = JobStatus::Complete;
        self.set_progress(0, "Complete");
        self.finished_at = Some(Utc::now());
    }

    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            status: self.status,
            current_agent: self.current_stage,
            current_agent_name: self.current_stage_label.clone(),
            agent_results: self.stage_results.clone(),
            error: self.error_message.clone(),
            download_ready: self.artifact.is_some(),
            zip_filename: self.artifact.as_ref().map(|a| a.filename.clone()),
            cancelled: self.cancel_requested,
        }
    }
}

/// Read-only projection of a job returned by the status and cancel operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub status: JobStatus,
    pub current_agent: u8,
    pub current_agent_name: String,
    pub agent_results: Vec<StageResult>,
    pub error: Option<String>,
    pub download_ready: bool,
    pub zip_filename: Option<String>,
    pub cancelled: bool,
}
