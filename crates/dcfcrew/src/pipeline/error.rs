use std::time::Duration;

use thiserror::Error;

use crate::agents::AgentError;
use crate::extraction::ExtractionError;
use crate::jobs::StoreError;
use crate::report::ReportError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{stage} failed: {source}")]
    Agent {
        stage: &'static str,
        #[source]
        source: AgentError,
    },

    #[error("Structured data extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Report generation failed: {0}")]
    Report(#[from] ReportError),

    #[error("Stage '{stage}' timed out after {limit:?}")]
    StageTimeout { stage: &'static str, limit: Duration },

    #[error("Failed to set up model client: {0}")]
    Setup(#[source] AgentError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// How a pipeline run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// The archive was stored and the job is `complete`.
    Completed { filename: String },
    /// A gate stopped the run after `stage_index`; the job is `error`.
    Halted { stage_index: u8, message: String },
    /// A step failed; the job is `error` with `message`.
    Failed { message: String },
    /// A checkpoint observed a cancellation.
    Cancelled,
    /// The record was finalized by someone else (or vanished) mid-run.
    Superseded,
}
