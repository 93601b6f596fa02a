//! Multi-agent discounted-cash-flow valuation jobs.
//!
//! A job runs four model-backed analysis stages in order, extracts a
//! structured valuation document from their combined output and renders a
//! Word report plus an Excel forecast into a single ZIP archive.

pub mod agents;
pub mod control;
pub mod extraction;
pub mod jobs;
pub mod pipeline;
pub mod report;
pub mod sanitize;

pub use agents::{AgentError, AgentRunner, AgentTask, OpenAiClient, OpenAiConfig};
pub use control::{ControlError, JobControl, StartRequest};
pub use extraction::{ExtractionError, StructuredExtractor, ValuationData};
pub use jobs::{JobSnapshot, JobStatus, JobStore, StageResult};
pub use pipeline::{
    OpenAiPipelineFactory, Pipeline, PipelineConfig, PipelineError, PipelineFactory,
    PipelineOutcome, StagePrompts,
};
pub use report::ReportError;
