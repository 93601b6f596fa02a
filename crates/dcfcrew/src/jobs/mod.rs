//! In-memory job tracking for valuation runs.

pub mod cancel;
pub mod job;
pub mod store;

pub use cancel::check_cancelled;
pub use job::{Artifact, DcfJob, JobSnapshot, JobStatus, StageResult, CANCELLED_LABEL};
pub use store::{JobStats, JobStore, JobSummary, StoreError};
