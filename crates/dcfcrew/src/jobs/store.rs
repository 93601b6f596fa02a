//! Process-wide job store.

use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use super::job::{Artifact, DcfJob, JobSnapshot, JobStatus};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Job '{0}' not found")]
    NotFound(String),

    #[error("Job '{id}' is already {status}")]
    Finalized { id: String, status: JobStatus },
}

// ─── Query types ────────────────────────────────────────────────────────────

/// One row of the recent-runs listing.
#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub job_id: String,
    pub company_name: String,
    pub status: JobStatus,
    pub current_agent_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_status: Option<String>,
    pub download_ready: bool,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl From<&DcfJob> for JobSummary {
    fn from(job: &DcfJob) -> Self {
        Self {
            job_id: job.id.clone(),
            company_name: job.company_name.clone(),
            status: job.status,
            current_agent_name: job.current_stage_label.clone(),
            validation_status: job.validation_status.clone(),
            download_ready: job.artifact.is_some(),
            started_at: job.started_at,
            finished_at: job.finished_at,
        }
    }
}

/// Aggregate counters over every job the process has seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobStats {
    pub total_analyses: usize,
    pub running_count: usize,
    pub completed_count: usize,
    pub validated_count: usize,
    pub unique_companies: usize,
}

// ─── JobStore ───────────────────────────────────────────────────────────────

/// In-memory job store shared by the API and every running pipeline.
///
/// All mutations happen under a single write lock so readers never observe
/// a half-applied transition. Records are never evicted.
#[derive(Default)]
pub struct JobStore {
    jobs: RwLock<HashMap<String, DcfJob>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, DcfJob>> {
        match self.jobs.read() {
            Ok(g) => g,
            Err(poisoned) => {
                log::warn!("Job store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, DcfJob>> {
        match self.jobs.write() {
            Ok(g) => g,
            Err(poisoned) => {
                log::warn!("Job store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Adds a new job and returns its id.
    pub fn insert(&self, job: DcfJob) -> String {
        let id = job.id.clone();
        self.write().insert(id.clone(), job);
        id
    }

    pub fn get(&self, job_id: &str) -> Option<DcfJob> {
        self.read().get(job_id).cloned()
    }

    pub fn contains(&self, job_id: &str) -> bool {
        self.read().contains_key(job_id)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self, job_id: &str) -> Option<JobSnapshot> {
        self.read().get(job_id).map(DcfJob::snapshot)
    }

    /// Returns the finished archive, if the job has one.
    pub fn artifact(&self, job_id: &str) -> Option<Artifact> {
        self.read().get(job_id).and_then(|job| job.artifact.clone())
    }

    /// Applies `f` to a running job.
    ///
    /// Terminal jobs are immutable: the closure is not called and
    /// `StoreError::Finalized` is returned instead.
    pub fn update<R>(
        &self,
        job_id: &str,
        f: impl FnOnce(&mut DcfJob) -> R,
    ) -> Result<R, StoreError> {
        let mut jobs = self.write();
        let job = jobs
            .get_mut(job_id)
            .ok_or_else(|| StoreError::NotFound(job_id.to_string()))?;
        if job.is_finished() {
            return Err(StoreError::Finalized {
                id: job_id.to_string(),
                status: job.status,
            });
        }
        Ok(f(job))
    }

    /// Raw access under the write lock, used by checks that must read and
    /// transition in one step.
    pub(crate) fn with_job_mut<R>(
        &self,
        job_id: &str,
        f: impl FnOnce(&mut DcfJob) -> R,
    ) -> Option<R> {
        self.write().get_mut(job_id).map(f)
    }

    /// Records a user cancellation.
    ///
    /// A running job is moved to `cancelled` immediately. A job that already
    /// finished keeps its record untouched. Either way the returned snapshot
    /// reports `cancelled: true`.
    pub fn request_cancel(&self, job_id: &str) -> Option<JobSnapshot> {
        self.with_job_mut(job_id, |job| {
            if !job.is_finished() {
                job.cancel_requested = true;
                job.cancel();
            }
            let mut snapshot = job.snapshot();
            snapshot.cancelled = true;
            snapshot
        })
    }

    /// Lists jobs, newest first.
    pub fn list(&self) -> Vec<JobSummary> {
        let mut jobs: Vec<JobSummary> = self.read().values().map(JobSummary::from).collect();
        jobs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        jobs
    }

    pub fn stats(&self) -> JobStats {
        let jobs = self.read();
        let mut companies = HashSet::new();
        let mut stats = JobStats {
            total_analyses: jobs.len(),
            ..JobStats::default()
        };

        for job in jobs.values() {
            companies.insert(job.company_name.trim().to_lowercase());
            match job.status {
                JobStatus::Running => stats.running_count += 1,
                JobStatus::Complete => stats.completed_count += 1,
                JobStatus::Error | JobStatus::Cancelled => {}
            }
            let validated = job
                .validation_status
                .as_deref()
                .is_some_and(|s| s.to_lowercase().contains("validated"));
            if validated {
                stats.validated_count += 1;
            }
        }

        stats.unique_companies = companies.len();
        stats
    }
}
