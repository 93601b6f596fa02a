use tracing::info;

use super::store::JobStore;
use crate::sanitize::short_job_id;

/// Decides whether a pipeline must stop before its next step.
///
/// Returns `true` when the job is missing, already finished, or has a
/// pending cancellation. A pending cancellation on a running job is turned
/// into the `cancelled` status in the same locked step.
pub fn check_cancelled(store: &JobStore, job_id: &str) -> bool {
    let stop = store.with_job_mut(job_id, |job| {
        if job.cancel_requested && !job.is_finished() {
            job.cancel();
            info!(job = %short_job_id(job_id), "job cancelled at checkpoint");
        }
        job.cancel_requested || job.is_finished()
    });

    stop.unwrap_or(true)
}
