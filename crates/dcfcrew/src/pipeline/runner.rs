use std::future::Future;
use std::sync::Arc;

use tracing::{error, info, info_span, warn, Instrument};

use crate::agents::AgentRunner;
use crate::extraction::{StructuredExtractor, ValuationData};
use crate::jobs::{check_cancelled, Artifact, JobStore, StageResult, StoreError};
use crate::report;
use crate::sanitize::short_job_id;

use super::config::PipelineConfig;
use super::context::PipelineContext;
use super::error::{PipelineError, PipelineOutcome};
use super::gates::{assess_audit, assess_existence, AuditVerdict, ExistenceCheck};
use super::naming::archive_filename;
use super::stages::{build_task, Stage, StagePrompts};

pub const EXTRACTING_LABEL: &str = "Extracting structured data...";
pub const RENDERING_LABEL: &str = "Generating reports...";

const AUDIT_REJECTED_MESSAGE: &str =
    "Validation agent rejected the analysis. See agent 4 results for details.";

fn existence_failed_message(company_name: &str, status: &str) -> String {
    format!(
        "Company verification failed: The company \"{}\" was marked as \"{}\" by the \
         verification agent, so the DCF pipeline was stopped.",
        company_name, status
    )
}

/// Drives one job through the four agent stages, extraction and rendering.
///
/// All progress is written to the shared [`JobStore`]; the store refuses
/// writes once the job is terminal, which stops the run at its next write.
pub struct Pipeline {
    config: Arc<PipelineConfig>,
    store: Arc<JobStore>,
    runner: Arc<dyn AgentRunner>,
    extractor: Arc<dyn StructuredExtractor>,
}

impl Pipeline {
    pub fn new(
        config: Arc<PipelineConfig>,
        store: Arc<JobStore>,
        runner: Arc<dyn AgentRunner>,
        extractor: Arc<dyn StructuredExtractor>,
    ) -> Self {
        Self {
            config,
            store,
            runner,
            extractor,
        }
    }

    /// Runs the pipeline for an existing job record.
    ///
    /// Never returns an error: failures are recorded on the job and
    /// reported through the returned outcome.
    pub async fn run(
        &self,
        job_id: &str,
        company_name: &str,
        prompts: StagePrompts,
    ) -> PipelineOutcome {
        let span = info_span!("pipeline",
            job = %short_job_id(job_id),
            company = %company_name,
        );

        async {
            info!("pipeline started");
            let mut ctx = PipelineContext::new(job_id, company_name, prompts);

            match self.execute(&mut ctx).await {
                Ok(outcome) => {
                    match &outcome {
                        PipelineOutcome::Completed { filename } => {
                            info!(filename = %filename, "pipeline complete")
                        }
                        PipelineOutcome::Cancelled => info!("pipeline cancelled"),
                        other => warn!(outcome = ?other, "pipeline stopped"),
                    }
                    outcome
                }
                Err(PipelineError::Store(e)) => {
                    info!(reason = %e, "job finalized elsewhere, stopping");
                    PipelineOutcome::Superseded
                }
                Err(e) => {
                    let message = e.to_string();
                    error!(error = %message, "pipeline failed");
                    match self.store.update(job_id, |job| job.fail(message.clone())) {
                        Ok(()) => PipelineOutcome::Failed { message },
                        Err(StoreError::Finalized { .. }) | Err(StoreError::NotFound(_)) => {
                            PipelineOutcome::Superseded
                        }
                    }
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(&self, ctx: &mut PipelineContext) -> Result<PipelineOutcome, PipelineError> {
        for stage in Stage::ALL {
            if check_cancelled(&self.store, &ctx.job_id) {
                return Ok(PipelineOutcome::Cancelled);
            }

            let span = info_span!("stage", index = stage.index(), name = stage.label());
            let text = self.step_run_stage(ctx, stage).instrument(span).await?;

            let halt = self.evaluate_gate(ctx, stage, &text);
            self.record_result(ctx, stage, text)?;

            if let Some(message) = halt {
                self.store
                    .update(&ctx.job_id, |job| job.fail(message.clone()))?;
                return Ok(PipelineOutcome::Halted {
                    stage_index: stage.index(),
                    message,
                });
            }
        }

        if check_cancelled(&self.store, &ctx.job_id) {
            return Ok(PipelineOutcome::Cancelled);
        }

        let data = self
            .step_extract(ctx)
            .instrument(info_span!("extract_structured_data"))
            .await?;

        let artifact = {
            let _step = info_span!("render_reports").entered();
            self.step_render(ctx, &data)?
        };

        let filename = artifact.filename.clone();
        let validation_status = data.validation_status.clone();
        self.store.update(&ctx.job_id, |job| {
            job.complete(artifact, validation_status)
        })?;

        Ok(PipelineOutcome::Completed { filename })
    }

    /// Applies `stage_timeout` to a step future, when configured.
    async fn bounded<T>(
        &self,
        stage: &'static str,
        step: impl Future<Output = Result<T, PipelineError>>,
    ) -> Result<T, PipelineError> {
        match self.config.stage_timeout {
            Some(limit) => tokio::time::timeout(limit, step)
                .await
                .map_err(|_| PipelineError::StageTimeout { stage, limit })?,
            None => step.await,
        }
    }

    async fn step_run_stage(
        &self,
        ctx: &PipelineContext,
        stage: Stage,
    ) -> Result<String, PipelineError> {
        self.store.update(&ctx.job_id, |job| {
            job.set_progress(stage.index(), stage.label())
        })?;
        info!("stage starting");

        let task = build_task(stage, &ctx.company_name, &ctx.prompts, &ctx.results);
        let text = self
            .bounded(stage.label(), async {
                self.runner
                    .run(&task)
                    .await
                    .map_err(|source| PipelineError::Agent {
                        stage: stage.label(),
                        source,
                    })
            })
            .await?;

        info!(chars = text.len(), "stage completed");
        Ok(text)
    }

    /// Returns the failure message when `stage` output must stop the run.
    fn evaluate_gate(&self, ctx: &PipelineContext, stage: Stage, text: &str) -> Option<String> {
        match stage {
            Stage::ExistenceValidation => match assess_existence(text) {
                ExistenceCheck::Negative(status) => {
                    warn!(status = %status, "company existence not confirmed");
                    Some(existence_failed_message(&ctx.company_name, &status))
                }
                ExistenceCheck::Passed(status) => {
                    info!(status = %status, "company status parsed");
                    None
                }
                ExistenceCheck::Unparsed => {
                    warn!("no company status line found, continuing");
                    None
                }
            },
            Stage::RealismAudit => match assess_audit(text) {
                AuditVerdict::Rejected => {
                    warn!("analysis rejected by audit");
                    Some(AUDIT_REJECTED_MESSAGE.to_string())
                }
                AuditVerdict::Accepted => None,
            },
            Stage::InputCollection | Stage::DcfCalculation => None,
        }
    }

    fn record_result(
        &self,
        ctx: &mut PipelineContext,
        stage: Stage,
        text: String,
    ) -> Result<(), PipelineError> {
        let result = StageResult {
            stage_index: stage.index(),
            stage_name: stage.label().to_string(),
            text,
        };
        self.store
            .update(&ctx.job_id, |job| job.push_result(result.clone()))?;
        ctx.results.push(result);
        Ok(())
    }

    async fn step_extract(&self, ctx: &PipelineContext) -> Result<ValuationData, PipelineError> {
        self.store
            .update(&ctx.job_id, |job| job.set_progress(0, EXTRACTING_LABEL))?;
        info!("extracting structured data");

        self.bounded("Structured data extraction", async {
            self.extractor
                .extract(&ctx.company_name, &ctx.results)
                .await
                .map_err(PipelineError::from)
        })
        .await
    }

    fn step_render(
        &self,
        ctx: &mut PipelineContext,
        data: &ValuationData,
    ) -> Result<Artifact, PipelineError> {
        self.store
            .update(&ctx.job_id, |job| job.set_progress(0, RENDERING_LABEL))?;

        let today = chrono::Local::now().date_naive();
        let bytes = report::render_bundle(data, &ctx.company_name, today)?;
        let filename = archive_filename(&ctx.company_name, today);
        info!(bytes = bytes.len(), filename = %filename, "reports generated");

        ctx.archive_filename = Some(filename.clone());
        Ok(Artifact {
            bytes: Arc::from(bytes),
            filename,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::agents::{AgentError, AgentTask};
    use crate::extraction::{parse_valuation, ExtractionError};
    use crate::jobs::{DcfJob, JobStatus, CANCELLED_LABEL};

    /// Returns canned text per stage and records which stages ran.
    struct ScriptedRunner {
        replies: HashMap<u8, Result<String, String>>,
        calls: Mutex<Vec<u8>>,
    }

    impl ScriptedRunner {
        fn new(replies: &[(u8, Result<&str, &str>)]) -> Self {
            Self {
                replies: replies
                    .iter()
                    .map(|(idx, r)| (*idx, r.map(str::to_string).map_err(str::to_string)))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn happy() -> Self {
            Self::new(&[
                (1, Ok("Company Status: Exists\nLegal name: Acme Corp")),
                (2, Ok("Revenue 2025: 1,000")),
                (3, Ok("Intrinsic value per share: 42")),
                (4, Ok("Final status: Validated")),
            ])
        }

        fn calls(&self) -> Vec<u8> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AgentRunner for ScriptedRunner {
        async fn run(&self, task: &AgentTask) -> Result<String, AgentError> {
            self.calls.lock().unwrap().push(task.stage_index);
            match self.replies.get(&task.stage_index) {
                Some(Ok(text)) => Ok(text.clone()),
                Some(Err(message)) => Err(AgentError::Server {
                    status: 500,
                    message: message.clone(),
                }),
                None => Err(AgentError::EmptyResponse),
            }
        }
    }

    /// Cancels the job through the store while the given stage is running.
    struct CancellingRunner {
        store: Arc<JobStore>,
        job_id: String,
        cancel_during: u8,
    }

    #[async_trait]
    impl AgentRunner for CancellingRunner {
        async fn run(&self, task: &AgentTask) -> Result<String, AgentError> {
            if task.stage_index == self.cancel_during {
                self.store.request_cancel(&self.job_id);
            }
            Ok(format!("Company Status: Exists (stage {})", task.stage_index))
        }
    }

    struct SlowRunner;

    #[async_trait]
    impl AgentRunner for SlowRunner {
        async fn run(&self, _task: &AgentTask) -> Result<String, AgentError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("too late".into())
        }
    }

    struct JsonExtractor(&'static str);

    #[async_trait]
    impl StructuredExtractor for JsonExtractor {
        async fn extract(
            &self,
            _company_name: &str,
            stage_results: &[StageResult],
        ) -> Result<ValuationData, ExtractionError> {
            assert_eq!(stage_results.len(), 4);
            parse_valuation(self.0)
        }
    }

    const VALID_JSON: &str = r#"{
        "company_name": "Acme Corp",
        "forecast": [{"year": 2026, "revenue": 100.0}],
        "intrinsic_value_per_share": 42.0,
        "validation_status": "Validated"
    }"#;

    fn setup(
        runner: Arc<dyn AgentRunner>,
        extractor: Arc<dyn StructuredExtractor>,
        store: Arc<JobStore>,
    ) -> Pipeline {
        Pipeline::new(
            Arc::new(PipelineConfig::default()),
            store,
            runner,
            extractor,
        )
    }

    fn new_job(store: &JobStore, company: &str) -> String {
        store.insert(DcfJob::new(company, Stage::ExistenceValidation.label()))
    }

    // ── Happy path ──

    #[tokio::test]
    async fn test_full_run_completes_with_archive() {
        let store = Arc::new(JobStore::new());
        let id = new_job(&store, "Acme Corp - Holdings");
        let runner = Arc::new(ScriptedRunner::happy());
        let pipeline = setup(
            runner.clone(),
            Arc::new(JsonExtractor(VALID_JSON)),
            store.clone(),
        );

        let outcome = pipeline
            .run(&id, "Acme Corp - Holdings", StagePrompts::default())
            .await;

        let filename = match outcome {
            PipelineOutcome::Completed { filename } => filename,
            other => panic!("unexpected outcome {:?}", other),
        };
        assert!(filename.starts_with("acme_corp_valuation_"));
        assert!(filename.ends_with(".zip"));
        assert_eq!(runner.calls(), vec![1, 2, 3, 4]);

        let job = store.get(&id).unwrap();
        assert_eq!(job.status, JobStatus::Complete);
        assert_eq!(job.stage_results.len(), 4);
        assert_eq!(job.current_stage, 0);
        assert_eq!(job.current_stage_label, "Complete");
        assert_eq!(job.validation_status.as_deref(), Some("Validated"));
        assert!(job.error_message.is_none());
        let artifact = job.artifact.unwrap();
        assert_eq!(artifact.filename, filename);
        assert!(!artifact.bytes.is_empty());
    }

    #[tokio::test]
    async fn test_unparsed_status_continues() {
        let store = Arc::new(JobStore::new());
        let id = new_job(&store, "Acme");
        let runner = Arc::new(ScriptedRunner::new(&[
            (1, Ok("Acme is a large listed manufacturer.")),
            (2, Ok("data")),
            (3, Ok("model")),
            (4, Ok("Validated")),
        ]));
        let pipeline = setup(
            runner.clone(),
            Arc::new(JsonExtractor(VALID_JSON)),
            store.clone(),
        );

        let outcome = pipeline.run(&id, "Acme", StagePrompts::default()).await;
        assert!(matches!(outcome, PipelineOutcome::Completed { .. }));
        assert_eq!(runner.calls().len(), 4);
    }

    // ── Gates ──

    #[tokio::test]
    async fn test_existence_gate_halts_after_stage_one() {
        let store = Arc::new(JobStore::new());
        let id = new_job(&store, "Imaginary Widgets");
        let runner = Arc::new(ScriptedRunner::new(&[(1, Ok("Company Status: [Uncertain]"))]));
        let pipeline = setup(
            runner.clone(),
            Arc::new(JsonExtractor(VALID_JSON)),
            store.clone(),
        );

        let outcome = pipeline
            .run(&id, "Imaginary Widgets", StagePrompts::default())
            .await;

        let expected = "Company verification failed: The company \"Imaginary Widgets\" was marked \
                        as \"uncertain\" by the verification agent, so the DCF pipeline was stopped.";
        assert_eq!(
            outcome,
            PipelineOutcome::Halted {
                stage_index: 1,
                message: expected.to_string(),
            }
        );
        assert_eq!(runner.calls(), vec![1]);

        let job = store.get(&id).unwrap();
        assert_eq!(job.status, JobStatus::Error);
        assert_eq!(job.stage_results.len(), 1);
        assert_eq!(job.stage_results[0].text, "Company Status: [Uncertain]");
        assert_eq!(job.error_message.as_deref(), Some(expected));
        assert!(job.artifact.is_none());
    }

    #[tokio::test]
    async fn test_audit_rejection_halts_with_four_results() {
        let store = Arc::new(JobStore::new());
        let id = new_job(&store, "Acme");
        let runner = Arc::new(ScriptedRunner::new(&[
            (1, Ok("Company Status: Exists")),
            (2, Ok("data")),
            (3, Ok("model")),
            (4, Ok("Final status: Rejected - growth unrealistic")),
        ]));
        let pipeline = setup(
            runner.clone(),
            Arc::new(JsonExtractor(VALID_JSON)),
            store.clone(),
        );

        let outcome = pipeline.run(&id, "Acme", StagePrompts::default()).await;
        assert!(matches!(
            outcome,
            PipelineOutcome::Halted { stage_index: 4, .. }
        ));

        let job = store.get(&id).unwrap();
        assert_eq!(job.status, JobStatus::Error);
        assert_eq!(job.stage_results.len(), 4);
        assert_eq!(job.error_message.as_deref(), Some(AUDIT_REJECTED_MESSAGE));
        assert!(job.artifact.is_none());
    }

    // ── Failures ──

    #[tokio::test]
    async fn test_agent_failure_records_error() {
        let store = Arc::new(JobStore::new());
        let id = new_job(&store, "Acme");
        let runner = Arc::new(ScriptedRunner::new(&[
            (1, Ok("Company Status: Exists")),
            (2, Err("upstream exploded")),
        ]));
        let pipeline = setup(
            runner.clone(),
            Arc::new(JsonExtractor(VALID_JSON)),
            store.clone(),
        );

        let outcome = pipeline.run(&id, "Acme", StagePrompts::default()).await;
        let message = match outcome {
            PipelineOutcome::Failed { message } => message,
            other => panic!("unexpected outcome {:?}", other),
        };
        assert!(message.starts_with("DCF Input Data Collection failed:"));
        assert!(message.contains("upstream exploded"));

        let job = store.get(&id).unwrap();
        assert_eq!(job.status, JobStatus::Error);
        assert_eq!(job.stage_results.len(), 1);
        assert_eq!(job.error_message.as_deref(), Some(message.as_str()));
    }

    #[tokio::test]
    async fn test_malformed_extraction_fails_after_four_results() {
        let store = Arc::new(JobStore::new());
        let id = new_job(&store, "Acme");
        let pipeline = setup(
            Arc::new(ScriptedRunner::happy()),
            Arc::new(JsonExtractor("this is not json")),
            store.clone(),
        );

        let outcome = pipeline.run(&id, "Acme", StagePrompts::default()).await;
        assert!(matches!(outcome, PipelineOutcome::Failed { .. }));

        let job = store.get(&id).unwrap();
        assert_eq!(job.status, JobStatus::Error);
        assert_eq!(job.stage_results.len(), 4);
        assert!(job
            .error_message
            .unwrap()
            .starts_with("Structured data extraction failed:"));
        assert!(job.artifact.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stage_timeout_fails_job() {
        let store = Arc::new(JobStore::new());
        let id = new_job(&store, "Acme");
        let pipeline = Pipeline::new(
            Arc::new(PipelineConfig::default().with_stage_timeout(Duration::from_millis(50))),
            store.clone(),
            Arc::new(SlowRunner),
            Arc::new(JsonExtractor(VALID_JSON)),
        );

        let outcome = pipeline.run(&id, "Acme", StagePrompts::default()).await;
        assert_eq!(
            outcome,
            PipelineOutcome::Failed {
                message: "Stage 'Company Existence Validation' timed out after 50ms".into()
            }
        );
        assert!(store.get(&id).unwrap().stage_results.is_empty());
    }

    // ── Cancellation ──

    #[tokio::test]
    async fn test_cancel_before_start() {
        let store = Arc::new(JobStore::new());
        let id = new_job(&store, "Acme");
        store.with_job_mut(&id, |job| job.cancel_requested = true);
        let runner = Arc::new(ScriptedRunner::happy());
        let pipeline = setup(
            runner.clone(),
            Arc::new(JsonExtractor(VALID_JSON)),
            store.clone(),
        );

        let outcome = pipeline.run(&id, "Acme", StagePrompts::default()).await;
        assert_eq!(outcome, PipelineOutcome::Cancelled);
        assert!(runner.calls().is_empty());

        let job = store.get(&id).unwrap();
        assert_eq!(job.status, JobStatus::Cancelled);
        assert_eq!(job.current_stage_label, CANCELLED_LABEL);
        assert!(job.stage_results.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_during_stage_drops_inflight_result() {
        let store = Arc::new(JobStore::new());
        let id = new_job(&store, "Acme");
        let runner = Arc::new(CancellingRunner {
            store: store.clone(),
            job_id: id.clone(),
            cancel_during: 2,
        });
        let pipeline = setup(runner, Arc::new(JsonExtractor(VALID_JSON)), store.clone());

        let outcome = pipeline.run(&id, "Acme", StagePrompts::default()).await;
        assert_eq!(outcome, PipelineOutcome::Superseded);

        let job = store.get(&id).unwrap();
        assert_eq!(job.status, JobStatus::Cancelled);
        assert_eq!(job.stage_results.len(), 1);
        assert!(job.error_message.is_none());
    }

    #[tokio::test]
    async fn test_missing_job_stops_immediately() {
        let store = Arc::new(JobStore::new());
        let runner = Arc::new(ScriptedRunner::happy());
        let pipeline = setup(runner.clone(), Arc::new(JsonExtractor(VALID_JSON)), store);

        let outcome = pipeline.run("missing", "Acme", StagePrompts::default()).await;
        assert_eq!(outcome, PipelineOutcome::Cancelled);
        assert!(runner.calls().is_empty());
    }

    // ── Prompts ──

    #[tokio::test]
    async fn test_custom_backstory_reaches_runner() {
        struct CapturingRunner(Mutex<Vec<String>>);

        #[async_trait]
        impl AgentRunner for CapturingRunner {
            async fn run(&self, task: &AgentTask) -> Result<String, AgentError> {
                self.0.lock().unwrap().push(task.backstory.clone());
                Ok("Company Status: Does Not Exist".into())
            }
        }

        let store = Arc::new(JobStore::new());
        let id = new_job(&store, "Acme");
        let runner = Arc::new(CapturingRunner(Mutex::new(Vec::new())));
        let pipeline = setup(
            runner.clone(),
            Arc::new(JsonExtractor(VALID_JSON)),
            store.clone(),
        );

        let prompts = StagePrompts {
            agent1: Some("You verify companies for a living.".into()),
            ..StagePrompts::default()
        };
        pipeline.run(&id, "Acme", prompts).await;

        assert_eq!(
            *runner.0.lock().unwrap(),
            vec!["You verify companies for a living.".to_string()]
        );
    }
}
