//! Shared fakes for dcfcrew integration tests.
//!
//! - `ScriptedRunner` answers each stage with canned text or an error
//! - `GatedRunner` parks inside a chosen stage until released
//! - `ScriptedExtractor` parses a fixed JSON document
//! - `FakeFactory` wires them into pipelines for `JobControl`

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use tokio::sync::Notify;

use dcfcrew::agents::{AgentError, AgentRunner, AgentTask};
use dcfcrew::extraction::{parse_valuation, ExtractionError, StructuredExtractor, ValuationData};
use dcfcrew::jobs::{JobSnapshot, JobStore, StageResult};
use dcfcrew::pipeline::{Pipeline, PipelineConfig, PipelineError, PipelineFactory};

pub const VALID_EXTRACTION: &str = r#"{
    "company_name": "Acme Corp",
    "ticker": "ACME",
    "country": "USA",
    "industry": "Industrials",
    "analysis_date": "2026-10-18",
    "method_summary": "Ten-year FCFF model discounted at WACC.",
    "assumptions": {"wacc": 8.5, "terminal_growth_rate": "2.5%", "tax_rate": 21},
    "forecast": [
        {"year": 2026, "revenue": 1000, "ebit": 150, "fcff": 90, "discount_factor": 0.9217, "pv_fcf": 82.95},
        {"year": 2027, "revenue": "1,080", "ebit": 165, "fcff": 99, "discount_factor": 0.8495, "pv_fcf": 84.1}
    ],
    "terminal_value": 2100.5,
    "enterprise_value": 1850,
    "intrinsic_value_per_share": "42.10",
    "sensitivity": [{"wacc": 8.0, "growth": 2.0, "value_per_share": 44.2}],
    "risk_notes": ["Customer concentration"],
    "validation_status": "Adjusted & Validated",
    "validation_notes": ["Terminal growth trimmed to 2.5%"]
}"#;

// ─── Runners ────────────────────────────────────────────────────────────────

pub struct ScriptedRunner {
    replies: HashMap<u8, Result<String, String>>,
    calls: Mutex<Vec<u8>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self {
            replies: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Four stages that pass both gates.
    pub fn passing() -> Self {
        Self::new()
            .reply(1, "Company Status: Exists\nLegal name: Acme Corp\nTicker: ACME")
            .reply(2, "Revenue (TTM): $1,000m\nNet debt: $120m")
            .reply(3, "Enterprise value: $1,850m\nIntrinsic value per share: $42.10")
            .reply(4, "Final status: Adjusted & Validated")
    }

    pub fn reply(mut self, stage: u8, text: &str) -> Self {
        self.replies.insert(stage, Ok(text.to_string()));
        self
    }

    pub fn fail(mut self, stage: u8, message: &str) -> Self {
        self.replies.insert(stage, Err(message.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<u8> {
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
                status: 503,
                message: message.clone(),
            }),
            None => Err(AgentError::EmptyResponse),
        }
    }
}

/// Delegates to a `ScriptedRunner` but parks inside `gate_stage` until
/// `release()` is called.
pub struct GatedRunner {
    inner: ScriptedRunner,
    gate_stage: u8,
    entered: Notify,
    release: Notify,
}

impl GatedRunner {
    pub fn new(inner: ScriptedRunner, gate_stage: u8) -> Self {
        Self {
            inner,
            gate_stage,
            entered: Notify::new(),
            release: Notify::new(),
        }
    }

    /// Waits until the pipeline is inside the gated stage.
    pub async fn wait_entered(&self) {
        tokio::time::timeout(Duration::from_secs(5), self.entered.notified())
            .await
            .expect("gated stage was never reached");
    }

    pub fn release(&self) {
        self.release.notify_one();
    }

    pub fn calls(&self) -> Vec<u8> {
        self.inner.calls()
    }
}

#[async_trait]
impl AgentRunner for GatedRunner {
    async fn run(&self, task: &AgentTask) -> Result<String, AgentError> {
        if task.stage_index == self.gate_stage {
            self.entered.notify_one();
            self.release.notified().await;
        }
        self.inner.run(task).await
    }
}

// ─── Extractor ──────────────────────────────────────────────────────────────

pub struct ScriptedExtractor {
    content: String,
    seen: Mutex<Vec<usize>>,
}

impl ScriptedExtractor {
    pub fn new(content: &str) -> Self {
        Self {
            content: content.to_string(),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn valid() -> Self {
        Self::new(VALID_EXTRACTION)
    }

    /// Number of stage results passed to each extraction call.
    pub fn seen(&self) -> Vec<usize> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl StructuredExtractor for ScriptedExtractor {
    async fn extract(
        &self,
        _company_name: &str,
        stage_results: &[StageResult],
    ) -> Result<ValuationData, ExtractionError> {
        self.seen.lock().unwrap().push(stage_results.len());
        parse_valuation(&self.content)
    }
}

// ─── Factory ────────────────────────────────────────────────────────────────

/// Hands the same runner and extractor to every pipeline it builds.
pub struct FakeFactory {
    pub runner: Arc<dyn AgentRunner>,
    pub extractor: Arc<dyn StructuredExtractor>,
}

impl FakeFactory {
    pub fn new(runner: Arc<dyn AgentRunner>, extractor: Arc<dyn StructuredExtractor>) -> Self {
        Self { runner, extractor }
    }
}

impl PipelineFactory for FakeFactory {
    fn build(
        &self,
        _api_key: SecretString,
        store: Arc<JobStore>,
    ) -> Result<Pipeline, PipelineError> {
        Ok(Pipeline::new(
            Arc::new(PipelineConfig::default()),
            store,
            self.runner.clone(),
            self.extractor.clone(),
        ))
    }
}

// ─── Polling ────────────────────────────────────────────────────────────────

/// Polls the store until the job reaches a terminal status.
pub async fn wait_for_terminal(store: &JobStore, job_id: &str) -> JobSnapshot {
    let poll = async {
        loop {
            if let Some(snapshot) = store.snapshot(job_id) {
                if snapshot.status.is_terminal() {
                    return snapshot;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    };
    tokio::time::timeout(Duration::from_secs(5), poll)
        .await
        .expect("job did not finish in time")
}
