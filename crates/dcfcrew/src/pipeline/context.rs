use crate::jobs::StageResult;

use super::stages::{Stage, StagePrompts};

pub struct PipelineContext {
    // Input
    pub job_id: String,
    pub company_name: String,
    pub prompts: StagePrompts,

    // Stage outputs, in order; mirrors what has been written to the store
    pub results: Vec<StageResult>,

    // Set once the archive has been rendered
    pub archive_filename: Option<String>,
}

impl PipelineContext {
    pub fn new(job_id: &str, company_name: &str, prompts: StagePrompts) -> Self {
        Self {
            job_id: job_id.to_string(),
            company_name: company_name.to_string(),
            prompts,
            results: Vec::with_capacity(Stage::ALL.len()),
            archive_filename: None,
        }
    }
}
