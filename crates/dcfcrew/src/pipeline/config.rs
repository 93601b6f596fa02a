use std::time::Duration;

use crate::agents::OpenAiConfig;

/// Settings shared by every pipeline the process starts.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Model endpoint used for agent stages and extraction.
    pub openai: OpenAiConfig,
    /// Upper bound for a single agent or extraction call. `None` waits indefinitely.
    pub stage_timeout: Option<Duration>,
}

impl PipelineConfig {
    pub fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = Some(timeout);
        self
    }
}
