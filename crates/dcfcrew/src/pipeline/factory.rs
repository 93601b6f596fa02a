use std::sync::Arc;

use secrecy::SecretString;
use tracing::debug;

use crate::agents::OpenAiClient;
use crate::jobs::JobStore;

use super::config::PipelineConfig;
use super::error::PipelineError;
use super::runner::Pipeline;

/// Builds a [`Pipeline`] bound to the caller's API key.
///
/// Each job carries its own key, so the model client is created per job.
pub trait PipelineFactory: Send + Sync {
    fn build(&self, api_key: SecretString, store: Arc<JobStore>) -> Result<Pipeline, PipelineError>;
}

/// Factory that runs every stage and the extraction against one
/// OpenAI-compatible endpoint.
pub struct OpenAiPipelineFactory {
    config: Arc<PipelineConfig>,
}

impl OpenAiPipelineFactory {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

impl PipelineFactory for OpenAiPipelineFactory {
    fn build(&self, api_key: SecretString, store: Arc<JobStore>) -> Result<Pipeline, PipelineError> {
        let client = Arc::new(
            OpenAiClient::new(self.config.openai.clone(), api_key).map_err(PipelineError::Setup)?,
        );
        debug!(model = %client.model(), "model client ready");

        Ok(Pipeline::new(
            self.config.clone(),
            store,
            client.clone(),
            client,
        ))
    }
}
