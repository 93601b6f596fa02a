use async_trait::async_trait;
use tracing::debug;

use super::{
    extraction_user_message, parse_valuation, ExtractionError, StructuredExtractor,
    ValuationData, EXTRACTION_PROMPT,
};
use crate::agents::{ChatMessage, ChatRequest, OpenAiClient};
use crate::jobs::StageResult;

pub const EXTRACTION_MAX_TOKENS: u32 = 8000;

/// Builds the deterministic JSON-mode request used for extraction.
pub fn extraction_request(company_name: &str, stage_results: &[StageResult]) -> ChatRequest {
    ChatRequest {
        messages: vec![
            ChatMessage::system(EXTRACTION_PROMPT),
            ChatMessage::user(extraction_user_message(company_name, stage_results)),
        ],
        temperature: Some(0.0),
        max_tokens: Some(EXTRACTION_MAX_TOKENS),
        json_object: true,
    }
}

#[async_trait]
impl StructuredExtractor for OpenAiClient {
    async fn extract(
        &self,
        company_name: &str,
        stage_results: &[StageResult],
    ) -> Result<ValuationData, ExtractionError> {
        let request = extraction_request(company_name, stage_results);
        let content = self.complete(&request).await?;
        debug!(chars = content.len(), "extraction response received");
        parse_valuation(&content)
    }
}
