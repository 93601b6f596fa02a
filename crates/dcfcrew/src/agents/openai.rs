//! Chat-completions client for OpenAI-compatible endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{parse_http_error, AgentError};
use super::task::{AgentRunner, AgentTask};

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";

/// Default connect timeout for HTTP requests (10 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub endpoint: String,
    pub model: String,
    pub connect_timeout: Duration,
    /// Whole-request timeout; `None` lets long generations run to completion.
    pub request_timeout: Option<Duration>,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

/// Options for a single completion call.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Ask the provider to return a single JSON object.
    pub json_object: bool,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

pub struct OpenAiClient {
    http: Client,
    config: OpenAiConfig,
    api_key: SecretString,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig, api_key: SecretString) -> Result<Self, AgentError> {
        let mut builder = Client::builder().connect_timeout(config.connect_timeout);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| AgentError::Client(e.to_string()))?;

        Ok(Self {
            http,
            config,
            api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Sends one chat-completion request and returns the first choice's text.
    pub async fn complete(&self, request: &ChatRequest) -> Result<String, AgentError> {
        let body = build_body(&self.config.model, request);

        debug!(model = %self.config.model, messages = request.messages.len(), "chat completion request");
        let response = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(parse_http_error(status, &body));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AgentError::InvalidResponse(e.to_string()))?;

        first_choice_text(completion)
    }
}

fn build_body<'a>(model: &'a str, request: &'a ChatRequest) -> ChatCompletionBody<'a> {
    ChatCompletionBody {
        model,
        messages: &request.messages,
        temperature: request.temperature,
        max_tokens: request.max_tokens,
        response_format: request.json_object.then_some(ResponseFormat {
            kind: "json_object",
        }),
    }
}

fn first_choice_text(completion: ChatCompletionResponse) -> Result<String, AgentError> {
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or(AgentError::EmptyResponse)
}

#[async_trait]
impl AgentRunner for OpenAiClient {
    async fn run(&self, task: &AgentTask) -> Result<String, AgentError> {
        let request = ChatRequest {
            messages: vec![
                ChatMessage::system(task.system_prompt()),
                ChatMessage::user(task.user_prompt()),
            ],
            ..ChatRequest::default()
        };
        self.complete(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OpenAiConfig::default();
        assert_eq!(config.model, "gpt-4.1-mini");
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert!(config.request_timeout.is_none());
    }

    #[test]
    fn test_body_for_json_mode() {
        let request = ChatRequest {
            messages: vec![ChatMessage::system("sys"), ChatMessage::user("hi")],
            temperature: Some(0.0),
            max_tokens: Some(8000),
            json_object: true,
        };
        let value = serde_json::to_value(build_body("gpt-4.1-mini", &request)).unwrap();
        assert_eq!(value["model"], "gpt-4.1-mini");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "hi");
        assert_eq!(value["temperature"], 0.0);
        assert_eq!(value["max_tokens"], 8000);
        assert_eq!(value["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_body_omits_unset_options() {
        let request = ChatRequest {
            messages: vec![ChatMessage::user("hi")],
            ..ChatRequest::default()
        };
        let value = serde_json::to_value(build_body("m", &request)).unwrap();
        assert!(value.get("temperature").is_none());
        assert!(value.get("max_tokens").is_none());
        assert!(value.get("response_format").is_none());
    }

    #[test]
    fn test_first_choice_text() {
        let completion: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"Company Status: Exists"}}]}"#,
        )
        .unwrap();
        assert_eq!(
            first_choice_text(completion).unwrap(),
            "Company Status: Exists"
        );
    }

    #[test]
    fn test_empty_choices_is_error() {
        let completion: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(
            first_choice_text(completion),
            Err(AgentError::EmptyResponse)
        ));

        let completion: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":"   "}}]}"#).unwrap();
        assert!(matches!(
            first_choice_text(completion),
            Err(AgentError::EmptyResponse)
        ));
    }

    #[test]
    fn test_client_builds_with_timeout() {
        let config = OpenAiConfig {
            request_timeout: Some(Duration::from_secs(30)),
            ..OpenAiConfig::default()
        };
        let client = OpenAiClient::new(config, SecretString::from("sk-test".to_string())).unwrap();
        assert_eq!(client.model(), "gpt-4.1-mini");
    }
}
