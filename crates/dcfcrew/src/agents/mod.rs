//! Agent execution against hosted language models.

pub mod error;
pub mod openai;
pub mod task;

pub use error::AgentError;
pub use openai::{ChatMessage, ChatRequest, OpenAiClient, OpenAiConfig};
pub use task::{AgentRunner, AgentTask};
