use thiserror::Error;

use crate::sanitize::sanitize_error_body;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Failed to create HTTP client: {0}")]
    Client(String),

    #[error("Request to model provider failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limited by model provider: {0}")]
    RateLimited(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Model provider error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Unexpected response ({status}): {message}")]
    Http { status: u16, message: String },

    #[error("Failed to parse model response: {0}")]
    InvalidResponse(String),

    #[error("Model returned an empty response")]
    EmptyResponse,
}

/// Maps a non-success provider response to an error, with the body cleaned
/// of secrets and cut to a readable length.
pub fn parse_http_error(status: u16, body: &str) -> AgentError {
    let message = sanitize_error_body(body);
    match status {
        401 => AgentError::Authentication("invalid API key".to_string()),
        403 => AgentError::Authentication("access denied".to_string()),
        429 => AgentError::RateLimited(message),
        400 | 404 | 422 => AgentError::InvalidRequest(message),
        500..=599 => AgentError::Server { status, message },
        _ => AgentError::Http { status, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_http_error_auth() {
        let err = parse_http_error(401, "Incorrect API key provided: sk-abcdefghijkl");
        assert!(matches!(err, AgentError::Authentication(_)));
        assert!(!err.to_string().contains("sk-abcdefghijkl"));
    }

    #[test]
    fn test_parse_http_error_rate_limit() {
        let err = parse_http_error(429, "slow down");
        assert_eq!(err.to_string(), "Rate limited by model provider: slow down");
    }

    #[test]
    fn test_parse_http_error_server() {
        let err = parse_http_error(503, "overloaded");
        assert!(matches!(err, AgentError::Server { status: 503, .. }));
    }

    #[test]
    fn test_parse_http_error_redacts_keys_in_body() {
        let err = parse_http_error(400, "bad key sk-proj-0123456789abcdef");
        assert_eq!(err.to_string(), "Invalid request: bad key sk-****");
    }

    #[test]
    fn test_parse_http_error_other() {
        let err = parse_http_error(418, "teapot");
        assert!(matches!(err, AgentError::Http { status: 418, .. }));
    }
}
