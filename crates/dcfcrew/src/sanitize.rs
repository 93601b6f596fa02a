//! Helpers for shaping data before it enters tracing span attributes,
//! error messages, or agent prompts.
//!
//! Traces are safe to share for debugging: API keys echoed back by the model
//! provider are masked and long bodies are cut down.

use std::sync::LazyLock;

use regex::Regex;

/// Matches OpenAI-style secret keys (`sk-...`, `sk-proj-...`).
static SECRET_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"sk-[A-Za-z0-9_\-]{8,}").expect("secret key regex is valid")
});

const MAX_ERROR_BODY_CHARS: usize = 200;

/// Returns the first 8 characters of a job id for log correlation.
pub fn short_job_id(job_id: &str) -> &str {
    match job_id.char_indices().nth(8) {
        Some((idx, _)) => &job_id[..idx],
        None => job_id,
    }
}

/// Returns at most `max_chars` characters of `text`, never splitting a character.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Masks anything that looks like a secret key.
///
/// - `Incorrect API key provided: sk-abc123def456` → `Incorrect API key provided: sk-****`
pub fn redact_secret_keys(text: &str) -> String {
    SECRET_KEY_RE.replace_all(text, "sk-****").into_owned()
}

/// Cleans a provider error body for inclusion in a job error message.
pub fn sanitize_error_body(body: &str) -> String {
    let redacted = redact_secret_keys(body.trim());
    let truncated = truncate_chars(&redacted, MAX_ERROR_BODY_CHARS);
    if truncated.len() < redacted.len() {
        format!("{}...", truncated)
    } else {
        redacted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_job_id() {
        assert_eq!(
            short_job_id("0f8fad5b-d9cb-469f-a165-70867728950e"),
            "0f8fad5b"
        );
        assert_eq!(short_job_id("abc"), "abc");
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo wörld", 4), "héll");
        assert_eq!(truncate_chars("short", 100), "short");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_redact_secret_keys() {
        assert_eq!(
            redact_secret_keys("Incorrect API key provided: sk-proj-abcdef123456."),
            "Incorrect API key provided: sk-****."
        );
        assert_eq!(redact_secret_keys("no secrets here"), "no secrets here");
    }

    #[test]
    fn test_sanitize_error_body_truncates() {
        let body = "x".repeat(500);
        let cleaned = sanitize_error_body(&body);
        assert_eq!(cleaned.len(), MAX_ERROR_BODY_CHARS + 3);
        assert!(cleaned.ends_with("..."));
    }

    #[test]
    fn test_sanitize_error_body_short_passthrough() {
        assert_eq!(sanitize_error_body("  rate limited  "), "rate limited");
    }
}
