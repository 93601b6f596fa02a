//! Server configuration from environment variables.

use std::net::SocketAddr;
use std::time::Duration;

use dcfcrew::agents::openai::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use dcfcrew::{OpenAiConfig, PipelineConfig};

/// Default bind address
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default port number
pub const DEFAULT_PORT: u16 = 5000;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Some(LogFormat::Pretty),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    /// `None` when `DCF_LOG_FORMAT` held an unrecognised value.
    pub log_format: Option<LogFormat>,
    /// Allowed CORS origins; empty allows any origin.
    pub cors_origins: Vec<String>,
    pub model: String,
    pub openai_url: String,
    pub stage_timeout: Option<Duration>,
    pub request_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            log_level: "info".to_string(),
            log_format: Some(LogFormat::Pretty),
            cors_origins: Vec::new(),
            model: DEFAULT_MODEL.to_string(),
            openai_url: DEFAULT_ENDPOINT.to_string(),
            stage_timeout: None,
            request_timeout: None,
        }
    }
}

fn env_secs(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

impl ServerConfig {
    /// Load config from environment variables with fallback to defaults
    ///
    /// Environment variables:
    /// - `DCF_HOST` / `DCF_PORT` - bind address
    /// - `DCF_LOG_LEVEL` - trace, debug, info, warn, error
    /// - `DCF_LOG_FORMAT` - pretty or json
    /// - `DCF_CORS_ORIGINS` - comma separated origins
    /// - `DCF_MODEL` / `DCF_OPENAI_URL` - model provider
    /// - `DCF_STAGE_TIMEOUT_SECS` / `DCF_REQUEST_TIMEOUT_SECS` - unset means no limit
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("DCF_HOST") {
            config.host = host.trim().to_string();
        }

        if let Ok(port_str) = std::env::var("DCF_PORT") {
            if let Ok(port) = port_str.trim().parse::<u16>() {
                config.port = port;
            }
        }

        if let Ok(level) = std::env::var("DCF_LOG_LEVEL") {
            config.log_level = level.trim().to_ascii_lowercase();
        }

        if let Ok(format) = std::env::var("DCF_LOG_FORMAT") {
            config.log_format = LogFormat::parse(&format);
        }

        if let Ok(origins) = std::env::var("DCF_CORS_ORIGINS") {
            config.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Ok(model) = std::env::var("DCF_MODEL") {
            if !model.trim().is_empty() {
                config.model = model.trim().to_string();
            }
        }

        if let Ok(url) = std::env::var("DCF_OPENAI_URL") {
            if !url.trim().is_empty() {
                config.openai_url = url.trim().to_string();
            }
        }

        config.stage_timeout = env_secs("DCF_STAGE_TIMEOUT_SECS");
        config.request_timeout = env_secs("DCF_REQUEST_TIMEOUT_SECS");

        config
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| format!("Invalid address: {}", e))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("Port cannot be zero".to_string());
        }

        if self.host.is_empty() {
            return Err("Host cannot be empty".to_string());
        }

        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            ));
        }

        if self.log_format.is_none() {
            return Err("Invalid log format. Must be one of: pretty, json".to_string());
        }

        Ok(())
    }

    /// Pipeline settings derived from the provider options.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            openai: OpenAiConfig {
                endpoint: self.openai_url.clone(),
                model: self.model.clone(),
                request_timeout: self.request_timeout,
                ..OpenAiConfig::default()
            },
            stage_timeout: self.stage_timeout,
        }
    }
}
