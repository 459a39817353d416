//! Configuration management for citetrace
//!
//! Settings are loaded from environment variables (a `.env` file in the working
//! directory is read first) with sensible defaults. CLI flags override them.
//!
//! # Environment Variables
//!
//! - `CITETRACE_PROVIDER`: deepseek|openai|claude|gemini|groq|ollama - default: "deepseek"
//! - `CITETRACE_MODEL`: model name - default depends on provider
//! - `CITETRACE_API_BASE_URL`: custom endpoint for the provider
//! - `CITETRACE_CACHE_ENABLED`: enable the response cache - default: "true"
//! - `CITETRACE_CACHE_DIR`: cache directory - default: user cache dir + "citetrace"
//! - `CITETRACE_REQUEST_TIMEOUT`: per-request timeout in seconds - default: "300"
//! - `CITETRACE_MAX_TOKENS`: completion token limit - default: "8192"
//! - `CITETRACE_CONCURRENCY`: in-flight analysis requests - default: "16"
//! - `CITETRACE_LOG_LEVEL`: logging level - default: "info"
//! - `CITETRACE_FAILURE_LOG`: JSONL file receiving undecodable responses
//!
//! Provider credentials are read by the genai library (`DEEPSEEK_API_KEY`,
//! `OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, `GEMINI_API_KEY`, `GROQ_API_KEY`).

use crate::error::BackendError;
use genai::adapter::AdapterKind;
use std::env;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_DEEPSEEK_MODEL: &str = "deepseek-chat";
const DEFAULT_OLLAMA_MODEL: &str = "qwen2.5:7b";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_CACHE_ENABLED: bool = true;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;
const DEFAULT_MAX_TOKENS: u32 = 8192;
const DEFAULT_CONCURRENCY: usize = 16;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid provider: {0}. Valid options: deepseek, openai, claude, gemini, groq, ollama")]
    InvalidProvider(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Backend initialization failed: {0}")]
    BackendInitError(#[from] BackendError),
}

#[derive(Debug, Clone)]
pub struct CitetraceConfig {
    pub provider: AdapterKind,
    pub model: String,
    pub api_base_url: Option<String>,
    pub cache_enabled: bool,
    pub cache_dir: PathBuf,
    pub request_timeout_secs: u64,
    pub max_tokens: u32,
    pub concurrency: usize,
    pub log_level: String,
    pub failure_log: Option<PathBuf>,
}

pub fn parse_provider(value: &str) -> Result<AdapterKind, ConfigError> {
    match value.to_lowercase().as_str() {
        "deepseek" => Ok(AdapterKind::DeepSeek),
        "openai" => Ok(AdapterKind::OpenAI),
        "claude" | "anthropic" => Ok(AdapterKind::Anthropic),
        "gemini" => Ok(AdapterKind::Gemini),
        "groq" => Ok(AdapterKind::Groq),
        "ollama" => Ok(AdapterKind::Ollama),
        _ => Err(ConfigError::InvalidProvider(value.to_string())),
    }
}

pub fn default_model(provider: AdapterKind) -> String {
    match provider {
        AdapterKind::DeepSeek => DEFAULT_DEEPSEEK_MODEL.to_string(),
        AdapterKind::Ollama => DEFAULT_OLLAMA_MODEL.to_string(),
        AdapterKind::OpenAI => "gpt-4o-mini".to_string(),
        AdapterKind::Anthropic => "claude-3-5-haiku-latest".to_string(),
        AdapterKind::Gemini => "gemini-2.0-flash".to_string(),
        AdapterKind::Groq => "llama-3.3-70b-versatile".to_string(),
        other => other.as_str().to_lowercase(),
    }
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("citetrace"))
        .unwrap_or_else(|| PathBuf::from(".citetrace-cache"))
}

impl Default for CitetraceConfig {
    fn default() -> Self {
        let provider = env::var("CITETRACE_PROVIDER")
            .ok()
            .and_then(|s| parse_provider(&s).ok())
            .unwrap_or(AdapterKind::DeepSeek);

        let model = env::var("CITETRACE_MODEL")
            .ok()
            .unwrap_or_else(|| default_model(provider));

        let api_base_url = env::var("CITETRACE_API_BASE_URL").ok();

        let cache_enabled = env::var("CITETRACE_CACHE_ENABLED")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(DEFAULT_CACHE_ENABLED);

        let cache_dir = env::var("CITETRACE_CACHE_DIR")
            .ok()
            .map(PathBuf::from)
            .unwrap_or_else(default_cache_dir);

        let request_timeout_secs = env::var("CITETRACE_REQUEST_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        let max_tokens = env::var("CITETRACE_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(DEFAULT_MAX_TOKENS);

        let concurrency = env::var("CITETRACE_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_CONCURRENCY);

        let log_level = env::var("CITETRACE_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        let failure_log = env::var("CITETRACE_FAILURE_LOG").ok().map(PathBuf::from);

        Self {
            provider,
            model,
            api_base_url,
            cache_enabled,
            cache_dir,
            request_timeout_secs,
            max_tokens,
            concurrency,
            log_level,
            failure_log,
        }
    }
}

impl CitetraceConfig {
    /// Loads `.env` (if present) and then reads the environment
    pub fn load() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }
        Self::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Model name must not be empty".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout must be at least 1 second".to_string(),
            ));
        }
        if self.request_timeout_secs > 3600 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout cannot exceed 1 hour".to_string(),
            ));
        }

        if self.max_tokens < 512 {
            return Err(ConfigError::ValidationFailed(
                "Max tokens must be at least 512".to_string(),
            ));
        }
        if self.max_tokens > 128_000 {
            return Err(ConfigError::ValidationFailed(
                "Max tokens cannot exceed 128000".to_string(),
            ));
        }

        if self.concurrency == 0 || self.concurrency > 256 {
            return Err(ConfigError::ValidationFailed(
                "Concurrency must be between 1 and 256".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }
}

impl fmt::Display for CitetraceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Citetrace Configuration:")?;
        writeln!(f, "  Provider: {}", self.provider.as_str())?;
        writeln!(f, "  Model: {}", self.model)?;
        if let Some(ref url) = self.api_base_url {
            writeln!(f, "  API Base URL: {}", url)?;
        }
        writeln!(f, "  Cache Enabled: {}", self.cache_enabled)?;
        writeln!(f, "  Cache Dir: {}", self.cache_dir.display())?;
        writeln!(f, "  Request Timeout: {}s", self.request_timeout_secs)?;
        writeln!(f, "  Max Tokens: {}", self.max_tokens)?;
        writeln!(f, "  Concurrency: {}", self.concurrency)?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    struct EnvGuard {
        key: String,
        old_value: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let old_value = env::var(key).ok();
            env::set_var(key, value);
            Self {
                key: key.to_string(),
                old_value,
            }
        }

        fn unset(key: &str) -> Self {
            let old_value = env::var(key).ok();
            env::remove_var(key);
            Self {
                key: key.to_string(),
                old_value,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.old_value {
                Some(v) => env::set_var(&self.key, v),
                None => env::remove_var(&self.key),
            }
        }
    }

    #[test]
    #[serial]
    fn test_default_configuration() {
        let _guards = [
            EnvGuard::unset("CITETRACE_PROVIDER"),
            EnvGuard::unset("CITETRACE_MODEL"),
            EnvGuard::unset("CITETRACE_CACHE_ENABLED"),
            EnvGuard::unset("CITETRACE_REQUEST_TIMEOUT"),
            EnvGuard::unset("CITETRACE_MAX_TOKENS"),
            EnvGuard::unset("CITETRACE_CONCURRENCY"),
            EnvGuard::set("CITETRACE_LOG_LEVEL", DEFAULT_LOG_LEVEL),
        ];

        let config = CitetraceConfig::default();

        assert!(matches!(config.provider, AdapterKind::DeepSeek));
        assert_eq!(config.model, DEFAULT_DEEPSEEK_MODEL);
        assert_eq!(config.cache_enabled, DEFAULT_CACHE_ENABLED);
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
        assert_eq!(config.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_environment_variable_parsing() {
        let _guards = [
            EnvGuard::set("CITETRACE_PROVIDER", "ollama"),
            EnvGuard::set("CITETRACE_MODEL", "llama3:8b"),
            EnvGuard::set("CITETRACE_LOG_LEVEL", "DEBUG"),
            EnvGuard::set("CITETRACE_CACHE_ENABLED", "false"),
            EnvGuard::set("CITETRACE_CACHE_DIR", "/tmp/citetrace-test"),
            EnvGuard::set("CITETRACE_REQUEST_TIMEOUT", "60"),
            EnvGuard::set("CITETRACE_MAX_TOKENS", "4096"),
            EnvGuard::set("CITETRACE_CONCURRENCY", "4"),
        ];

        let config = CitetraceConfig::default();

        assert!(matches!(config.provider, AdapterKind::Ollama));
        assert_eq!(config.model, "llama3:8b");
        assert_eq!(config.log_level, "debug");
        assert!(!config.cache_enabled);
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/citetrace-test"));
        assert_eq!(config.request_timeout_secs, 60);
        assert_eq!(config.max_tokens, 4096);
        assert_eq!(config.concurrency, 4);
    }

    #[test]
    #[serial]
    fn test_ollama_default_model() {
        let _guards = [
            EnvGuard::set("CITETRACE_PROVIDER", "ollama"),
            EnvGuard::unset("CITETRACE_MODEL"),
        ];

        let config = CitetraceConfig::default();
        assert_eq!(config.model, DEFAULT_OLLAMA_MODEL);
    }

    #[test]
    fn test_parse_provider() {
        assert!(matches!(parse_provider("DeepSeek"), Ok(AdapterKind::DeepSeek)));
        assert!(matches!(parse_provider("claude"), Ok(AdapterKind::Anthropic)));
        assert!(matches!(
            parse_provider("watson"),
            Err(ConfigError::InvalidProvider(_))
        ));
    }

    #[test]
    #[serial]
    fn test_configuration_validation_invalid_timeout() {
        let config = CitetraceConfig {
            request_timeout_secs: 0,
            ..Default::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_configuration_validation_invalid_log_level() {
        let config = CitetraceConfig {
            log_level: "invalid".to_string(),
            ..Default::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_configuration_validation_invalid_max_tokens() {
        let config = CitetraceConfig {
            max_tokens: 256,
            ..Default::default()
        };

        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("512"));
    }

    #[test]
    #[serial]
    fn test_configuration_validation_invalid_concurrency() {
        let config = CitetraceConfig {
            concurrency: 0,
            ..Default::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_config_display() {
        let config = CitetraceConfig::default();
        let display = format!("{}", config);
        assert!(display.contains("Citetrace Configuration:"));
        assert!(display.contains("Concurrency:"));
    }
}
