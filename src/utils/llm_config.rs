// src/utils/llm_config.rs
use std::env;
use std::time::Duration;

use log::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAi,
    Ollama,
}

impl LlmProvider {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "openai" => Some(LlmProvider::OpenAi),
            "ollama" => Some(LlmProvider::Ollama),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub enabled: bool,
    pub provider: LlmProvider,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub ollama_url: String,
    pub ollama_model: String,
    pub request_timeout: Duration,
    /// Total attempts per call; 1 means no retry.
    pub max_retries: usize,
    pub max_concurrent_requests: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: LlmProvider::OpenAi,
            openai_api_key: None,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            openai_model: "gpt-3.5-turbo".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            ollama_model: "llama3.1".to_string(),
            request_timeout: Duration::from_secs(10),
            max_retries: 1,
            max_concurrent_requests: num_cpus::get().min(8),
        }
    }
}

impl LlmConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let enabled = env::var("LLM_ENABLED")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .unwrap_or(false);

        let provider = match env::var("LLM_PROVIDER") {
            Ok(raw) => LlmProvider::parse(&raw).unwrap_or_else(|| {
                warn!("Unknown LLM_PROVIDER '{}', falling back to openai", raw);
                LlmProvider::OpenAi
            }),
            Err(_) => defaults.provider,
        };

        let timeout_secs = env::var("LLM_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(defaults.request_timeout.as_secs());

        Self {
            enabled,
            provider,
            openai_api_key: env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            openai_base_url: env::var("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            openai_model: env::var("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            ollama_url: env::var("OLLAMA_URL").unwrap_or(defaults.ollama_url),
            ollama_model: env::var("OLLAMA_MODEL").unwrap_or(defaults.ollama_model),
            request_timeout: Duration::from_secs(timeout_secs.max(1)),
            max_retries: env::var("LLM_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(defaults.max_retries)
                .max(1),
            max_concurrent_requests: env::var("LLM_CONCURRENCY")
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(defaults.max_concurrent_requests)
                .max(1),
        }
    }

    pub fn log_config(&self) {
        if self.enabled {
            info!("💬 Text generation ENABLED ({:?})", self.provider);
            match self.provider {
                LlmProvider::OpenAi => {
                    info!("   Model: {} at {}", self.openai_model, self.openai_base_url);
                    if self.openai_api_key.is_none() {
                        warn!("   OPENAI_API_KEY is not set, every call will fall back to templates");
                    }
                }
                LlmProvider::Ollama => info!("   Model: {} at {}", self.ollama_model, self.ollama_url),
            }
            info!(
                "   Timeout: {:?}, attempts: {}, concurrency: {}",
                self.request_timeout, self.max_retries, self.max_concurrent_requests
            );
        } else {
            info!("💬 Text generation DISABLED - explanations omitted, templates only where required");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parse() {
        assert_eq!(LlmProvider::parse("OpenAI"), Some(LlmProvider::OpenAi));
        assert_eq!(LlmProvider::parse(" ollama "), Some(LlmProvider::Ollama));
        assert_eq!(LlmProvider::parse("other"), None);
    }

    #[test]
    fn test_defaults() {
        let config = LlmConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert!(config.max_concurrent_requests >= 1 && config.max_concurrent_requests <= 8);
    }
}
