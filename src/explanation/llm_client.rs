// src/explanation/llm_client.rs
// HTTP clients for the text-generation service (OpenAI-compatible chat
// completions or a local OLLAMA server).

use anyhow::{anyhow, Context, Result};
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Duration};

use crate::explanation::generator::{TextGenerator, TextPrompt};
use crate::utils::llm_config::{LlmConfig, LlmProvider};

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OLLAMA API request structure
#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// OLLAMA API response structure
#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

#[derive(Debug, Clone)]
pub struct LlmClient {
    http_client: Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("Failed to build HTTP client for text generation")?;
        Ok(Self { http_client, config })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    async fn attempt_openai(&self, prompt: &TextPrompt) -> Result<String> {
        let api_key = self
            .config
            .openai_api_key
            .as_deref()
            .ok_or_else(|| anyhow!("OPENAI_API_KEY is not configured"))?;

        let request = ChatCompletionRequest {
            model: &self.config.openai_model,
            messages: vec![
                ChatMessage { role: "system", content: &prompt.system },
                ChatMessage { role: "user", content: &prompt.user },
            ],
            max_tokens: prompt.max_tokens,
            temperature: prompt.temperature,
        };

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.config.openai_base_url.trim_end_matches('/')))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to OpenAI")?;

        if !response.status().is_success() {
            return Err(anyhow!("OpenAI returned status: {}", response.status()));
        }

        let completion: ChatCompletionResponse = response.json().await.context("Failed to parse OpenAI response")?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| anyhow!("OpenAI response contained no message content"))
    }

    async fn attempt_ollama(&self, prompt: &TextPrompt) -> Result<String> {
        let request = OllamaRequest {
            model: &self.config.ollama_model,
            system: &prompt.system,
            prompt: &prompt.user,
            stream: false,
            options: OllamaOptions {
                temperature: prompt.temperature,
                num_predict: prompt.max_tokens,
            },
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.config.ollama_url.trim_end_matches('/')))
            .json(&request)
            .send()
            .await
            .context("Failed to send request to OLLAMA")?;

        if !response.status().is_success() {
            return Err(anyhow!("OLLAMA returned status: {}", response.status()));
        }

        let ollama_response: OllamaResponse = response.json().await.context("Failed to parse OLLAMA response")?;
        Ok(ollama_response.response.trim().to_string())
    }

    async fn attempt(&self, prompt: &TextPrompt) -> Result<String> {
        match self.config.provider {
            LlmProvider::OpenAi => self.attempt_openai(prompt).await,
            LlmProvider::Ollama => self.attempt_ollama(prompt).await,
        }
    }

    async fn generate_with_retries(&self, prompt: &TextPrompt) -> Result<String> {
        let attempts = self.config.max_retries.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match self.attempt(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    last_error = Some(e);
                    if attempt < attempts {
                        debug!("Text generation attempt {} failed, retrying...", attempt);
                        sleep(Duration::from_millis(500 * attempt as u64)).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow!("Text generation made no attempts")))
    }
}

impl TextGenerator for LlmClient {
    fn generate(&self, prompt: &TextPrompt) -> impl std::future::Future<Output = Result<String>> + Send {
        self.generate_with_retries(prompt)
    }
}
