// src/explanation/generator.rs

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;

/// A structured request for the external text-generation service.
#[derive(Debug, Clone, PartialEq)]
pub struct TextPrompt {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl TextPrompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            max_tokens: 400,
            temperature: 0.7,
        }
    }

    pub fn with_limits(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }
}

/// Seam to the LLM service. Implementations return the raw completion text.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &TextPrompt) -> impl Future<Output = Result<String>> + Send;
}

impl<G: TextGenerator> TextGenerator for Arc<G> {
    fn generate(&self, prompt: &TextPrompt) -> impl Future<Output = Result<String>> + Send {
        self.as_ref().generate(prompt)
    }
}
