pub mod annotator;
pub mod generator;
pub mod llm_client;
pub mod suggestions;

pub use annotator::{ExplanationAnnotator, FALLBACK_EXPLANATION};
pub use generator::{TextGenerator, TextPrompt};
pub use llm_client::LlmClient;
