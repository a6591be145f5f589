pub mod env;
pub mod llm_config;
pub mod match_config;
pub mod progress_config;
