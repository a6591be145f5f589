// src/utils/env.rs
use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};

const ENV_PATHS: [&str; 3] = [".env", ".env.local", "../.env"];

/// Loads the first env file found. Variables already present in the process
/// environment are never overwritten.
pub fn load_env() {
    let mut loaded_env = false;
    for path in ENV_PATHS.iter() {
        if Path::new(path).exists() {
            if let Err(e) = load_env_from_file(path) {
                warn!("Failed to load environment from {}: {}", path, e);
            } else {
                info!("Loaded environment variables from {}", path);
                loaded_env = true;
                break;
            }
        }
    }
    if !loaded_env {
        info!("No .env file found, using environment variables from system");
    }
}

pub fn load_env_from_file(file_path: impl AsRef<Path>) -> Result<()> {
    let path = file_path.as_ref();
    dotenv::from_path(path).with_context(|| format!("Failed to parse env file {}", path.display()))?;
    Ok(())
}
