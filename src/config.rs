//! Configuration for the drum sample classifier
//!
//! Only the model binding and output presentation are configurable. The
//! feature pipeline constants (sample rate, length, framing) are fixed by the
//! trained model and live next to the code that uses them.

use crate::error::{DrumError, Result as DrumErrorResult};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub version: String,
    pub model: ModelConfig,
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            model: ModelConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

/// Model artifact binding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the exported model
    pub path: Option<PathBuf>,
    /// Name of the spectrogram input tensor
    pub input_name: String,
    /// Name of the score output tensor (first output when unset)
    pub output_name: Option<String>,
    /// Threads the runtime may use inside one inference call
    pub intra_threads: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: None,
            input_name: "input".to_string(),
            output_name: None,
            intra_threads: 1,
        }
    }
}

/// How results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Print per-class scores alongside the label
    pub show_scores: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            show_scores: false,
        }
    }
}

/// Validate configuration parameters
pub fn validate_config(config: &Config) -> DrumErrorResult<()> {
    if config.model.intra_threads == 0 {
        return Err(DrumError::ConfigValidation(
            "model.intra_threads must be at least 1".to_string(),
        ));
    }

    if config.model.input_name.trim().is_empty() {
        return Err(DrumError::ConfigValidation(
            "model.input_name must not be empty".to_string(),
        ));
    }

    if let Some(name) = &config.model.output_name {
        if name.trim().is_empty() {
            return Err(DrumError::ConfigValidation(
                "model.output_name must not be empty when set".to_string(),
            ));
        }
    }

    if let Some(path) = &config.model.path {
        if path.as_os_str().is_empty() {
            return Err(DrumError::ConfigValidation(
                "model.path must not be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}

/// Load configuration from JSON file
pub fn load_config<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Config> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: Config = serde_json::from_str(&content)
        .with_context(|| format!("parsing config {}", path.display()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Save configuration to JSON file
pub fn save_config<P: AsRef<std::path::Path>>(config: &Config, path: P) -> anyhow::Result<()> {
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
