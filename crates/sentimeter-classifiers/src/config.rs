//! Configuration for classifier selection and model loading

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Which classifier backend to load at start-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Fine-tuned transformer loaded from a local model directory
    #[default]
    Transformer,
    /// Keyword lexicon, no model files needed
    Lexicon,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "transformer" | "model" => Ok(Self::Transformer),
            "lexicon" => Ok(Self::Lexicon),
            other => Err(format!(
                "unknown classifier backend '{other}' (expected transformer or lexicon)"
            )),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transformer => f.write_str("transformer"),
            Self::Lexicon => f.write_str("lexicon"),
        }
    }
}

/// Compute device specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceSpec {
    /// CUDA when available, otherwise CPU
    #[default]
    Auto,
    Cpu,
    Cuda,
    Metal,
}

impl FromStr for DeviceSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "cpu" => Ok(Self::Cpu),
            "cuda" | "cuda:0" | "gpu" => Ok(Self::Cuda),
            "metal" | "mps" => Ok(Self::Metal),
            other => Err(format!(
                "unknown device '{other}' (expected auto, cpu, cuda or metal)"
            )),
        }
    }
}

impl fmt::Display for DeviceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Auto => "auto",
            Self::Cpu => "cpu",
            Self::Cuda => "cuda",
            Self::Metal => "metal",
        };
        f.write_str(name)
    }
}

/// Classifier section of the service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Backend to load
    #[serde(default)]
    pub backend: BackendKind,

    /// Local model directory (config.json, tokenizer, model.safetensors)
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// Device to run inference on
    #[serde(default)]
    pub device: DeviceSpec,

    /// Maximum sequence length; longer inputs are truncated
    #[serde(default = "default_max_length")]
    pub max_length: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            model_path: default_model_path(),
            device: DeviceSpec::default(),
            max_length: default_max_length(),
        }
    }
}

fn default_model_path() -> PathBuf {
    PathBuf::from("./model")
}

fn default_max_length() -> usize {
    512
}
