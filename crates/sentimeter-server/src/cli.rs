//! Command-line interface

use clap::Parser;
use sentimeter_classifiers::{BackendKind, DeviceSpec};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "sentimeter-server")]
#[command(about = "Batch sentiment prediction service", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "SENTIMETER_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Listen address
    #[arg(short = 'H', long, env = "SENTIMETER_HOST")]
    pub host: Option<String>,

    /// Listen port
    #[arg(short = 'P', long, env = "SENTIMETER_PORT")]
    pub port: Option<u16>,

    /// Directory holding the fine-tuned model
    #[arg(short, long, env = "SENTIMETER_MODEL_PATH")]
    pub model_path: Option<PathBuf>,

    /// Classifier backend (transformer or lexicon)
    #[arg(short, long, env = "SENTIMETER_BACKEND")]
    pub backend: Option<BackendKind>,

    /// Inference device (auto, cpu, cuda, metal)
    #[arg(short, long, env = "SENTIMETER_DEVICE")]
    pub device: Option<DeviceSpec>,

    /// Enable verbose logging
    #[arg(short, long, env = "SENTIMETER_VERBOSE")]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, env = "SENTIMETER_LOG_JSON")]
    pub log_json: bool,
}
