//! Service configuration

use crate::cli::Cli;
use anyhow::Context;
use sentimeter_classifiers::ClassifierConfig;
use sentimeter_core::DEFAULT_TOP_K;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

/// Top-level configuration, read from YAML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,
}

impl ServiceConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(config_path: &str, cli: &Cli) -> anyhow::Result<Self> {
        // Missing file means defaults
        let mut config = if Path::new(config_path).exists() {
            let content = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read {config_path}"))?;
            Self::from_yaml(&content).with_context(|| format!("Invalid config {config_path}"))?
        } else {
            Self::default()
        };

        config.apply_overrides(cli);
        config.validate()?;

        Ok(config)
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply CLI flags on top of file values
    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(host) = &cli.host {
            self.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.server.port = port;
        }
        if let Some(model_path) = &cli.model_path {
            self.classifier.model_path = model_path.clone();
        }
        if let Some(backend) = cli.backend {
            self.classifier.backend = backend;
        }
        if let Some(device) = cli.device {
            self.classifier.device = device;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.limits.max_batch_size == 0 {
            anyhow::bail!("limits.max_batch_size must be at least 1");
        }
        if self.limits.top_k_words == 0 {
            anyhow::bail!("limits.top_k_words must be at least 1");
        }
        if self.classifier.max_length == 0 {
            anyhow::bail!("classifier.max_length must be at least 1");
        }
        self.server.socket_addr()?;
        Ok(())
    }
}

/// Listener and HTTP middleware settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.host, self.port))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Per-request limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Largest accepted `texts` list
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Entries kept in `word_freq`
    #[serde(default = "default_top_k_words")]
    pub top_k_words: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_batch_size: default_max_batch_size(),
            top_k_words: default_top_k_words(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_max_body_bytes() -> usize {
    2 * 1024 * 1024
}

fn default_max_batch_size() -> usize {
    1000
}

fn default_top_k_words() -> usize {
    DEFAULT_TOP_K
}
