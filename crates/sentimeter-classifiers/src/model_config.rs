//! Model directory description read from a Hugging Face `config.json`

use sentimeter_core::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Number of outputs the sentiment head must have
pub const SENTIMENT_LABELS: usize = 3;

/// Transformer families the loader knows how to build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    Bert,
    DistilBert,
}

/// Subset of `config.json` needed to pick and size a model
#[derive(Debug, Clone, Deserialize)]
pub struct ModelHeader {
    #[serde(default = "default_model_type")]
    pub model_type: String,

    #[serde(default)]
    pub num_labels: Option<usize>,

    /// Label names keyed by stringified index
    #[serde(default)]
    pub id2label: BTreeMap<String, String>,

    #[serde(default)]
    pub hidden_size: Option<usize>,

    /// DistilBERT spells the hidden size `dim`
    #[serde(default)]
    pub dim: Option<usize>,
}

fn default_model_type() -> String {
    "bert".to_string()
}

impl ModelHeader {
    /// Read `config.json` from a model directory
    pub fn from_dir(model_path: &Path) -> Result<Self> {
        let config_path = model_path.join("config.json");
        let content = std::fs::read_to_string(&config_path).map_err(|e| {
            Error::model(format!("Failed to read {}: {}", config_path.display(), e))
        })?;
        Self::from_json(&content)
            .map_err(|e| Error::model(format!("{} ({})", e, config_path.display())))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| Error::model(format!("Failed to parse model config: {}", e)))
    }

    pub fn architecture(&self) -> Result<Architecture> {
        match self.model_type.to_ascii_lowercase().as_str() {
            "bert" => Ok(Architecture::Bert),
            "distilbert" => Ok(Architecture::DistilBert),
            other => Err(Error::model(format!(
                "Unsupported model_type '{}' (supported: bert, distilbert)",
                other
            ))),
        }
    }

    /// Number of classifier outputs declared by the model.
    ///
    /// Hugging Face defaults to two labels when neither field is present.
    pub fn label_count(&self) -> usize {
        self.num_labels
            .or_else(|| (!self.id2label.is_empty()).then_some(self.id2label.len()))
            .unwrap_or(2)
    }

    /// Label names in index order, if the config lists them
    pub fn labels(&self) -> Vec<String> {
        let mut labels: Vec<(usize, &String)> = self
            .id2label
            .iter()
            .filter_map(|(idx, label)| idx.parse().ok().map(|idx| (idx, label)))
            .collect();
        labels.sort_by_key(|(idx, _)| *idx);
        labels.into_iter().map(|(_, label)| label.clone()).collect()
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size.or(self.dim).unwrap_or(768)
    }

    /// Reject models whose head does not produce exactly three classes
    pub fn ensure_sentiment_head(&self) -> Result<()> {
        let count = self.label_count();
        if count != SENTIMENT_LABELS {
            return Err(Error::config(format!(
                "Model has {} output labels, expected {} (negative, neutral, positive)",
                count, SENTIMENT_LABELS
            )));
        }
        Ok(())
    }
}
