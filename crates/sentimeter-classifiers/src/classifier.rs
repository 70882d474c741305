//! Classifier trait and common types

use async_trait::async_trait;
use sentimeter_core::Result;

/// Trait for all sentiment classifiers
///
/// Implementations are loaded once at start-up and shared read-only between
/// requests, so `classify` must not mutate model state.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify the given text into a probability distribution over
    /// (negative, neutral, positive)
    async fn classify(&self, text: &str) -> Result<ClassificationResult>;

    /// Get the classifier name
    fn name(&self) -> &str;
}

/// Result of classification
#[derive(Debug, Clone)]
pub struct ClassificationResult {
    /// Softmax probabilities indexed by class ordinal (0.0-1.0, sums to ~1.0)
    pub probabilities: Vec<f32>,

    /// Additional metadata
    pub metadata: ClassificationMetadata,

    /// Latency in microseconds
    pub latency_us: u64,
}

impl ClassificationResult {
    /// Create a new classification result
    pub fn new(probabilities: Vec<f32>) -> Self {
        Self {
            probabilities,
            metadata: ClassificationMetadata::default(),
            latency_us: 0,
        }
    }

    /// Index and value of the most probable class.
    ///
    /// Ties resolve to the lowest index. Returns `None` for an empty vector.
    pub fn argmax(&self) -> Option<(usize, f32)> {
        argmax(&self.probabilities)
    }
}

/// Metadata about classification
#[derive(Debug, Clone, Default)]
pub struct ClassificationMetadata {
    /// Model name or version
    pub model: Option<String>,

    /// Number of tokens fed to the model after truncation
    pub input_tokens: Option<usize>,

    /// Additional key-value pairs
    pub extra: Vec<(String, String)>,
}

/// First index holding the maximum value
pub fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    values
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (idx, value)| match best {
            Some((_, best_value)) if value <= best_value => best,
            _ => Some((idx, value)),
        })
}

/// Numerically stable softmax over raw scores
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}
