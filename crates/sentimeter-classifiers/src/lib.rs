//! Sentimeter Classifiers
//!
//! Sentiment classifiers and the batch processor that drives them.
//!
//! Two backends implement [`Classifier`]:
//! - a Candle transformer loaded from a local model directory (`ml-models` feature)
//! - a keyword lexicon that needs no model files
//!
//! [`BatchProcessor`] classifies a batch of texts one item at a time and folds
//! the outcomes into a class summary and a word-frequency table.

pub mod batch;
pub mod classifier;
pub mod config;
pub mod lexicon;
pub mod loader;
pub mod model_config;
#[cfg(feature = "ml-models")]
pub mod model_loader;

pub use batch::{BatchOutcome, BatchProcessor};
pub use classifier::{ClassificationMetadata, ClassificationResult, Classifier};
pub use config::{BackendKind, ClassifierConfig, DeviceSpec};
pub use lexicon::LexiconClassifier;
pub use loader::load_classifier;
#[cfg(feature = "ml-models")]
pub use model_loader::TransformerClassifier;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::batch::{BatchOutcome, BatchProcessor};
    pub use crate::classifier::{ClassificationResult, Classifier};
    pub use crate::lexicon::LexiconClassifier;
}
