//! Start-up construction of the process-wide classifier

use crate::classifier::Classifier;
use crate::config::{BackendKind, ClassifierConfig};
use crate::lexicon::LexiconClassifier;
use sentimeter_core::Result;
use std::sync::Arc;
use tracing::info;

/// Build the classifier selected by `config`.
///
/// Called once at start-up; the returned handle is shared read-only by every
/// request.
pub fn load_classifier(config: &ClassifierConfig) -> Result<Arc<dyn Classifier>> {
    match config.backend {
        BackendKind::Lexicon => {
            info!("Using lexicon sentiment classifier");
            Ok(Arc::new(LexiconClassifier::new()?))
        }
        BackendKind::Transformer => load_transformer(config),
    }
}

#[cfg(feature = "ml-models")]
fn load_transformer(config: &ClassifierConfig) -> Result<Arc<dyn Classifier>> {
    let classifier = crate::model_loader::TransformerClassifier::load(config)?;
    Ok(Arc::new(classifier))
}

#[cfg(not(feature = "ml-models"))]
fn load_transformer(_config: &ClassifierConfig) -> Result<Arc<dyn Classifier>> {
    Err(sentimeter_core::Error::config(
        "transformer backend requires the 'ml-models' feature",
    ))
}
