//! Transformer classifier tests against a real local model.
//!
//! Set `SENTIMETER_TEST_MODEL` to a directory holding a three-label
//! sequence-classification model (config.json, tokenizer.json,
//! model.safetensors). Without it these tests return early.

#![cfg(feature = "ml-models")]

use sentimeter_classifiers::{
    BatchProcessor, Classifier, ClassifierConfig, DeviceSpec, TransformerClassifier,
};
use std::path::PathBuf;
use std::sync::Arc;

fn load_test_model() -> Option<TransformerClassifier> {
    let path = std::env::var("SENTIMETER_TEST_MODEL").ok()?;
    let config = ClassifierConfig {
        model_path: PathBuf::from(path),
        device: DeviceSpec::Cpu,
        max_length: 128,
        ..Default::default()
    };
    Some(TransformerClassifier::load(&config).expect("Failed to load test model"))
}

#[tokio::test]
async fn test_distribution_has_three_classes() {
    let Some(classifier) = load_test_model() else {
        return;
    };

    let result = classifier.classify("Produk ini sangat bagus").await.unwrap();

    assert_eq!(result.probabilities.len(), 3);
    let total: f32 = result.probabilities.iter().sum();
    assert!((total - 1.0).abs() < 0.01, "Scores should sum to ~1.0, got {}", total);
    assert!(result.metadata.input_tokens.is_some());
}

#[tokio::test]
async fn test_long_input_truncation() {
    let Some(classifier) = load_test_model() else {
        return;
    };

    let long_text = "sangat bagus ".repeat(500);
    let result = classifier.classify(&long_text).await.unwrap();

    assert!(result.metadata.input_tokens.unwrap() <= 128);
}

#[tokio::test]
async fn test_batch_with_model_is_deterministic() {
    let Some(classifier) = load_test_model() else {
        return;
    };
    let processor = BatchProcessor::new(Arc::new(classifier));
    let texts = ["Pelayanan buruk sekali", "Biasa saja", "Mantap, puas sekali"];

    let first = processor.predict(&texts).await;
    let second = processor.predict(&texts).await;

    assert_eq!(first, second);
    assert_eq!(first.results.len(), 3);
}
