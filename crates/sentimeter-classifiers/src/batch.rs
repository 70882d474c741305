//! Batch inference and aggregation
//!
//! Classifies every text of a batch in input order and folds the outcomes
//! into a per-class summary and a word-frequency counter in the same pass.
//! A failing item becomes an error entry in the results; it never aborts the
//! batch.

use crate::classifier::{argmax, Classifier};
use sentimeter_core::{
    ClassProbabilities, Error, ItemResult, PredictedSentiment, PredictionResponse, Result,
    SummaryCounts, WordCounter, DEFAULT_TOP_K,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Raw output of one batch, before the word counter is cut to top-K
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// One entry per input text, in input order
    pub results: Vec<ItemResult>,

    /// Counts of successfully classified items
    pub summary: SummaryCounts,

    /// Tokens of every input text, failed items included
    pub words: WordCounter,

    /// Wall time spent on the batch in microseconds
    pub latency_us: u64,
}

impl BatchOutcome {
    pub fn successes(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failures(&self) -> usize {
        self.results.len() - self.successes()
    }

    /// Rank the word counter and assemble the response payload
    pub fn into_response(self, top_k: usize) -> PredictionResponse {
        PredictionResponse {
            results: self.results,
            summary: self.summary,
            word_freq: self.words.into_top_k(top_k),
        }
    }
}

/// Runs a batch of texts through a shared classifier
#[derive(Clone)]
pub struct BatchProcessor {
    classifier: Arc<dyn Classifier>,
    top_k: usize,
}

impl BatchProcessor {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self {
            classifier,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Set how many words the response's frequency table keeps
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    /// Classify and aggregate `texts`, returning the full response payload
    pub async fn predict<S>(&self, texts: &[S]) -> PredictionResponse
    where
        S: AsRef<str> + Sync,
    {
        self.process(texts).await.into_response(self.top_k)
    }

    /// Classify every text sequentially, in input order
    pub async fn process<S>(&self, texts: &[S]) -> BatchOutcome
    where
        S: AsRef<str> + Sync,
    {
        let start = Instant::now();
        let mut results = Vec::with_capacity(texts.len());
        let mut summary = SummaryCounts::new();
        let mut words = WordCounter::new();

        for (idx, text) in texts.iter().enumerate() {
            let text = text.as_ref();
            let item = self.classify_item(idx, text).await;

            if let Some(class) = item.predicted_sentiment().and_then(PredictedSentiment::class) {
                summary.increment(class);
            }
            words.extend_from_text(text);
            results.push(item);
        }

        let outcome = BatchOutcome {
            results,
            summary,
            words,
            latency_us: start.elapsed().as_micros() as u64,
        };

        info!(
            items = texts.len(),
            failed = outcome.failures(),
            negative = outcome.summary.negative,
            neutral = outcome.summary.neutral,
            positive = outcome.summary.positive,
            latency_us = outcome.latency_us,
            "Batch classified"
        );

        outcome
    }

    async fn classify_item(&self, idx: usize, text: &str) -> ItemResult {
        let classified = match self.classifier.classify(text).await {
            Ok(result) => to_prediction(&result.probabilities)
                .map(|prediction| (prediction, result.latency_us)),
            Err(e) => Err(e),
        };

        match classified {
            Ok(((predicted, probabilities), latency_us)) => {
                debug!(item = idx, sentiment = %predicted, latency_us, "Item classified");
                if predicted == PredictedSentiment::Unknown {
                    warn!(item = idx, "Classifier picked an index outside the label map");
                }
                ItemResult::success(text, predicted, probabilities)
            }
            Err(e) => {
                warn!(item = idx, error = %e, "Item classification failed");
                ItemResult::failure(text, e.to_string())
            }
        }
    }
}

/// Pick the predicted class and convert the distribution to percentages
fn to_prediction(probs: &[f32]) -> Result<(PredictedSentiment, ClassProbabilities)> {
    let probabilities = ClassProbabilities::from_distribution(probs).ok_or_else(|| {
        Error::classifier(format!(
            "classifier returned {} probabilities, expected 3",
            probs.len()
        ))
    })?;

    let predicted = argmax(probs).map_or(PredictedSentiment::Unknown, |(idx, _)| {
        PredictedSentiment::from_index(idx)
    });

    Ok((predicted, probabilities))
}
