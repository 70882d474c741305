//! Lightweight lexicon sentiment classifier
//!
//! Used when no transformer model is configured, and as a deterministic
//! backend for tests and benchmarks. Recognises a small set of English and
//! Indonesian polarity words.

use crate::classifier::{softmax, ClassificationMetadata, ClassificationResult, Classifier};
use aho_corasick::{AhoCorasick, MatchKind};
use sentimeter_core::{Error, Result};
use std::time::Instant;

/// Score given to the neutral class before polarity hits are considered
const NEUTRAL_BIAS: f32 = 0.5;

const POSITIVE_WORDS: &[&str] = &[
    "good",
    "great",
    "excellent",
    "love",
    "amazing",
    "wonderful",
    "happy",
    "fantastic",
    "awesome",
    "best",
    "bagus",
    "baik",
    "suka",
    "senang",
    "mantap",
    "puas",
    "keren",
    "hebat",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad",
    "terrible",
    "awful",
    "hate",
    "horrible",
    "worst",
    "sad",
    "angry",
    "disappointed",
    "poor",
    "buruk",
    "jelek",
    "kecewa",
    "benci",
    "parah",
    "lambat",
    "mahal",
    "rusak",
];

pub struct LexiconClassifier {
    name: String,
    positive: AhoCorasick,
    negative: AhoCorasick,
}

impl LexiconClassifier {
    pub fn new() -> Result<Self> {
        Self::with_name("lexicon")
    }

    pub fn with_name(name: impl Into<String>) -> Result<Self> {
        Self::with_words(name, POSITIVE_WORDS, NEGATIVE_WORDS)
    }

    /// Build a classifier over custom polarity word lists
    pub fn with_words(
        name: impl Into<String>,
        positive: &[&str],
        negative: &[&str],
    ) -> Result<Self> {
        let positive = build_matcher(positive)
            .map_err(|e| Error::classifier(format!("Failed to build positive matcher: {e}")))?;
        let negative = build_matcher(negative)
            .map_err(|e| Error::classifier(format!("Failed to build negative matcher: {e}")))?;

        Ok(Self {
            name: name.into(),
            positive,
            negative,
        })
    }

    fn count_words(matcher: &AhoCorasick, text: &str) -> usize {
        matcher
            .find_iter(text)
            .filter(|m| is_word_boundary(text, m.start(), m.end()))
            .count()
    }
}

fn build_matcher(words: &[&str]) -> std::result::Result<AhoCorasick, aho_corasick::BuildError> {
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .match_kind(MatchKind::LeftmostLongest)
        .build(words)
}

/// Only count whole-word hits ("good" must not match inside "goodbye")
fn is_word_boundary(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
}

#[async_trait::async_trait]
impl Classifier for LexiconClassifier {
    async fn classify(&self, text: &str) -> Result<ClassificationResult> {
        let start = Instant::now();

        if text.trim().is_empty() {
            return Err(Error::classifier("cannot classify empty text"));
        }

        let positive_hits = Self::count_words(&self.positive, text) as f32;
        let negative_hits = Self::count_words(&self.negative, text) as f32;

        let probabilities = softmax(&[
            negative_hits - positive_hits,
            NEUTRAL_BIAS,
            positive_hits - negative_hits,
        ]);

        Ok(ClassificationResult {
            probabilities,
            metadata: ClassificationMetadata {
                model: Some("sentiment-lexicon".to_string()),
                extra: vec![
                    ("positive_hits".to_string(), positive_hits.to_string()),
                    ("negative_hits".to_string(), negative_hits.to_string()),
                ],
                ..Default::default()
            },
            latency_us: start.elapsed().as_micros() as u64,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}
