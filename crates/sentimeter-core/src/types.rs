//! Core types for Sentimeter

use crate::words::WordFrequencyTable;
use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Label reported when a classifier picks an index outside the label map.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Message returned for any request whose `texts` field is not a list
pub const TEXTS_FORMAT_ERROR: &str = "No texts provided or wrong format (should be list).";

/// The three sentiment classes, in the order used to index probability vectors.
///
/// The neutral class is spelled `Netral` on the wire; clients depend on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentimentClass {
    #[serde(rename = "Negative")]
    Negative,
    #[serde(rename = "Netral")]
    Neutral,
    #[serde(rename = "Positive")]
    Positive,
}

impl SentimentClass {
    /// All classes in ordinal order
    pub const ALL: [SentimentClass; 3] = [Self::Negative, Self::Neutral, Self::Positive];

    /// Map a probability-vector index to its class
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Ordinal of this class in a probability vector
    pub fn index(self) -> usize {
        match self {
            Self::Negative => 0,
            Self::Neutral => 1,
            Self::Positive => 2,
        }
    }

    /// Wire label
    pub fn label(self) -> &'static str {
        match self {
            Self::Negative => "Negative",
            Self::Neutral => "Netral",
            Self::Positive => "Positive",
        }
    }
}

impl fmt::Display for SentimentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Class picked for a single text.
///
/// `Unknown` only shows up when a model head has more outputs than the label
/// map, which a correctly configured three-class model never produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictedSentiment {
    Known(SentimentClass),
    Unknown,
}

impl PredictedSentiment {
    pub fn from_index(index: usize) -> Self {
        SentimentClass::from_index(index).map_or(Self::Unknown, Self::Known)
    }

    pub fn class(self) -> Option<SentimentClass> {
        match self {
            Self::Known(class) => Some(class),
            Self::Unknown => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Known(class) => class.label(),
            Self::Unknown => UNKNOWN_LABEL,
        }
    }
}

impl From<SentimentClass> for PredictedSentiment {
    fn from(class: SentimentClass) -> Self {
        Self::Known(class)
    }
}

impl fmt::Display for PredictedSentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for PredictedSentiment {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for PredictedSentiment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(SentimentClass::ALL
            .into_iter()
            .find(|class| class.label() == label)
            .map_or(Self::Unknown, Self::Known))
    }
}

/// Round to two decimal places
pub fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Per-class confidence as percentages, each rounded to two decimals.
///
/// The three values are rounded independently and need not sum to 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassProbabilities {
    pub negative: f64,
    pub netral: f64,
    pub positive: f64,
}

impl ClassProbabilities {
    /// Build from a softmax distribution (values in 0.0-1.0).
    ///
    /// Returns `None` when the distribution has fewer than three entries.
    pub fn from_distribution(probs: &[f32]) -> Option<Self> {
        match probs {
            [negative, netral, positive, ..] => Some(Self {
                negative: as_percentage(*negative),
                netral: as_percentage(*netral),
                positive: as_percentage(*positive),
            }),
            _ => None,
        }
    }

    pub fn get(&self, class: SentimentClass) -> f64 {
        match class {
            SentimentClass::Negative => self.negative,
            SentimentClass::Neutral => self.netral,
            SentimentClass::Positive => self.positive,
        }
    }
}

fn as_percentage(probability: f32) -> f64 {
    round_hundredths(f64::from(probability) * 100.0)
}

/// Outcome for one input text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemResult {
    Success {
        text: String,
        predicted_sentiment: PredictedSentiment,
        negative: f64,
        netral: f64,
        positive: f64,
    },
    Failure {
        text: String,
        error: String,
    },
}

impl ItemResult {
    pub fn success(
        text: impl Into<String>,
        predicted_sentiment: PredictedSentiment,
        probabilities: ClassProbabilities,
    ) -> Self {
        Self::Success {
            text: text.into(),
            predicted_sentiment,
            negative: probabilities.negative,
            netral: probabilities.netral,
            positive: probabilities.positive,
        }
    }

    pub fn failure(text: impl Into<String>, error: impl Into<String>) -> Self {
        Self::Failure {
            text: text.into(),
            error: error.into(),
        }
    }

    /// The input text this result belongs to
    pub fn text(&self) -> &str {
        match self {
            Self::Success { text, .. } | Self::Failure { text, .. } => text,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn predicted_sentiment(&self) -> Option<PredictedSentiment> {
        match self {
            Self::Success {
                predicted_sentiment,
                ..
            } => Some(*predicted_sentiment),
            Self::Failure { .. } => None,
        }
    }

    pub fn probabilities(&self) -> Option<ClassProbabilities> {
        match self {
            Self::Success {
                negative,
                netral,
                positive,
                ..
            } => Some(ClassProbabilities {
                negative: *negative,
                netral: *netral,
                positive: *positive,
            }),
            Self::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error, .. } => Some(error),
        }
    }
}

/// Number of successfully classified texts per class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryCounts {
    #[serde(rename = "Negative")]
    pub negative: u64,
    #[serde(rename = "Netral")]
    pub neutral: u64,
    #[serde(rename = "Positive")]
    pub positive: u64,
}

impl SummaryCounts {
    /// All buckets start at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, class: SentimentClass) {
        *self.bucket_mut(class) += 1;
    }

    pub fn get(&self, class: SentimentClass) -> u64 {
        match class {
            SentimentClass::Negative => self.negative,
            SentimentClass::Neutral => self.neutral,
            SentimentClass::Positive => self.positive,
        }
    }

    pub fn total(&self) -> u64 {
        self.negative + self.neutral + self.positive
    }

    fn bucket_mut(&mut self, class: SentimentClass) -> &mut u64 {
        match class {
            SentimentClass::Negative => &mut self.negative,
            SentimentClass::Neutral => &mut self.neutral,
            SentimentClass::Positive => &mut self.positive,
        }
    }
}

/// Body of `POST /predict`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub texts: Vec<String>,
}

impl PredictionRequest {
    pub fn new<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            texts: texts.into_iter().map(Into::into).collect(),
        }
    }

    /// Validate a raw JSON body.
    ///
    /// `texts` must be present and be a list of strings. An empty list is
    /// accepted.
    pub fn from_json(body: &serde_json::Value) -> Result<Self> {
        let items = body
            .get("texts")
            .and_then(serde_json::Value::as_array)
            .ok_or_else(|| Error::invalid_input(TEXTS_FORMAT_ERROR))?;

        let texts = items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                item.as_str()
                    .map(str::to_owned)
                    .ok_or_else(|| Error::invalid_input(format!("texts[{idx}] is not a string")))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { texts })
    }
}

/// Combined response of `POST /predict`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub results: Vec<ItemResult>,
    pub summary: SummaryCounts,
    pub word_freq: WordFrequencyTable,
}
