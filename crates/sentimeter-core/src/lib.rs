//! Sentimeter Core
//!
//! Core types and utilities shared across Sentimeter components.
//!
//! This crate provides:
//! - The wire data model for batch sentiment prediction
//! - Error types and result handling
//! - Whitespace word tokenization and top-K frequency ranking

pub mod error;
pub mod types;
pub mod words;

pub use error::{Error, Result};
pub use types::{
    ClassProbabilities, ItemResult, PredictedSentiment, PredictionRequest, PredictionResponse,
    SentimentClass, SummaryCounts,
};
pub use words::{WordCounter, WordFrequencyTable, DEFAULT_TOP_K};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{ItemResult, PredictedSentiment, SentimentClass, SummaryCounts};
    pub use crate::words::{WordCounter, WordFrequencyTable};
}
