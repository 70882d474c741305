//! Word tokenization and frequency ranking
//!
//! Tokens are produced by lowercasing and splitting on whitespace. This is
//! independent of whatever subword tokenizer the classifier uses internally.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Number of entries kept in a batch's word-frequency table
pub const DEFAULT_TOP_K: usize = 20;

/// Split text into lowercase whitespace-delimited tokens
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace().map(str::to_lowercase)
}

/// Rank the tokens of an arbitrary sequence and keep the `k` most frequent
pub fn top_k<I, S>(words: I, k: usize) -> WordFrequencyTable
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    words
        .into_iter()
        .map(Into::into)
        .collect::<WordCounter>()
        .into_top_k(k)
}

/// Insertion-ordered token counter
///
/// Remembers the position at which each token was first seen so that ranking
/// can break count ties by first occurrence.
#[derive(Debug, Clone, Default)]
pub struct WordCounter {
    positions: HashMap<String, usize>,
    counts: Vec<(String, u64)>,
    total: u64,
}

impl WordCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one token as-is
    pub fn add(&mut self, token: impl Into<String>) {
        let token = token.into();
        self.total += 1;

        match self.positions.get(&token) {
            Some(&pos) => self.counts[pos].1 += 1,
            None => {
                self.positions.insert(token.clone(), self.counts.len());
                self.counts.push((token, 1));
            }
        }
    }

    /// Tokenize `text` and count every token
    pub fn extend_from_text(&mut self, text: &str) {
        for token in tokenize(text) {
            self.add(token);
        }
    }

    /// Occurrences of `token` seen so far
    pub fn count(&self, token: &str) -> u64 {
        self.positions
            .get(token)
            .map_or(0, |&pos| self.counts[pos].1)
    }

    /// Number of distinct tokens
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    /// Number of tokens counted, including repeats
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// The `k` most frequent tokens, ordered by count descending
    pub fn top_k(&self, k: usize) -> WordFrequencyTable {
        rank(self.counts.clone(), k)
    }

    /// Consuming variant of [`WordCounter::top_k`]
    pub fn into_top_k(self, k: usize) -> WordFrequencyTable {
        rank(self.counts, k)
    }
}

impl<S: Into<String>> Extend<S> for WordCounter {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for token in iter {
            self.add(token);
        }
    }
}

impl<S: Into<String>> FromIterator<S> for WordCounter {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut counter = Self::new();
        counter.extend(iter);
        counter
    }
}

fn rank(mut counts: Vec<(String, u64)>, k: usize) -> WordFrequencyTable {
    // stable: equal counts keep first-occurrence order
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(k);
    WordFrequencyTable { entries: counts }
}

/// Ranked `token -> count` table.
///
/// Serializes as a JSON object whose keys appear in rank order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordFrequencyTable {
    entries: Vec<(String, u64)>,
}

impl WordFrequencyTable {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, token: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|(word, _)| word == token)
            .map(|(_, count)| *count)
    }

    /// Entries in rank order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries
            .iter()
            .map(|(word, count)| (word.as_str(), *count))
    }

    /// Tokens in rank order
    pub fn words(&self) -> Vec<&str> {
        self.entries.iter().map(|(word, _)| word.as_str()).collect()
    }
}

impl Serialize for WordFrequencyTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (word, count) in &self.entries {
            map.serialize_entry(word, count)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for WordFrequencyTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = WordFrequencyTable;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of word to count")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((word, count)) = access.next_entry::<String, u64>()? {
                    entries.push((word, count));
                }
                Ok(WordFrequencyTable { entries })
            }
        }

        deserializer.deserialize_map(TableVisitor)
    }
}
