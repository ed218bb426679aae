//! Frequency tallying of extracted n-grams.

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// An n-gram and how often it occurs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct NgramFrequency {
    /// Space-joined tokens.
    pub ngram: String,
    /// Occurrences across the corpus.
    pub frequency: u64,
}

impl NgramFrequency {
    /// Pair a phrase with its count.
    pub fn new<S: Into<String>>(ngram: S, frequency: u64) -> Self {
        Self {
            ngram: ngram.into(),
            frequency,
        }
    }

    /// Number of tokens in the phrase.
    pub fn len(&self) -> usize {
        self.ngram.split(' ').filter(|t| !t.is_empty()).count()
    }

    /// Whether the phrase has no tokens.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Distinct n-gram → occurrence count.
///
/// Keys keep first-encounter order so that sorting by frequency is
/// deterministic for a given input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    counts: IndexMap<String, u64>,
    total: u64,
}

impl Tally {
    /// Count every n-gram in `ngrams` in a single pass.
    pub fn from_ngrams<I>(ngrams: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut tally = Self::default();
        for gram in ngrams {
            tally.add(gram.into());
        }
        tally
    }

    /// Record one occurrence of `ngram`.
    pub fn add(&mut self, ngram: String) {
        *self.counts.entry(ngram).or_insert(0) += 1;
        self.total += 1;
    }

    /// Occurrences of `ngram`, zero if never seen.
    pub fn count(&self, ngram: &str) -> u64 {
        self.counts.get(ngram).copied().unwrap_or(0)
    }

    /// Total n-grams counted (the input sequence length).
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Number of distinct n-grams.
    pub fn unique(&self) -> usize {
        self.counts.len()
    }

    /// Whether nothing was counted.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Entries in first-encounter order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Entries by descending frequency, ties in first-encounter order.
    pub fn sorted(&self) -> Vec<NgramFrequency> {
        let mut entries: Vec<NgramFrequency> = self
            .counts
            .iter()
            .map(|(ngram, &frequency)| NgramFrequency::new(ngram.as_str(), frequency))
            .collect();
        entries.sort_by(|a, b| b.frequency.cmp(&a.frequency));
        entries
    }

    /// Same keys and counts, regardless of encounter order.
    pub fn same_counts(&self, other: &Self) -> bool {
        self.total == other.total
            && self.counts.len() == other.counts.len()
            && self
                .counts
                .iter()
                .all(|(k, v)| other.counts.get(k) == Some(v))
    }
}

impl<S: Into<String>> FromIterator<S> for Tally {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::from_ngrams(iter)
    }
}
