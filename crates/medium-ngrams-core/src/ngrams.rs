//! Sliding-window n-gram extraction.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::corpus::Corpus;
use crate::error::ConfigurationError;

/// A validated n-gram length (n ≥ 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct NgramSize(usize);

impl NgramSize {
    /// Single words.
    pub const UNIGRAM: Self = Self(1);

    /// Validate `n`.
    pub const fn new(n: usize) -> Result<Self, ConfigurationError> {
        if n == 0 {
            Err(ConfigurationError::NgramSize(n))
        } else {
            Ok(Self(n))
        }
    }

    /// The window length.
    pub const fn get(self) -> usize {
        self.0
    }
}

impl TryFrom<usize> for NgramSize {
    type Error = ConfigurationError;

    fn try_from(n: usize) -> Result<Self, Self::Error> {
        Self::new(n)
    }
}

impl From<NgramSize> for usize {
    fn from(n: NgramSize) -> Self {
        n.0
    }
}

impl fmt::Display for NgramSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Iterate the n-grams of one document, in offset order.
///
/// Each item is the window's tokens joined by single spaces. Documents
/// shorter than `n` yield nothing.
pub fn ngrams_of(document: &[String], n: NgramSize) -> impl Iterator<Item = String> + '_ {
    document.windows(n.get()).map(|window| window.join(" "))
}

/// Iterate every n-gram in the corpus: document order, then offset order.
pub fn ngrams(corpus: &Corpus, n: NgramSize) -> impl Iterator<Item = String> + '_ {
    corpus
        .documents()
        .iter()
        .flat_map(move |doc| ngrams_of(doc, n))
}

/// Collect every n-gram in the corpus into a flat list.
#[tracing::instrument(skip(corpus), fields(documents = corpus.len()))]
pub fn extract(corpus: &Corpus, n: NgramSize) -> Vec<String> {
    let all: Vec<String> = ngrams(corpus, n).collect();
    tracing::debug!(count = all.len(), "n-grams extracted");
    all
}

/// Number of n-grams the corpus yields for `n`, without building them.
pub fn expected_count(corpus: &Corpus, n: NgramSize) -> usize {
    corpus
        .documents()
        .iter()
        .map(|doc| (doc.len() + 1).saturating_sub(n.get()))
        .sum()
}
