//! Controlled-vocabulary lookup and match classification.
//!
//! The vocabulary itself lives in an external full-text search index. This
//! module defines the seam to it ([`VocabularySearch`]), an Elasticsearch
//! implementation, and the logic that decides whether a ranked candidate is an
//! exact or synonym match for a phrase.

pub mod elasticsearch;
pub mod matcher;

use std::fmt;
use std::future::Future;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::SearchResult;

pub use elasticsearch::ElasticsearchVocabulary;
pub use matcher::{RetryPolicy, VocabularyMatcher};

/// Number of ranked candidates inspected per phrase.
pub const DEFAULT_CANDIDATES: usize = 5;

/// One controlled-vocabulary record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct VocabularyEntry {
    /// Identifier in the index (AAT subject id).
    pub id: String,
    /// Preferred term.
    pub name: String,
    /// Scope note describing the term.
    #[serde(default)]
    pub scope_note: Option<String>,
    /// Alternate terms.
    #[serde(default)]
    pub terms: Vec<String>,
    /// Facet the record belongs to (e.g. "Materials").
    #[serde(default)]
    pub facet: Option<String>,
    /// Record type (e.g. "Concept", "Guide term").
    #[serde(default)]
    pub record_type: Option<String>,
}

/// How a phrase relates to the chosen vocabulary entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MatchQuality {
    /// Phrase equals the preferred name.
    Exact,
    /// Phrase equals one of the alternate terms.
    Synonym,
}

impl MatchQuality {
    /// Returns the quality as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Synonym => "synonym",
        }
    }
}

impl fmt::Display for MatchQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A phrase's chosen vocabulary entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct VocabularyMatch {
    /// The entry that matched.
    pub entry: VocabularyEntry,
    /// Whether it matched by name or by alternate term.
    pub quality: MatchQuality,
}

/// A ranked full-text search over vocabulary entries.
pub trait VocabularySearch {
    /// Return up to `size` entries for `query`, best first.
    fn search(
        &self,
        query: &str,
        size: usize,
    ) -> impl Future<Output = SearchResult<Vec<VocabularyEntry>>> + Send;
}

/// Trim and lowercase for comparison.
pub fn normalize(term: &str) -> String {
    term.trim().to_lowercase()
}

/// Pick the first candidate, in rank order, that matches `query`.
///
/// For each candidate the preferred name is checked before alternate terms,
/// so a name match is always reported as [`MatchQuality::Exact`].
pub fn classify(query: &str, candidates: &[VocabularyEntry]) -> Option<VocabularyMatch> {
    let query = normalize(query);
    candidates.iter().find_map(|candidate| {
        let quality = if normalize(&candidate.name) == query {
            MatchQuality::Exact
        } else if candidate.terms.iter().any(|t| normalize(t) == query) {
            MatchQuality::Synonym
        } else {
            return None;
        };
        Some(VocabularyMatch {
            entry: candidate.clone(),
            quality,
        })
    })
}
