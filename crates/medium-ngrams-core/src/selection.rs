//! Choosing the "interesting" head of a sorted tally.
//!
//! Two mutually exclusive policies share one entry point, [`select`]:
//!
//! - [`Selection::MinimumCount`] keeps every n-gram seen at least `floor` times.
//! - [`Selection::Coverage`] keeps the most frequent n-grams until they account
//!   for a fraction of all occurrences.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::tally::{NgramFrequency, Tally};

/// Selection policy for one n-gram size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "mode", content = "value")]
pub enum Selection {
    /// Keep entries with frequency ≥ floor.
    MinimumCount(u64),
    /// Keep the head of the list covering this fraction of all occurrences.
    Coverage(f64),
}

impl Selection {
    /// Validated minimum-count policy.
    pub const fn minimum_count(floor: i64) -> Result<Self, ConfigurationError> {
        if floor < 0 {
            Err(ConfigurationError::NegativeFloor(floor))
        } else {
            Ok(Self::MinimumCount(floor as u64))
        }
    }

    /// Validated coverage policy; `threshold` must lie in `[0, 1]`.
    pub fn coverage(threshold: f64) -> Result<Self, ConfigurationError> {
        if threshold.is_finite() && (0.0..=1.0).contains(&threshold) {
            Ok(Self::Coverage(threshold))
        } else {
            Err(ConfigurationError::Coverage(threshold))
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MinimumCount(floor) => write!(f, "frequency >= {floor}"),
            Self::Coverage(threshold) => write!(f, "{:.0}% coverage", threshold * 100.0),
        }
    }
}

/// Apply `selection` to `sorted` (descending by frequency).
///
/// `total` is the number of n-grams the tally was built from; only the
/// coverage policy uses it.
///
/// The coverage walk includes an entry while the running sum *before* it is
/// at most `floor(threshold × total)`, so the last included entry may push the
/// covered sum past the target.
pub fn select(sorted: &[NgramFrequency], total: u64, selection: Selection) -> Vec<NgramFrequency> {
    let picked: Vec<NgramFrequency> = match selection {
        Selection::MinimumCount(floor) => sorted
            .iter()
            .filter(|e| e.frequency >= floor)
            .cloned()
            .collect(),
        Selection::Coverage(threshold) => {
            let target = (threshold * total as f64).floor() as u64;
            let mut running = 0u64;
            sorted
                .iter()
                .take_while(|e| {
                    let keep = running <= target;
                    running += e.frequency;
                    keep
                })
                .cloned()
                .collect()
        }
    };
    picked.into_iter().filter(|e| e.frequency > 0).collect()
}

/// Sort `tally` and apply `selection` to it.
#[tracing::instrument(skip(tally), fields(total = tally.total(), unique = tally.unique()))]
pub fn select_from(tally: &Tally, selection: Selection) -> Vec<NgramFrequency> {
    let picked = select(&tally.sorted(), tally.total(), selection);
    tracing::debug!(selected = picked.len(), "selection applied");
    picked
}

/// Sum of frequencies in `entries`.
pub fn covered(entries: &[NgramFrequency]) -> u64 {
    entries.iter().map(|e| e.frequency).sum()
}
