//! End-to-end n-gram analysis of a loaded corpus.
//!
//! For each requested n: extract, tally, sort, select. Vocabulary matching is
//! a separate async step over the selected entries; [`rows`] joins the two
//! into output records.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::SelectionConfig;
use crate::corpus::Corpus;
use crate::error::ConfigurationError;
use crate::ngrams::{NgramSize, ngrams};
use crate::selection::{Selection, covered, select};
use crate::tally::{NgramFrequency, Tally};
use crate::vocabulary::{MatchQuality, VocabularyMatch};

/// The n values to analyze and the policy for each, resolved for one corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisPlan {
    steps: Vec<(NgramSize, Selection)>,
}

impl AnalysisPlan {
    /// A plan from explicit `(n, selection)` pairs.
    pub const fn new(steps: Vec<(NgramSize, Selection)>) -> Self {
        Self { steps }
    }

    /// Resolve configured per-n rules against `corpus`.
    ///
    /// Fails before any extraction work if a rule is invalid.
    pub fn resolve(
        sizes: &[NgramSize],
        rules: &SelectionConfig,
        corpus: &Corpus,
    ) -> Result<Self, ConfigurationError> {
        let steps = sizes
            .iter()
            .map(|&n| Ok((n, rules.rule_for(n).resolve(corpus.len())?)))
            .collect::<Result<Vec<_>, ConfigurationError>>()?;
        Ok(Self { steps })
    }

    /// Planned `(n, selection)` pairs, in order.
    pub fn steps(&self) -> &[(NgramSize, Selection)] {
        &self.steps
    }
}

/// Selected n-grams of one length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NgramReport {
    /// Phrase length.
    pub n: usize,
    /// Total n-grams extracted.
    pub total: u64,
    /// Distinct n-grams.
    pub unique: usize,
    /// Policy that produced `selected`, human-readable.
    pub selection: String,
    /// Occurrences covered by the selected entries.
    pub covered: u64,
    /// Selected entries, most frequent first.
    pub selected: Vec<NgramFrequency>,
}

/// Extract, tally and select n-grams of length `n`.
#[tracing::instrument(skip(corpus, selection), fields(documents = corpus.len(), %selection))]
pub fn analyze_size(corpus: &Corpus, n: NgramSize, selection: Selection) -> NgramReport {
    let tally = Tally::from_ngrams(ngrams(corpus, n));
    let selected = select(&tally.sorted(), tally.total(), selection);

    tracing::info!(
        n = n.get(),
        total = tally.total(),
        unique = tally.unique(),
        selected = selected.len(),
        "n-grams selected"
    );

    NgramReport {
        n: n.get(),
        total: tally.total(),
        unique: tally.unique(),
        selection: selection.to_string(),
        covered: covered(&selected),
        selected,
    }
}

/// Run every step of `plan` over `corpus`.
pub fn analyze_corpus(corpus: &Corpus, plan: &AnalysisPlan) -> Vec<NgramReport> {
    plan.steps()
        .iter()
        .map(|&(n, selection)| analyze_size(corpus, n, selection))
        .collect()
}

/// One output record: an n-gram with its optional vocabulary match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct OutputRow {
    /// Phrase length in tokens.
    pub length: usize,
    /// Category label, `"all"` when unfiltered.
    pub category: String,
    /// The phrase.
    pub ngram: String,
    /// Raw occurrence count.
    pub frequency: u64,
    /// Matched vocabulary id.
    pub aat_id: Option<String>,
    /// Matched preferred name.
    pub aat_name: Option<String>,
    /// Matched facet.
    pub aat_facet: Option<String>,
    /// Matched record type.
    pub aat_record_type: Option<String>,
    /// Match quality.
    #[serde(rename = "match")]
    pub quality: Option<MatchQuality>,
}

impl OutputRow {
    /// Build a row from a selected entry and its match, if any.
    pub fn new(
        category: &str,
        n: usize,
        entry: &NgramFrequency,
        matched: Option<&VocabularyMatch>,
    ) -> Self {
        let field = |f: fn(&VocabularyMatch) -> Option<String>| matched.and_then(f);
        Self {
            length: n,
            category: category.to_string(),
            ngram: entry.ngram.clone(),
            frequency: entry.frequency,
            aat_id: field(|m| Some(m.entry.id.clone())),
            aat_name: field(|m| Some(m.entry.name.clone())),
            aat_facet: field(|m| m.entry.facet.clone()),
            aat_record_type: field(|m| m.entry.record_type.clone()),
            quality: matched.map(|m| m.quality),
        }
    }
}

/// Join a report's selected entries with their matches (same order).
///
/// A shorter `matches` slice leaves the remaining rows unmatched.
pub fn rows(category: &str, report: &NgramReport, matches: &[Option<VocabularyMatch>]) -> Vec<OutputRow> {
    report
        .selected
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let matched = matches.get(i).and_then(Option::as_ref);
            OutputRow::new(category, report.n, entry, matched)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SelectionRule;
    use crate::tokenize::tokenize;
    use crate::vocabulary::tests::entry;

    fn scenario() -> Corpus {
        ["oil on canvas", "oil on board", "acrylic on canvas"]
            .iter()
            .map(|t| tokenize(t, false))
            .collect()
    }

    fn size(n: usize) -> NgramSize {
        NgramSize::new(n).unwrap()
    }

    #[test]
    fn unigram_minimum_count_scenario() {
        let report = analyze_size(&scenario(), size(1), Selection::MinimumCount(2));
        assert_eq!(report.total, 9);
        assert_eq!(report.unique, 5);
        let names: Vec<_> = report.selected.iter().map(|e| e.ngram.as_str()).collect();
        assert_eq!(names, vec!["on", "oil", "canvas"]);
        assert_eq!(report.covered, 7);
    }

    #[test]
    fn bigram_coverage_scenario() {
        let report = analyze_size(&scenario(), size(2), Selection::Coverage(0.5));
        assert_eq!(report.total, 6);
        assert_eq!(
            report.selected,
            vec![NgramFrequency::new("oil on", 2), NgramFrequency::new("on canvas", 2)]
        );
    }

    #[test]
    fn plan_resolves_per_n_rules() {
        let rules = SelectionConfig {
            unigram: SelectionRule::MinimumCount { floor: 2 },
            bigram: SelectionRule::Coverage { threshold: 0.5 },
            ..SelectionConfig::default()
        };
        let corpus = scenario();
        let plan = AnalysisPlan::resolve(&[size(1), size(2)], &rules, &corpus).unwrap();
        assert_eq!(
            plan.steps(),
            &[
                (size(1), Selection::MinimumCount(2)),
                (size(2), Selection::Coverage(0.5))
            ]
        );
        let reports = analyze_corpus(&corpus, &plan);
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[1].selected.len(), 2);
    }

    #[test]
    fn plan_rejects_invalid_rule() {
        let rules = SelectionConfig::uniform(SelectionRule::Coverage { threshold: 2.0 });
        let err = AnalysisPlan::resolve(&[size(1)], &rules, &scenario()).unwrap_err();
        assert_eq!(err, ConfigurationError::Coverage(2.0));
    }

    #[test]
    fn document_share_floor_from_document_count() {
        let rules = SelectionConfig::uniform(SelectionRule::DocumentShare { percent: 50.0 });
        // 3 documents → floor 1
        let plan = AnalysisPlan::resolve(&[size(2)], &rules, &scenario()).unwrap();
        assert_eq!(plan.steps()[0].1, Selection::MinimumCount(1));
    }

    #[test]
    fn short_documents_do_not_fail() {
        let corpus: Corpus = [vec!["bronze".to_string()]].into_iter().collect();
        let report = analyze_size(&corpus, size(2), Selection::MinimumCount(0));
        assert_eq!(report.total, 0);
        assert!(report.selected.is_empty());
    }

    #[test]
    fn rows_join_matches_by_position() {
        let report = analyze_size(&scenario(), size(1), Selection::MinimumCount(2));
        let matches = vec![
            None,
            Some(VocabularyMatch {
                entry: entry("300015050", "oil", &[]),
                quality: MatchQuality::Exact,
            }),
        ];
        let out = rows("Painting", &report, &matches);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].ngram, "on");
        assert!(out[0].aat_id.is_none());
        assert_eq!(out[1].aat_id.as_deref(), Some("300015050"));
        assert_eq!(out[1].aat_facet.as_deref(), Some("Materials"));
        assert_eq!(out[1].quality, Some(MatchQuality::Exact));
        assert_eq!(out[1].category, "Painting");
        assert_eq!(out[1].length, 1);
        assert!(out[2].quality.is_none());
    }

    #[test]
    fn row_serializes_match_column() {
        let row = OutputRow::new("all", 2, &NgramFrequency::new("gold leaf", 4), None);
        let json = serde_json::to_value(&row).unwrap();
        assert!(json["match"].is_null());
        assert_eq!(json["frequency"], 4);
    }
}
