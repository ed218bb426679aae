//! Analyze command: select, match and export n-grams per category.

use std::collections::HashMap;

use anyhow::{Context, bail};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use medium_ngrams_core::config::Config;
use medium_ngrams_core::corpus::{ALL_CATEGORIES, CorpusLoader, category_filter};
use medium_ngrams_core::ngrams::NgramSize;
use medium_ngrams_core::pipeline::{self, AnalysisPlan, OutputRow, analyze_corpus};
use medium_ngrams_core::vocabulary::{ElasticsearchVocabulary, VocabularyMatcher, VocabularySearch};
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, error, info, instrument};

use super::{ITEMS_TEMPLATE, category_slug, corpus_loader, load_corpus, progress_bar, resolve_source};
use crate::output::{output_path, write_csv};

/// Arguments for the `analyze` subcommand.
#[derive(Args, Debug, Default)]
pub struct AnalyzeArgs {
    /// NDJSON record file (overrides the configured source).
    #[arg(long, value_name = "FILE")]
    pub source: Option<Utf8PathBuf>,

    /// Category to analyze; repeatable. "all" analyzes every record.
    #[arg(long, value_name = "LABEL")]
    pub category: Vec<String>,

    /// Phrase lengths to analyze (comma-separated, e.g. 1,2,3).
    #[arg(short = 'n', long = "sizes", value_delimiter = ',')]
    pub sizes: Vec<usize>,

    /// Stem tokens before counting.
    #[arg(long)]
    pub stem: bool,

    /// Directory for the CSV files (overrides the configured output_dir).
    #[arg(short, long, value_name = "DIR")]
    pub out: Option<Utf8PathBuf>,

    /// Skip vocabulary matching; vocabulary columns stay empty.
    #[arg(long)]
    pub no_match: bool,
}

/// Per-length outcome within one category.
#[derive(Debug, Serialize)]
struct LengthSummary {
    n: usize,
    total: u64,
    unique: usize,
    selection: String,
    selected: usize,
    matched: usize,
}

/// Outcome of one category run.
#[derive(Debug, Serialize)]
struct CategorySummary {
    category: String,
    records_read: usize,
    documents: usize,
    output: Utf8PathBuf,
    lengths: Vec<LengthSummary>,
}

#[derive(Debug, Serialize)]
struct CategoryFailure {
    category: String,
    error: String,
}

#[derive(Debug, Serialize)]
struct AnalyzeOutput {
    categories: Vec<CategorySummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    failures: Vec<CategoryFailure>,
}

/// Everything a category run needs besides the category itself.
struct Run<'a, S> {
    loader: CorpusLoader,
    source: &'a Utf8Path,
    sizes: &'a [NgramSize],
    config: &'a Config,
    out_dir: &'a Utf8Path,
    matcher: Option<&'a VocabularyMatcher<S>>,
    show_progress: bool,
}

impl<S> Run<'_, S>
where
    S: VocabularySearch + Send + Sync + 'static,
{
    #[instrument(skip(self), fields(source = %self.source))]
    async fn category(&self, category: &str) -> anyhow::Result<CategorySummary> {
        let loader = self.loader.clone().category(Some(category));
        let corpus = load_corpus(&loader, self.source, self.show_progress)?;
        let plan = AnalysisPlan::resolve(self.sizes, &self.config.selection, &corpus)?;
        let label = corpus.category_label();

        let mut rows: Vec<OutputRow> = Vec::new();
        let mut lengths = Vec::new();
        for report in analyze_corpus(&corpus, &plan) {
            let matches = match self.matcher {
                Some(matcher) => {
                    let bar = progress_bar(
                        report.selected.len() as u64,
                        ITEMS_TEMPLATE,
                        self.show_progress,
                    );
                    bar.set_message(format!("matching {label} {}-grams", report.n));
                    let found = matcher.match_batch(&report.selected, || bar.inc(1)).await;
                    bar.finish_and_clear();
                    found
                }
                None => Vec::new(),
            };
            lengths.push(LengthSummary {
                n: report.n,
                total: report.total,
                unique: report.unique,
                selection: report.selection.clone(),
                selected: report.selected.len(),
                matched: matches.iter().flatten().count(),
            });
            rows.extend(pipeline::rows(label, &report, &matches));
        }

        let output = output_path(self.out_dir, &category_slug(label));
        write_csv(&output, &rows)?;
        info!(category = label, rows = rows.len(), %output, "category complete");

        Ok(CategorySummary {
            category: label.to_string(),
            records_read: corpus.records_read(),
            documents: corpus.len(),
            output,
            lengths,
        })
    }

    /// Output file for `category`, before any corpus work.
    fn output_for(&self, category: &str) -> Utf8PathBuf {
        let label = category_filter(category).unwrap_or(ALL_CATEGORIES);
        output_path(self.out_dir, &category_slug(label))
    }

    /// Run every category; a failing category is reported and skipped.
    ///
    /// A category whose output file another category already claimed fails
    /// instead of overwriting it.
    async fn all(&self, categories: &[String]) -> AnalyzeOutput {
        let mut output = AnalyzeOutput {
            categories: Vec::new(),
            failures: Vec::new(),
        };
        let mut claimed: HashMap<Utf8PathBuf, &str> = HashMap::new();
        for category in categories {
            let path = self.output_for(category);
            let result = match claimed.get(&path) {
                Some(earlier) => Err(anyhow::anyhow!(
                    "output {path} is already used by category {earlier:?}"
                )),
                None => {
                    claimed.insert(path, category);
                    self.category(category).await
                }
            };
            match result {
                Ok(summary) => output.categories.push(summary),
                Err(e) => {
                    error!(category = %category, error = %format!("{e:#}"), "category failed");
                    output.failures.push(CategoryFailure {
                        category: category.clone(),
                        error: format!("{e:#}"),
                    });
                }
            }
        }
        output
    }
}

fn sizes(args: &AnalyzeArgs, config: &Config) -> anyhow::Result<Vec<NgramSize>> {
    if args.sizes.is_empty() {
        return Ok(config.sizes.clone());
    }
    args.sizes
        .iter()
        .map(|&n| NgramSize::new(n).map_err(Into::into))
        .collect()
}

fn categories(args: &AnalyzeArgs, config: &Config) -> Vec<String> {
    if args.category.is_empty() {
        config.categories.clone()
    } else {
        args.category.clone()
    }
}

/// Run the full pipeline for each category and write one CSV per category.
///
/// Exits with an error after all categories have run if any of them failed.
#[instrument(name = "cmd_analyze", skip_all, fields(no_match = args.no_match))]
pub async fn cmd_analyze(
    args: AnalyzeArgs,
    global_json: bool,
    quiet: bool,
    config: &Config,
) -> anyhow::Result<()> {
    debug!(source = ?args.source, categories = ?args.category, "executing analyze command");

    config.validate().context("invalid selection rules")?;
    let sizes = sizes(&args, config)?;
    let categories = categories(&args, config);
    let source = resolve_source(args.source.as_deref(), config)?;
    let out_dir = args.out.clone().unwrap_or_else(|| config.output_dir.clone());

    let matcher = if args.no_match {
        None
    } else {
        let vocabulary = ElasticsearchVocabulary::from_config(&config.vocabulary)
            .context("failed to build vocabulary client")?;
        Some(VocabularyMatcher::from_config(vocabulary, &config.vocabulary))
    };

    let run = Run {
        loader: corpus_loader(config, args.stem),
        source: &source,
        sizes: &sizes,
        config,
        out_dir: &out_dir,
        matcher: matcher.as_ref(),
        show_progress: !quiet && !global_json,
    };
    let output = run.all(&categories).await;

    if global_json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_summary(&output);
    }

    if !output.failures.is_empty() {
        bail!(
            "{} of {} categories failed",
            output.failures.len(),
            categories.len()
        );
    }
    Ok(())
}

fn print_summary(output: &AnalyzeOutput) {
    for summary in &output.categories {
        println!(
            "{} {} ({} of {} records) → {}",
            "✓".green(),
            summary.category.bold(),
            summary.documents,
            summary.records_read,
            summary.output.cyan()
        );
        for length in &summary.lengths {
            println!(
                "    n={}  {} selected of {} unique ({}), {} matched",
                length.n,
                length.selected,
                length.unique,
                length.selection.dimmed(),
                length.matched
            );
        }
    }
    for failure in &output.failures {
        eprintln!(
            "{} {}: {}",
            "✗".red(),
            failure.category.bold(),
            failure.error
        );
    }
}
