//! Ngrams command: print the selected n-grams of one length.

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::Args;
use medium_ngrams_core::config::Config;
use medium_ngrams_core::corpus::Corpus;
use medium_ngrams_core::ngrams::NgramSize;
use medium_ngrams_core::pipeline::{NgramReport, analyze_size};
use medium_ngrams_core::selection::Selection;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use super::{corpus_loader, load_corpus, resolve_source};

/// Arguments for the `ngrams` subcommand.
#[derive(Args, Debug)]
pub struct NgramsArgs {
    /// NDJSON record file (overrides the configured source).
    #[arg(long, value_name = "FILE")]
    pub source: Option<Utf8PathBuf>,

    /// Only records with this category label ("all" for every record).
    #[arg(long)]
    pub category: Option<String>,

    /// Phrase length in words.
    #[arg(short = 'n', long, default_value_t = 1)]
    pub size: usize,

    /// Keep n-grams seen at least this many times.
    #[arg(long, conflicts_with = "coverage")]
    pub min_count: Option<i64>,

    /// Keep the most frequent n-grams covering this fraction of occurrences.
    #[arg(long)]
    pub coverage: Option<f64>,

    /// Print at most this many rows.
    #[arg(long)]
    pub limit: Option<usize>,

    /// Stem tokens before counting.
    #[arg(long)]
    pub stem: bool,
}

#[derive(Serialize)]
struct NgramsOutput<'a> {
    category: &'a str,
    documents: usize,
    #[serde(flatten)]
    report: &'a NgramReport,
}

/// Selection from the `--min-count` or `--coverage` flag, validated up front.
fn flag_selection(args: &NgramsArgs) -> anyhow::Result<Option<Selection>> {
    let selection = match (args.min_count, args.coverage) {
        (Some(floor), _) => Some(Selection::minimum_count(floor)?),
        (None, Some(threshold)) => Some(Selection::coverage(threshold)?),
        (None, None) => None,
    };
    Ok(selection)
}

/// The flag selection, falling back to the configured rule for `n`.
fn selection_for(
    flag: Option<Selection>,
    n: NgramSize,
    config: &Config,
    corpus: &Corpus,
) -> anyhow::Result<Selection> {
    match flag {
        Some(selection) => Ok(selection),
        None => Ok(config.selection.rule_for(n).resolve(corpus.len())?),
    }
}

/// Load the corpus and print one length's selected n-grams.
#[instrument(name = "cmd_ngrams", skip_all, fields(n = args.size))]
pub fn cmd_ngrams(
    args: NgramsArgs,
    global_json: bool,
    quiet: bool,
    config: &Config,
) -> anyhow::Result<()> {
    debug!(source = ?args.source, category = ?args.category, "executing ngrams command");

    let n = NgramSize::new(args.size)?;
    let flag = flag_selection(&args)?;
    if flag.is_none() {
        config.validate().context("invalid selection rules")?;
    }
    let source = resolve_source(args.source.as_deref(), config)?;
    let loader = corpus_loader(config, args.stem).category(args.category.as_deref());
    let corpus = load_corpus(&loader, &source, !quiet && !global_json)?;

    let selection = selection_for(flag, n, config, &corpus)?;
    let report = analyze_size(&corpus, n, selection);

    if global_json {
        let output = NgramsOutput {
            category: corpus.category_label(),
            documents: corpus.len(),
            report: &report,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{} {}-grams in {} ({} documents): {} total, {} unique, {} selected by {}",
        "▸".cyan(),
        n,
        corpus.category_label().bold(),
        corpus.len(),
        report.total,
        report.unique,
        report.selected.len().green(),
        report.selection,
    );
    let limit = args.limit.unwrap_or(usize::MAX);
    for entry in report.selected.iter().take(limit) {
        println!("{:>8}  {}", entry.frequency, entry.ngram);
    }
    if report.selected.len() > limit {
        println!(
            "{}",
            format!("… {} more", report.selected.len() - limit).dimmed()
        );
    }

    Ok(())
}
