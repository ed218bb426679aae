//! Command implementations.

use std::fs::File;
use std::io::BufReader;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use indicatif::{ProgressBar, ProgressStyle};
use medium_ngrams_core::config::Config;
use medium_ngrams_core::corpus::{Corpus, CorpusLoader};
use medium_ngrams_core::error::LoadError;
use medium_ngrams_core::tokenize::Tokenizer;

pub mod analyze;
pub mod info;
pub mod lookup;
pub mod ngrams;
#[cfg(feature = "mcp")]
pub mod serve;

pub(crate) const BYTES_TEMPLATE: &str = "{spinner:.green} {msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})";
pub(crate) const ITEMS_TEMPLATE: &str = "{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})";

/// Pick the record file: command-line flag first, then configuration.
pub fn resolve_source(flag: Option<&Utf8Path>, config: &Config) -> anyhow::Result<Utf8PathBuf> {
    flag.map(Utf8Path::to_path_buf)
        .or_else(|| config.source.clone())
        .context("no record source: pass --source or set `source` in the configuration")
}

/// A loader configured from `config`, with stemming forced on by `stem_flag`.
pub fn corpus_loader(config: &Config, stem_flag: bool) -> CorpusLoader {
    CorpusLoader::new(Tokenizer::new(config.stem || stem_flag))
        .text_field(config.text_field.as_str())
        .category_field(config.category_field.as_str())
}

/// Load `source` with a byte progress bar (hidden unless `show_progress`).
pub fn load_corpus(
    loader: &CorpusLoader,
    source: &Utf8Path,
    show_progress: bool,
) -> anyhow::Result<Corpus> {
    let file = File::open(source.as_std_path()).map_err(|e| LoadError::Open {
        path: source.to_path_buf(),
        source: e,
    })?;
    let size = file.metadata().map(|m| m.len()).unwrap_or(0);

    let bar = progress_bar(size, BYTES_TEMPLATE, show_progress);
    bar.set_message(format!("reading {source}"));
    let corpus = loader.load_reader(BufReader::new(bar.wrap_read(file)));
    bar.finish_and_clear();

    corpus.with_context(|| format!("failed to load records from {source}"))
}

/// A progress bar for `len` units, hidden when `visible` is false.
pub fn progress_bar(len: u64, template: &str, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::with_template(template) {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}

/// File-name-safe form of a category label.
///
/// Lowercases, maps runs of non-alphanumerics to a single `-`, and trims
/// leading/trailing dashes. An empty result becomes `"category"`.
pub fn category_slug(category: &str) -> String {
    let mut slug = String::with_capacity(category.len());
    for c in category.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        "category".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn slug_normalizes_labels() {
        assert_eq!(category_slug("Painting"), "painting");
        assert_eq!(category_slug("Prints and Drawings"), "prints-and-drawings");
        assert_eq!(category_slug("  Arms & Armor!! "), "arms-armor");
        assert_eq!(category_slug("???"), "category");
    }

    #[test]
    fn source_flag_wins_over_config() {
        let config = Config {
            source: Some("from-config.ndjson".into()),
            ..Config::default()
        };
        let flag = Utf8Path::new("from-flag.ndjson");
        assert_eq!(resolve_source(Some(flag), &config).unwrap(), flag);
        assert_eq!(
            resolve_source(None, &config).unwrap(),
            Utf8Path::new("from-config.ndjson")
        );
    }

    #[test]
    fn missing_source_is_an_error() {
        let err = resolve_source(None, &Config::default()).unwrap_err();
        assert!(err.to_string().contains("--source"));
    }

    #[test]
    fn loads_corpus_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"medium": "Oil on canvas", "classification": "Painting"}}"#).unwrap();
        writeln!(file, r#"{{"medium": "Etching", "classification": "Print"}}"#).unwrap();
        let path = Utf8Path::from_path(file.path()).unwrap();

        let loader = corpus_loader(&Config::default(), false).category(Some("Print"));
        let corpus = load_corpus(&loader, path, false).unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.records_read(), 2);
    }

    #[test]
    fn missing_file_reports_path() {
        let loader = corpus_loader(&Config::default(), false);
        let err = load_corpus(&loader, Utf8Path::new("/nonexistent/records.ndjson"), false)
            .unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/records.ndjson"));
    }
}
