//! Core library for medium-ngrams.
//!
//! This crate provides the n-gram analysis used by the `medium-ngrams` CLI
//! and any downstream consumers: loading artwork medium descriptions,
//! tokenizing them, counting n-grams, selecting the frequent ones, and
//! matching those against a controlled vocabulary.
//!
//! # Modules
//!
//! - [`config`] - Configuration loading and management
//! - [`corpus`] - Loading and filtering record streams
//! - [`error`] - Error types and result aliases
//! - [`ngrams`] - Contiguous n-gram extraction
//! - [`pipeline`] - Per-n analysis and output rows
//! - [`selection`] - Frequency floor and coverage selection
//! - [`tally`] - Frequency counting
//! - [`tokenize`] - Word segmentation and optional stemming
//! - [`vocabulary`] - Vocabulary search and match classification
//!
//! # Quick Start
//!
//! ```no_run
//! use medium_ngrams_core::{ConfigLoader, CorpusLoader, NgramSize, Selection, Tokenizer};
//! use medium_ngrams_core::pipeline::analyze_size;
//! use camino::Utf8Path;
//!
//! let (config, _sources) = ConfigLoader::new()
//!     .with_user_config(true)
//!     .load()
//!     .expect("Failed to load configuration");
//!
//! let corpus = CorpusLoader::new(Tokenizer::new(config.stem))
//!     .category(Some("Painting"))
//!     .load_path(Utf8Path::new("artworks.ndjson"))
//!     .expect("Failed to load corpus");
//!
//! let report = analyze_size(&corpus, NgramSize::UNIGRAM, Selection::MinimumCount(2));
//! for entry in &report.selected {
//!     println!("{}\t{}", entry.frequency, entry.ngram);
//! }
//! ```
#![deny(unsafe_code)]

pub mod config;
pub mod corpus;
pub mod error;
pub mod ngrams;
pub mod pipeline;
pub mod selection;
pub mod tally;
pub mod tokenize;
pub mod vocabulary;

pub use config::{Config, ConfigLoader, LogLevel, SelectionConfig, SelectionRule, VocabularyConfig};
pub use corpus::{Corpus, CorpusLoader, Document};
pub use error::{
    ConfigError, ConfigResult, ConfigurationError, LoadError, LoadResult, SearchError,
    SearchResult,
};
pub use ngrams::NgramSize;
pub use pipeline::{AnalysisPlan, NgramReport, OutputRow};
pub use selection::Selection;
pub use tally::{NgramFrequency, Tally};
pub use tokenize::Tokenizer;
pub use vocabulary::{
    ElasticsearchVocabulary, MatchQuality, VocabularyEntry, VocabularyMatch, VocabularyMatcher,
    VocabularySearch,
};
