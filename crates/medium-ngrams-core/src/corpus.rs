//! Corpus loading from newline-delimited JSON records.
//!
//! A [`Corpus`] can only be obtained from [`CorpusLoader`], which reads the
//! whole source in one streaming pass and either returns a fully loaded,
//! immutable corpus or a [`LoadError`]. Only tokenized documents are kept in
//! memory; raw records are dropped as soon as they are read.
//!
//! # Example
//! ```
//! use medium_ngrams_core::corpus::CorpusLoader;
//! use medium_ngrams_core::tokenize::Tokenizer;
//!
//! let records = r#"{"medium": "Oil on canvas", "classification": "Painting"}
//! {"medium": "Etching", "classification": "Print"}
//! "#;
//! let corpus = CorpusLoader::new(Tokenizer::default())
//!     .category(Some("Painting"))
//!     .load_reader(records.as_bytes())
//!     .unwrap();
//! assert_eq!(corpus.len(), 1);
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};

use camino::Utf8Path;
use serde_json::{Map, Value};

use crate::error::{LoadError, LoadResult};
use crate::tokenize::Tokenizer;

/// Category value meaning "every record, unfiltered".
pub const ALL_CATEGORIES: &str = "all";

/// Default name of the free-text field.
pub const DEFAULT_TEXT_FIELD: &str = "medium";

/// Default name of the category label field.
pub const DEFAULT_CATEGORY_FIELD: &str = "classification";

/// Returns `None` for the "all" sentinel (any case), otherwise the filter.
pub fn category_filter(category: &str) -> Option<&str> {
    if category.eq_ignore_ascii_case(ALL_CATEGORIES) {
        None
    } else {
        Some(category)
    }
}

/// One tokenized record.
pub type Document = Vec<String>;

/// The tokenized documents retained for one loader configuration.
///
/// Built by [`CorpusLoader`] from a record stream, or collected from
/// already-tokenized documents (unfiltered, default tokenizer). Read-only
/// once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Corpus {
    documents: Vec<Document>,
    category: Option<String>,
    tokenizer: Tokenizer,
    records_read: usize,
}

impl Corpus {
    /// Retained documents, in source order.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Number of retained documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether no document was retained.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Category filter the corpus was loaded with, if any.
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Label for output rows: the category, or `"all"` when unfiltered.
    pub fn category_label(&self) -> &str {
        self.category.as_deref().unwrap_or(ALL_CATEGORIES)
    }

    /// Tokenizer settings used for every document.
    pub const fn tokenizer(&self) -> Tokenizer {
        self.tokenizer
    }

    /// Number of records read from the source, retained or not.
    pub const fn records_read(&self) -> usize {
        self.records_read
    }

    /// Total number of tokens across all documents.
    pub fn token_count(&self) -> usize {
        self.documents.iter().map(Vec::len).sum()
    }
}

/// In-memory constructor for documents that were tokenized elsewhere.
impl FromIterator<Document> for Corpus {
    fn from_iter<I: IntoIterator<Item = Document>>(iter: I) -> Self {
        let documents: Vec<Document> = iter.into_iter().collect();
        Self {
            records_read: documents.len(),
            documents,
            category: None,
            tokenizer: Tokenizer::default(),
        }
    }
}

/// Builder that streams records into a [`Corpus`].
#[derive(Debug, Clone)]
pub struct CorpusLoader {
    tokenizer: Tokenizer,
    text_field: String,
    category_field: String,
    category: Option<String>,
}

impl CorpusLoader {
    /// Create a loader with the default field names and no category filter.
    pub fn new(tokenizer: Tokenizer) -> Self {
        Self {
            tokenizer,
            text_field: DEFAULT_TEXT_FIELD.to_string(),
            category_field: DEFAULT_CATEGORY_FIELD.to_string(),
            category: None,
        }
    }

    /// Set the name of the free-text field to tokenize.
    pub fn text_field<S: Into<String>>(mut self, field: S) -> Self {
        self.text_field = field.into();
        self
    }

    /// Set the name of the category label field.
    pub fn category_field<S: Into<String>>(mut self, field: S) -> Self {
        self.category_field = field.into();
        self
    }

    /// Keep only records whose category equals `category` exactly.
    ///
    /// `None` and the `"all"` sentinel disable filtering.
    pub fn category<S: AsRef<str>>(mut self, category: Option<S>) -> Self {
        self.category = category
            .as_ref()
            .and_then(|c| category_filter(c.as_ref()))
            .map(str::to_string);
        self
    }

    /// Open `path` and load it.
    #[tracing::instrument(skip(self), fields(category = ?self.category))]
    pub fn load_path(&self, path: &Utf8Path) -> LoadResult<Corpus> {
        let file = File::open(path.as_std_path()).map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_reader(BufReader::new(file))
    }

    /// Load every record from `reader`, one JSON object per line.
    #[tracing::instrument(skip_all, fields(category = ?self.category, stem = self.tokenizer.stem))]
    pub fn load_reader<R: BufRead>(&self, reader: R) -> LoadResult<Corpus> {
        let mut documents = Vec::new();
        let mut records_read = 0;

        for (idx, line) in reader.lines().enumerate() {
            let line_no = idx + 1;
            let line = line.map_err(|source| LoadError::Read {
                line: line_no,
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let record: Map<String, Value> =
                serde_json::from_str(&line).map_err(|source| LoadError::Malformed {
                    line: line_no,
                    source,
                })?;
            records_read += 1;

            if let Some(text) = self.retained_text(&record) {
                documents.push(self.tokenizer.tokenize(text));
            }
        }

        tracing::info!(
            records_read,
            retained = documents.len(),
            "corpus loaded"
        );

        Ok(Corpus {
            documents,
            category: self.category.clone(),
            tokenizer: self.tokenizer,
            records_read,
        })
    }

    /// The record's free text, if the record passes the filters.
    fn retained_text<'a>(&self, record: &'a Map<String, Value>) -> Option<&'a str> {
        let text = record
            .get(&self.text_field)
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())?;
        match self.category {
            None => Some(text),
            Some(ref wanted) => {
                let label = record.get(&self.category_field).and_then(Value::as_str);
                (label == Some(wanted.as_str())).then_some(text)
            }
        }
    }
}
