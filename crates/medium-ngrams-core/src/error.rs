//! Error types for medium-ngrams-core.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur when working with configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),

    /// Configuration file not found after searching all locations.
    #[error("no configuration file found")]
    NotFound,
}

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Semantically invalid analysis parameters.
///
/// Raised before any corpus work begins.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// N-gram size must be at least 1.
    #[error("invalid n-gram size {0}: must be at least 1")]
    NgramSize(usize),

    /// Coverage threshold must be a finite fraction in `[0, 1]`.
    #[error("invalid coverage threshold {0}: must be between 0 and 1")]
    Coverage(f64),

    /// Minimum-count floor must not be negative.
    #[error("invalid frequency floor {0}: must not be negative")]
    NegativeFloor(i64),

    /// Document-share percentage must be a finite value in `[0, 100]`.
    #[error("invalid document share {0}%: must be between 0 and 100")]
    DocumentShare(f64),
}

/// Errors that abort loading a corpus.
///
/// There is no best-effort mode: any of these discards the partial corpus.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The record source could not be opened.
    #[error("failed to open {path}: {source}")]
    Open {
        /// Path that was being opened.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Reading from the record source failed mid-stream.
    #[error("failed to read record {line}: {source}")]
    Read {
        /// 1-based line number of the failed read.
        line: usize,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A record could not be parsed as a JSON object.
    #[error("malformed record on line {line}: {source}")]
    Malformed {
        /// 1-based line number of the bad record.
        line: usize,
        /// Parser error.
        source: serde_json::Error,
    },
}

/// Result type alias using [`LoadError`].
pub type LoadResult<T> = Result<T, LoadError>;

/// Errors from a single vocabulary lookup.
///
/// The matcher recovers from all of these as "no match".
#[derive(Error, Debug)]
pub enum SearchError {
    /// The HTTP request could not be sent or the connection failed.
    #[error("search request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The search service answered with a non-success status.
    #[error("search returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The response body did not have the expected shape.
    #[error("unexpected search response: {0}")]
    Decode(String),

    /// The configured API key cannot be sent as a header value.
    #[error("invalid API key: {0}")]
    InvalidApiKey(#[from] reqwest::header::InvalidHeaderValue),
}

impl SearchError {
    /// Whether retrying the same request might succeed.
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Decode(_) | Self::InvalidApiKey(_) => false,
        }
    }
}

/// Result type alias using [`SearchError`].
pub type SearchResult<T> = Result<T, SearchError>;
