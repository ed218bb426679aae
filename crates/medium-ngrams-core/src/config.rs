//! Configuration loading and discovery.
//!
//! This module provides configuration file discovery by:
//! 1. Walking up from the current directory to find project config
//! 2. Loading user config from XDG config directory
//! 3. Merging with sensible defaults
//!
//! # Supported formats
//!
//! The following configuration file formats are supported:
//! - TOML (`.toml`)
//! - YAML (`.yaml`, `.yml`)
//! - JSON (`.json`)
//!
//! # Config file locations (in order of precedence, highest first):
//! - `medium-ngrams.<ext>` in current directory or any parent
//! - `.medium-ngrams.<ext>` in current directory or any parent
//! - `~/.config/medium-ngrams/config.<ext>` (user config)
//!
//! Where `<ext>` is one of: `toml`, `yaml`, `yml`, `json`
//!
//! When multiple files exist in the same directory, all are merged via figment.
//! Later extensions override earlier: toml < yaml < yml < json.
//!
//! Environment variables prefixed with `MEDIUM_NGRAMS_` override everything;
//! nested keys use a double underscore (`MEDIUM_NGRAMS_VOCABULARY__URL`).
//!
//! # Example
//! ```no_run
//! use camino::Utf8PathBuf;
//! use medium_ngrams_core::config::{Config, ConfigLoader};
//!
//! let cwd = std::env::current_dir().unwrap();
//! let cwd = Utf8PathBuf::try_from(cwd).expect("current directory is not valid UTF-8");
//! let (config, _sources) = ConfigLoader::new()
//!     .with_project_search(&cwd)
//!     .load()
//!     .unwrap();
//! ```

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};

use crate::corpus::{ALL_CATEGORIES, DEFAULT_CATEGORY_FIELD, DEFAULT_TEXT_FIELD};
use crate::error::{ConfigError, ConfigResult, ConfigurationError};
use crate::ngrams::NgramSize;
use crate::selection::Selection;

/// How to pick the n-grams worth matching for one n.
///
/// `DocumentShare` turns a percentage of the corpus' *document* count into a
/// minimum-count floor on *n-gram* frequency.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum SelectionRule {
    /// Keep n-grams seen at least `floor` times.
    MinimumCount {
        /// Frequency floor; negative values are rejected when resolved.
        floor: i64,
    },
    /// Keep n-grams seen at least `percent`% × document-count times.
    DocumentShare {
        /// Percentage of the document count (0--100).
        percent: f64,
    },
    /// Keep the most frequent n-grams covering `threshold` of all occurrences.
    Coverage {
        /// Fraction of all n-gram occurrences (0--1).
        threshold: f64,
    },
}

impl SelectionRule {
    /// Turn the rule into a concrete [`Selection`] for a corpus of `documents`.
    pub fn resolve(&self, documents: usize) -> Result<Selection, ConfigurationError> {
        match *self {
            Self::MinimumCount { floor } => Selection::minimum_count(floor),
            Self::DocumentShare { percent } => {
                if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
                    return Err(ConfigurationError::DocumentShare(percent));
                }
                let floor = (percent * documents as f64 / 100.0).floor() as u64;
                Ok(Selection::MinimumCount(floor))
            }
            Self::Coverage { threshold } => Selection::coverage(threshold),
        }
    }

    /// Check the rule's parameter without a corpus.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.resolve(0).map(|_| ())
    }
}

impl fmt::Display for SelectionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::MinimumCount { floor } => write!(f, "frequency >= {floor}"),
            Self::DocumentShare { percent } => write!(f, "frequency >= {percent}% of documents"),
            Self::Coverage { threshold } => write!(f, "{:.0}% coverage", threshold * 100.0),
        }
    }
}

/// Per-n selection rules.
///
/// Defaults are coverage thresholds that shrink as phrases get longer:
///
/// | n | rule |
/// |---|------|
/// | 1 | 80% coverage |
/// | 2 | 60% coverage |
/// | 3 | 40% coverage |
/// | 4+ | 30% coverage |
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Rule for single words.
    pub unigram: SelectionRule,
    /// Rule for two-word phrases.
    pub bigram: SelectionRule,
    /// Rule for three-word phrases.
    pub trigram: SelectionRule,
    /// Rule for four-word (and longer) phrases.
    pub fourgram: SelectionRule,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            unigram: SelectionRule::Coverage { threshold: 0.80 },
            bigram: SelectionRule::Coverage { threshold: 0.60 },
            trigram: SelectionRule::Coverage { threshold: 0.40 },
            fourgram: SelectionRule::Coverage { threshold: 0.30 },
        }
    }
}

impl SelectionConfig {
    /// The same rule for every n.
    pub const fn uniform(rule: SelectionRule) -> Self {
        Self {
            unigram: rule,
            bigram: rule,
            trigram: rule,
            fourgram: rule,
        }
    }

    /// Rule for n-grams of length `n`; n > 4 uses the four-gram rule.
    pub const fn rule_for(&self, n: NgramSize) -> SelectionRule {
        match n.get() {
            1 => self.unigram,
            2 => self.bigram,
            3 => self.trigram,
            _ => self.fourgram,
        }
    }

    /// Validate every rule.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for rule in [self.unigram, self.bigram, self.trigram, self.fourgram] {
            rule.validate()?;
        }
        Ok(())
    }
}

/// Connection and query settings for the vocabulary search index.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct VocabularyConfig {
    /// Base URL of the search service.
    pub url: String,
    /// Index holding the vocabulary.
    pub index: String,
    /// API key sent as `Authorization: ApiKey <key>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Ranked candidates inspected per phrase.
    pub candidates: usize,
    /// Maximum concurrent lookups.
    pub max_in_flight: usize,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Retries for transient failures (0 disables).
    pub retries: u32,
    /// Backoff before the first retry, in milliseconds; doubles per retry.
    pub retry_backoff_ms: u64,
    /// Source field holding the record id, used when hits carry no `_id`.
    pub id_field: String,
    /// Preferred-name field.
    pub name_field: String,
    /// Scope-note field.
    pub scope_note_field: String,
    /// Alternate-terms field.
    pub terms_field: String,
    /// Facet field.
    pub facet_field: String,
    /// Record-type field.
    pub record_type_field: String,
    /// Query boost for the preferred-name field.
    pub name_weight: u32,
    /// Query boost for the scope-note field.
    pub scope_note_weight: u32,
    /// Query boost for the alternate-terms field.
    pub terms_weight: u32,
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_string(),
            index: "aat".to_string(),
            api_key: None,
            candidates: crate::vocabulary::DEFAULT_CANDIDATES,
            max_in_flight: crate::vocabulary::matcher::DEFAULT_MAX_IN_FLIGHT,
            timeout_secs: 30,
            retries: 0,
            retry_backoff_ms: 250,
            id_field: "id".to_string(),
            name_field: "name".to_string(),
            scope_note_field: "scopeNote".to_string(),
            terms_field: "terms".to_string(),
            facet_field: "facetName".to_string(),
            record_type_field: "recordType".to_string(),
            name_weight: 10,
            scope_note_weight: 5,
            terms_weight: 3,
        }
    }
}

/// The configuration for medium-ngrams.
///
/// Deserialized from config files found during discovery (TOML, YAML, or
/// JSON), then overridden by `MEDIUM_NGRAMS_*` environment variables.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Log level for the application (e.g., "debug", "info", "warn", "error").
    pub log_level: LogLevel,
    /// Directory for JSONL log files (falls back to platform defaults if unset).
    pub log_dir: Option<Utf8PathBuf>,
    /// Newline-delimited JSON file of artwork records.
    pub source: Option<Utf8PathBuf>,
    /// Record field holding the free-text medium description.
    pub text_field: String,
    /// Record field holding the category label.
    pub category_field: String,
    /// Categories to analyze, one output file each. `"all"` means unfiltered.
    pub categories: Vec<String>,
    /// Stem tokens before counting.
    pub stem: bool,
    /// N-gram lengths to analyze.
    pub sizes: Vec<NgramSize>,
    /// Per-n selection rules.
    pub selection: SelectionConfig,
    /// Vocabulary search settings.
    pub vocabulary: VocabularyConfig,
    /// Directory CSV output is written to.
    pub output_dir: Utf8PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            log_dir: None,
            source: None,
            text_field: DEFAULT_TEXT_FIELD.to_string(),
            category_field: DEFAULT_CATEGORY_FIELD.to_string(),
            categories: vec![ALL_CATEGORIES.to_string()],
            stem: false,
            sizes: (1..=4).filter_map(|n| NgramSize::new(n).ok()).collect(),
            selection: SelectionConfig::default(),
            vocabulary: VocabularyConfig::default(),
            output_dir: Utf8PathBuf::from("."),
        }
    }
}

impl Config {
    /// Check semantic constraints that deserialization cannot express.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.selection.validate()
    }
}

/// Log level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum LogLevel {
    /// Verbose output for debugging and development.
    Debug,
    /// Standard operational information (default).
    #[default]
    Info,
    /// Warnings about potential issues.
    Warn,
    /// Errors that indicate failures.
    Error,
}

impl LogLevel {
    /// Returns the log level as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Metadata about which configuration sources were loaded.
///
/// Returned alongside [`Config`] from [`ConfigLoader::load()`] so commands
/// can report the actual config files without re-discovering them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigSources {
    /// Project config files found by walking up, ordered low→high precedence.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub project_files: Vec<Utf8PathBuf>,
    /// User config file from XDG config directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_file: Option<Utf8PathBuf>,
    /// Explicit config files loaded (e.g., from `--config` flag).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub explicit_files: Vec<Utf8PathBuf>,
}

impl ConfigSources {
    /// Returns the highest-precedence config file that was loaded.
    ///
    /// Precedence: explicit files > project files > user file.
    pub fn primary_file(&self) -> Option<&Utf8Path> {
        self.explicit_files
            .last()
            .map(Utf8PathBuf::as_path)
            .or_else(|| self.project_files.last().map(Utf8PathBuf::as_path))
            .or(self.user_file.as_deref())
    }
}

/// Supported configuration file extensions (in order of preference).
const CONFIG_EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

/// Application name for XDG directory lookup and config file names.
const APP_NAME: &str = "medium-ngrams";

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "MEDIUM_NGRAMS_";

/// Builder for loading configuration from multiple sources.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Starting directory for project config search.
    project_search_root: Option<Utf8PathBuf>,
    /// Whether to include user config from XDG directory.
    include_user_config: bool,
    /// Stop searching when we hit a directory containing this file/dir.
    boundary_marker: Option<String>,
    /// Explicit config files to load (for testing or programmatic use).
    explicit_files: Vec<Utf8PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader with default settings.
    pub fn new() -> Self {
        Self {
            project_search_root: None,
            include_user_config: true,
            boundary_marker: Some(".git".to_string()),
            explicit_files: Vec::new(),
        }
    }

    /// Set the starting directory for project config search.
    ///
    /// The loader will walk up from this directory looking for config files.
    pub fn with_project_search<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.project_search_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set whether to include user config from `~/.config/medium-ngrams/`.
    pub const fn with_user_config(mut self, include: bool) -> Self {
        self.include_user_config = include;
        self
    }

    /// Set a boundary marker to stop directory traversal.
    ///
    /// When walking up directories, stop if we find a directory containing
    /// this file or directory name. Default is `.git`.
    pub fn with_boundary_marker<S: Into<String>>(mut self, marker: S) -> Self {
        self.boundary_marker = Some(marker.into());
        self
    }

    /// Disable boundary marker (search all the way to filesystem root).
    pub fn without_boundary_marker(mut self) -> Self {
        self.boundary_marker = None;
        self
    }

    /// Add an explicit config file to load.
    ///
    /// Files are loaded in order, with later files taking precedence.
    /// Explicit files are loaded after discovered files.
    pub fn with_file<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.explicit_files.push(path.as_ref().to_path_buf());
        self
    }

    /// Load configuration, merging all discovered sources.
    ///
    /// Precedence (highest to lowest):
    /// 1. Environment variables (`MEDIUM_NGRAMS_*`)
    /// 2. Explicit files (in order added via `with_file`)
    /// 3. Project config (closest to search root)
    /// 4. User config (`~/.config/medium-ngrams/config.<ext>`)
    /// 5. Default values
    #[tracing::instrument(skip(self), fields(search_root = ?self.project_search_root))]
    pub fn load(self) -> ConfigResult<(Config, ConfigSources)> {
        tracing::debug!("loading configuration");

        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        let mut sources = ConfigSources::default();

        if self.include_user_config
            && let Some(user_config) = self.find_user_config()
        {
            figment = Self::merge_file(figment, &user_config);
            sources.user_file = Some(user_config);
        }

        if let Some(ref root) = self.project_search_root {
            let project_configs = self.find_project_configs(root);
            for pc in &project_configs {
                figment = Self::merge_file(figment, pc);
            }
            sources.project_files = project_configs;
        }

        for file in &self.explicit_files {
            figment = Self::merge_file(figment, file);
        }
        sources.explicit_files = self.explicit_files;

        // MEDIUM_NGRAMS_STEM=true, MEDIUM_NGRAMS_VOCABULARY__INDEX=aat, etc.
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__").lowercase(true));

        let config: Config = figment
            .extract()
            .map_err(|e| ConfigError::Deserialize(Box::new(e)))?;

        tracing::info!(
            log_level = config.log_level.as_str(),
            categories = ?config.categories,
            stem = config.stem,
            "configuration loaded"
        );

        Ok((config, sources))
    }

    /// Load configuration, returning an error if no config file is found.
    pub fn load_or_error(self) -> ConfigResult<(Config, ConfigSources)> {
        let has_user = self.include_user_config && self.find_user_config().is_some();
        let has_project = self
            .project_search_root
            .as_ref()
            .is_some_and(|root| !self.find_project_configs(root).is_empty());
        let has_explicit = !self.explicit_files.is_empty();

        if !has_user && !has_project && !has_explicit {
            return Err(ConfigError::NotFound);
        }

        self.load()
    }

    /// Find project config files by walking up from the given directory.
    ///
    /// Returns all matching config files from the closest directory that has
    /// any match, dotfiles before regular files (low to high precedence).
    fn find_project_configs(&self, start: &Utf8Path) -> Vec<Utf8PathBuf> {
        let mut current = Some(start.to_path_buf());

        while let Some(dir) = current {
            let mut found = Vec::new();

            for ext in CONFIG_EXTENSIONS {
                let dotfile = dir.join(format!(".{APP_NAME}.{ext}"));
                if dotfile.is_file() {
                    found.push(dotfile);
                }
            }
            for ext in CONFIG_EXTENSIONS {
                let regular = dir.join(format!("{APP_NAME}.{ext}"));
                if regular.is_file() {
                    found.push(regular);
                }
            }

            if !found.is_empty() {
                return found;
            }

            // Check for boundary marker AFTER checking config files,
            // so a config in the same directory as the marker is found.
            if let Some(ref marker) = self.boundary_marker
                && dir.join(marker).exists()
                && dir != start
            {
                break;
            }

            current = dir.parent().map(Utf8Path::to_path_buf);
        }

        Vec::new()
    }

    /// Find user config in XDG config directory.
    fn find_user_config(&self) -> Option<Utf8PathBuf> {
        let config_dir = user_config_dir()?;
        CONFIG_EXTENSIONS
            .iter()
            .map(|ext| config_dir.join(format!("config.{ext}")))
            .find(|path| path.is_file())
    }

    /// Merge a config file into the figment, detecting format from extension.
    fn merge_file(figment: Figment, path: &Utf8Path) -> Figment {
        match path.extension() {
            Some("toml") => figment.merge(Toml::file_exact(path.as_str())),
            Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path.as_str())),
            Some("json") => figment.merge(Json::file_exact(path.as_str())),
            _ => figment.merge(Toml::file_exact(path.as_str())),
        }
    }
}

/// Get the project directories for XDG-compliant path resolution.
///
/// Returns `None` if the home directory cannot be determined.
fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", APP_NAME)
}

/// Get the user config directory path.
///
/// Returns `~/.config/medium-ngrams/` on Linux, `~/Library/Application Support/medium-ngrams/`
/// on macOS, and equivalent on other platforms.
pub fn user_config_dir() -> Option<Utf8PathBuf> {
    let proj_dirs = project_dirs()?;
    Utf8PathBuf::from_path_buf(proj_dirs.config_dir().to_path_buf()).ok()
}

/// Get the local data directory path (machine-specific, not synced).
///
/// Used as the fallback location for log files.
pub fn user_data_local_dir() -> Option<Utf8PathBuf> {
    let proj_dirs = project_dirs()?;
    Utf8PathBuf::from_path_buf(proj_dirs.data_local_dir().to_path_buf()).ok()
}
