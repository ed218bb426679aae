//! Logging and tracing setup.
//!
//! Human-readable events go to stderr. When a log directory is available,
//! events are also written as JSON lines to a daily-rolling file through a
//! non-blocking writer. Keep the returned guard alive until exit so the file
//! writer is flushed.

use std::path::{Path, PathBuf};

use anyhow::Context;
use medium_ngrams_core::config::user_data_local_dir;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Explicit log file path (no rotation).
const ENV_LOG_PATH: &str = "MEDIUM_NGRAMS_LOG_PATH";
/// Directory for rolling log files.
const ENV_LOG_DIR: &str = "MEDIUM_NGRAMS_LOG_DIR";

const LOG_FILE_PREFIX: &str = "medium-ngrams";
const LOG_FILE_SUFFIX: &str = "jsonl";

/// Where log files go, if anywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservabilityConfig {
    /// Single log file, takes precedence over `log_dir`.
    pub log_path: Option<PathBuf>,
    /// Directory for daily-rolling log files.
    pub log_dir: Option<PathBuf>,
}

impl ObservabilityConfig {
    /// Resolve log destinations from the environment, then `log_dir_override`
    /// (from configuration), then the platform data directory.
    pub fn from_env_with_overrides(log_dir_override: Option<PathBuf>) -> Self {
        let log_path = std::env::var_os(ENV_LOG_PATH).map(PathBuf::from);
        let log_dir = std::env::var_os(ENV_LOG_DIR)
            .map(PathBuf::from)
            .or(log_dir_override)
            .or_else(|| user_data_local_dir().map(|d| d.join("logs").into_std_path_buf()));
        Self { log_path, log_dir }
    }

    fn file_appender(&self) -> Option<RollingFileAppender> {
        let (dir, prefix, rotation) = match (&self.log_path, &self.log_dir) {
            (Some(path), _) => {
                let dir = path.parent().unwrap_or_else(|| Path::new("."));
                let name = path.file_name()?.to_string_lossy().into_owned();
                (dir.to_path_buf(), name, Rotation::NEVER)
            }
            (None, Some(dir)) => (dir.clone(), LOG_FILE_PREFIX.to_string(), Rotation::DAILY),
            (None, None) => return None,
        };

        if let Err(e) = std::fs::create_dir_all(&dir) {
            eprintln!("warning: cannot create log directory {}: {e}", dir.display());
            return None;
        }

        let mut builder = RollingFileAppender::builder()
            .rotation(rotation.clone())
            .filename_prefix(prefix);
        if rotation != Rotation::NEVER {
            builder = builder.filename_suffix(LOG_FILE_SUFFIX);
        }
        match builder.build(&dir) {
            Ok(appender) => Some(appender),
            Err(e) => {
                eprintln!("warning: file logging disabled: {e}");
                None
            }
        }
    }
}

/// Build the level filter.
///
/// `-q` and `-v` win over `RUST_LOG`, which wins over the configured level.
pub fn env_filter(quiet: bool, verbose: u8, config_level: &str) -> EnvFilter {
    let flag_level = if quiet {
        Some("error")
    } else {
        match verbose {
            0 => None,
            1 => Some("debug"),
            _ => Some("trace"),
        }
    };

    match flag_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config_level)),
    }
}

/// Keeps the non-blocking file writer alive.
#[derive(Debug)]
pub struct ObservabilityGuard {
    _file: Option<WorkerGuard>,
}

/// Install the global subscriber.
pub fn init_observability(
    config: &ObservabilityConfig,
    filter: EnvFilter,
) -> anyhow::Result<ObservabilityGuard> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let (file_layer, guard) = match config.file_appender() {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("a global tracing subscriber is already installed")?;

    Ok(ObservabilityGuard { _file: guard })
}
