//! Info command implementation

use clap::Args;
use medium_ngrams_core::config::{Config, ConfigSources};
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

/// Arguments for the `info` subcommand.
#[derive(Args, Debug, Default)]
pub struct InfoArgs {
    // No subcommand-specific arguments; uses global --json flag
}

#[derive(Serialize)]
struct PackageInfo {
    name: &'static str,
    version: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    description: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    repository: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    homepage: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    license: &'static str,
}

impl PackageInfo {
    const fn new() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            description: env!("CARGO_PKG_DESCRIPTION"),
            repository: env!("CARGO_PKG_REPOSITORY"),
            homepage: env!("CARGO_PKG_HOMEPAGE"),
            license: env!("CARGO_PKG_LICENSE"),
        }
    }
}

#[derive(Serialize)]
struct ConfigInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    config_file: Option<String>,
    log_level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    text_field: String,
    category_field: String,
    categories: Vec<String>,
    stem: bool,
    sizes: Vec<usize>,
    selection: Vec<String>,
    vocabulary_url: String,
    vocabulary_index: String,
    output_dir: String,
}

impl ConfigInfo {
    fn from_config(config: &Config, sources: &ConfigSources) -> Self {
        let selection = config
            .sizes
            .iter()
            .map(|&n| format!("n={n}: {}", config.selection.rule_for(n)))
            .collect();
        Self {
            config_file: sources.primary_file().map(|p| p.to_string()),
            log_level: config.log_level.as_str().to_string(),
            log_dir: config.log_dir.as_ref().map(|p| p.to_string()),
            source: config.source.as_ref().map(|p| p.to_string()),
            text_field: config.text_field.clone(),
            category_field: config.category_field.clone(),
            categories: config.categories.clone(),
            stem: config.stem,
            sizes: config.sizes.iter().map(|n| n.get()).collect(),
            selection,
            vocabulary_url: config.vocabulary.url.clone(),
            vocabulary_index: config.vocabulary.index.clone(),
            output_dir: config.output_dir.to_string(),
        }
    }
}

#[derive(Serialize)]
struct FullInfo {
    #[serde(flatten)]
    package: PackageInfo,
    config: ConfigInfo,
}

/// Print package information
///
/// # Arguments
/// * `global_json` - Global `--json` flag from CLI
/// * `config` - Loaded configuration
/// * `sources` - Config source metadata from loading
#[instrument(name = "cmd_info", skip_all, fields(json_output))]
pub fn cmd_info(
    _args: InfoArgs,
    global_json: bool,
    config: &Config,
    sources: &ConfigSources,
) -> anyhow::Result<()> {
    let info = PackageInfo::new();

    debug!(json_output = global_json, "executing info command");

    let config_info = ConfigInfo::from_config(config, sources);
    let full_info = FullInfo {
        package: info,
        config: config_info,
    };

    if global_json {
        println!("{}", serde_json::to_string_pretty(&full_info)?);
        return Ok(());
    }

    println!(
        "{} {}",
        full_info.package.name.bold(),
        full_info.package.version.green()
    );
    if !full_info.package.description.is_empty() {
        println!("{}", full_info.package.description);
    }
    if !full_info.package.license.is_empty() {
        println!("{}: {}", "License".dimmed(), full_info.package.license);
    }
    if !full_info.package.repository.is_empty() {
        println!(
            "{}: {}",
            "Repository".dimmed(),
            full_info.package.repository.cyan()
        );
    }

    let cfg = &full_info.config;
    println!();
    println!("{}", "Configuration".bold().underline());
    if let Some(ref path) = cfg.config_file {
        println!("{}: {}", "Config file".dimmed(), path.cyan());
    } else {
        println!("{}: {}", "Config file".dimmed(), "none loaded".yellow());
    }
    println!("{}: {}", "Log level".dimmed(), cfg.log_level);
    if let Some(ref dir) = cfg.log_dir {
        println!("{}: {}", "Log directory".dimmed(), dir);
    }

    println!();
    println!("{}", "Corpus".bold().underline());
    match cfg.source {
        Some(ref source) => println!("{}: {}", "Source".dimmed(), source.cyan()),
        None => println!("{}: {}", "Source".dimmed(), "(not set)".dimmed()),
    }
    println!(
        "{}: {} / {}",
        "Fields".dimmed(),
        cfg.text_field,
        cfg.category_field
    );
    println!("{}: {}", "Categories".dimmed(), cfg.categories.join(", "));
    println!("{}: {}", "Stemming".dimmed(), if cfg.stem { "on" } else { "off" });

    println!();
    println!("{}", "Selection".bold().underline());
    for line in &cfg.selection {
        println!("  {line}");
    }

    println!();
    println!("{}", "Vocabulary".bold().underline());
    println!(
        "{}: {}/{}",
        "Index".dimmed(),
        cfg.vocabulary_url.cyan(),
        cfg.vocabulary_index
    );
    println!("{}: {}", "Output directory".dimmed(), cfg.output_dir);

    Ok(())
}
