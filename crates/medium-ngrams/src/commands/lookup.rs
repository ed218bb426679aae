//! Lookup command: match one phrase against the vocabulary.

use anyhow::Context;
use clap::Args;
use medium_ngrams_core::config::{Config, VocabularyConfig};
use medium_ngrams_core::vocabulary::{
    ElasticsearchVocabulary, VocabularyEntry, VocabularyMatch, VocabularySearch, classify,
};
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

/// Arguments for the `lookup` subcommand.
#[derive(Args, Debug)]
pub struct LookupArgs {
    /// Phrase to look up (multiple words are joined with spaces).
    #[arg(required = true, num_args = 1..)]
    pub phrase: Vec<String>,

    /// Ranked candidates to inspect.
    #[arg(long)]
    pub candidates: Option<usize>,

    /// Search service base URL (overrides configuration).
    #[arg(long)]
    pub url: Option<String>,

    /// Vocabulary index name (overrides configuration).
    #[arg(long)]
    pub index: Option<String>,
}

impl LookupArgs {
    fn phrase(&self) -> String {
        self.phrase.join(" ")
    }

    fn vocabulary_config(&self, config: &Config) -> VocabularyConfig {
        let mut vocabulary = config.vocabulary.clone();
        if let Some(ref url) = self.url {
            vocabulary.url.clone_from(url);
        }
        if let Some(ref index) = self.index {
            vocabulary.index.clone_from(index);
        }
        if let Some(candidates) = self.candidates {
            vocabulary.candidates = candidates.max(1);
        }
        vocabulary
    }
}

#[derive(Serialize)]
struct LookupOutput {
    phrase: String,
    #[serde(rename = "match")]
    matched: Option<VocabularyMatch>,
    candidates: Vec<VocabularyEntry>,
}

/// Search the vocabulary for one phrase and print the classified result.
///
/// Unlike batch matching, a failed search here is an error.
#[instrument(name = "cmd_lookup", skip_all)]
pub async fn cmd_lookup(args: LookupArgs, global_json: bool, config: &Config) -> anyhow::Result<()> {
    let phrase = args.phrase();
    let vocabulary_config = args.vocabulary_config(config);
    debug!(%phrase, url = %vocabulary_config.url, index = %vocabulary_config.index, "executing lookup command");

    let vocabulary = ElasticsearchVocabulary::from_config(&vocabulary_config)
        .context("failed to build vocabulary client")?;
    let candidates = vocabulary
        .search(&phrase, vocabulary_config.candidates)
        .await
        .with_context(|| format!("vocabulary search failed at {}", vocabulary.search_url()))?;
    let matched = classify(&phrase, &candidates);

    if global_json {
        let output = LookupOutput {
            phrase,
            matched,
            candidates,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    match matched {
        Some(m) => {
            println!(
                "{} {} → {} {}",
                m.quality.as_str().green().bold(),
                phrase,
                m.entry.name.bold(),
                format!("[{}]", m.entry.id).dimmed()
            );
            let details: Vec<&str> = [m.entry.facet.as_deref(), m.entry.record_type.as_deref()]
                .into_iter()
                .flatten()
                .collect();
            if !details.is_empty() {
                println!("  {}", details.join(", ").dimmed());
            }
        }
        None => {
            println!("{} {}", "no match".yellow(), phrase);
            for candidate in &candidates {
                println!(
                    "  {} {}",
                    candidate.name,
                    format!("[{}]", candidate.id).dimmed()
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(phrase: &[&str]) -> LookupArgs {
        LookupArgs {
            phrase: phrase.iter().map(|p| (*p).to_string()).collect(),
            candidates: None,
            url: None,
            index: None,
        }
    }

    #[test]
    fn words_are_joined() {
        assert_eq!(args(&["gold", "leaf"]).phrase(), "gold leaf");
    }

    #[test]
    fn flags_override_vocabulary_config() {
        let lookup = LookupArgs {
            url: Some("http://search:9200".to_string()),
            index: Some("aat-test".to_string()),
            candidates: Some(0),
            ..args(&["oil"])
        };
        let vocabulary = lookup.vocabulary_config(&Config::default());
        assert_eq!(vocabulary.url, "http://search:9200");
        assert_eq!(vocabulary.index, "aat-test");
        assert_eq!(vocabulary.candidates, 1);
    }

    #[test]
    fn config_used_without_flags() {
        let vocabulary = args(&["oil"]).vocabulary_config(&Config::default());
        assert_eq!(vocabulary, VocabularyConfig::default());
    }
}
