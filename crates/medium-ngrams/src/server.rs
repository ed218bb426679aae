//! MCP (Model Context Protocol) server implementation.
//!
//! Exposes tokenization, n-gram selection and vocabulary matching over the
//! MCP protocol via stdio transport. Each `#[tool]` method delegates to the
//! core library; no analysis logic lives here.

use std::sync::Arc;

use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};

use medium_ngrams_core::config::Config;
use medium_ngrams_core::corpus::Corpus;
use medium_ngrams_core::ngrams::NgramSize;
use medium_ngrams_core::pipeline::analyze_size;
use medium_ngrams_core::selection::Selection;
use medium_ngrams_core::tokenize::Tokenizer;
use medium_ngrams_core::vocabulary::{ElasticsearchVocabulary, VocabularySearch, classify};

/// Parameters for the `get_info` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct GetInfoParams {
    /// Output format: "text" or "json"
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "text".to_string()
}

/// Parameters for the `tokenize_text` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct TokenizeTextParams {
    /// The medium description to tokenize.
    pub text: String,
    /// Whether to stem tokens.
    #[serde(default)]
    pub stem: bool,
}

/// Parameters for the `extract_ngrams` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct ExtractNgramsParams {
    /// Medium descriptions, one per artwork.
    pub texts: Vec<String>,
    /// Phrase length in words (default 1).
    #[serde(default = "default_n")]
    pub n: usize,
    /// Keep n-grams seen at least this many times.
    pub min_count: Option<i64>,
    /// Keep the most frequent n-grams covering this fraction of occurrences.
    pub coverage: Option<f64>,
    /// Whether to stem tokens.
    #[serde(default)]
    pub stem: bool,
}

const fn default_n() -> usize {
    1
}

/// Parameters for the `match_phrase` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct MatchPhraseParams {
    /// Phrase to look up in the vocabulary.
    pub phrase: String,
}

/// MCP server exposing n-gram analysis to AI assistants.
#[derive(Clone)]
pub struct ProjectServer {
    tool_router: rmcp::handler::server::router::tool::ToolRouter<Self>,
    config: Arc<Config>,
}

impl Default for ProjectServer {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

fn invalid(e: impl std::fmt::Display) -> McpError {
    McpError::invalid_params(e.to_string(), None)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, McpError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("serialization error: {e}"), None))
}

#[tool_router]
impl ProjectServer {
    /// Create a new MCP server using `config` for selection rules and vocabulary access.
    pub fn new(config: Config) -> Self {
        Self {
            tool_router: Self::tool_router(),
            config: Arc::new(config),
        }
    }

    /// Get project information.
    #[tool(description = "Get project name, version, and description")]
    #[tracing::instrument(skip(self), fields(otel.kind = "server"))]
    fn get_info(
        &self,
        Parameters(params): Parameters<GetInfoParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "get_info", format = %params.format, "executing MCP tool");

        let info = serde_json::json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "description": env!("CARGO_PKG_DESCRIPTION"),
        });

        let text = if params.format == "json" {
            to_json(&info)?
        } else {
            format!(
                "{} v{}\n{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                env!("CARGO_PKG_DESCRIPTION"),
            )
        };

        tracing::info!(tool = "get_info", "MCP tool completed");
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    /// Split a medium description into normalized word tokens.
    #[tool(description = "Tokenize an artwork medium description into lowercase words, optionally stemmed.")]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server"))]
    fn tokenize_text(
        &self,
        Parameters(params): Parameters<TokenizeTextParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "tokenize_text", stem = params.stem, "executing MCP tool");

        let tokens = Tokenizer::new(params.stem).tokenize(&params.text);
        let json = to_json(&tokens)?;

        tracing::info!(tool = "tokenize_text", tokens = tokens.len(), "MCP tool completed");
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    /// Count and select frequent n-grams across a set of descriptions.
    #[tool(
        description = "Extract n-grams of length n from medium descriptions and return the frequent ones. Use min_count or coverage to choose the selection rule; otherwise the configured rule applies."
    )]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server", n = params.n))]
    fn extract_ngrams(
        &self,
        Parameters(params): Parameters<ExtractNgramsParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(
            tool = "extract_ngrams",
            texts = params.texts.len(),
            "executing MCP tool"
        );

        let n = NgramSize::new(params.n).map_err(invalid)?;
        let tokenizer = Tokenizer::new(params.stem);
        let corpus: Corpus = params
            .texts
            .iter()
            .filter(|t| !t.is_empty())
            .map(|t| tokenizer.tokenize(t))
            .collect();

        let selection = match (params.min_count, params.coverage) {
            (Some(floor), _) => Selection::minimum_count(floor),
            (None, Some(threshold)) => Selection::coverage(threshold),
            (None, None) => self.config.selection.rule_for(n).resolve(corpus.len()),
        }
        .map_err(invalid)?;

        let report = analyze_size(&corpus, n, selection);
        let json = to_json(&report)?;

        tracing::info!(
            tool = "extract_ngrams",
            selected = report.selected.len(),
            "MCP tool completed"
        );
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    /// Look up a phrase in the configured vocabulary index.
    #[tool(
        description = "Match a phrase against the AAT vocabulary index. Returns the matched entry and whether it matched the preferred name (exact) or an alternate term (synonym), or null."
    )]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server"))]
    async fn match_phrase(
        &self,
        Parameters(params): Parameters<MatchPhraseParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "match_phrase", phrase = %params.phrase, "executing MCP tool");

        let vocabulary = &self.config.vocabulary;
        let client = ElasticsearchVocabulary::from_config(vocabulary)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        let candidates = client
            .search(&params.phrase, vocabulary.candidates)
            .await
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        let matched = classify(&params.phrase, &candidates);
        let json = to_json(&matched)?;

        tracing::info!(
            tool = "match_phrase",
            matched = matched.is_some(),
            "MCP tool completed"
        );
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }
}

#[tool_handler]
impl ServerHandler for ProjectServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(format!(
                "{} MCP server. Use tools to tokenize medium descriptions, select frequent n-grams, and match phrases against the AAT.",
                env!("CARGO_PKG_NAME"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::RawContent;

    #[test]
    fn server_info_has_correct_name() {
        let server = ProjectServer::default();
        let info = ServerHandler::get_info(&server);

        assert_eq!(info.server_info.name, env!("CARGO_PKG_NAME"));
        assert_eq!(info.server_info.version, env!("CARGO_PKG_VERSION"));
        assert!(info.capabilities.tools.is_some());
    }

    /// Extract text from the first content item in a `CallToolResult`.
    fn extract_text(result: &CallToolResult) -> Option<&str> {
        result.content.first().and_then(|c| match &c.raw {
            RawContent::Text(t) => Some(t.text.as_str()),
            _ => None,
        })
    }

    #[test]
    fn get_info_tool_returns_json_when_requested() {
        let server = ProjectServer::default();
        let params = Parameters(GetInfoParams {
            format: "json".to_string(),
        });

        let result = server.get_info(params).expect("get_info should succeed");
        let text = extract_text(&result).expect("should have text content");
        let json: serde_json::Value =
            serde_json::from_str(text).expect("output should be valid JSON");

        assert_eq!(json["name"], env!("CARGO_PKG_NAME"));
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn tokenize_text_tool_works() {
        let server = ProjectServer::default();
        let params = Parameters(TokenizeTextParams {
            text: "Etchings and engravings.".to_string(),
            stem: true,
        });

        let result = server
            .tokenize_text(params)
            .expect("tokenize_text should succeed");
        let text = extract_text(&result).expect("should have text content");
        let tokens: Vec<String> = serde_json::from_str(text).expect("valid JSON");
        assert_eq!(tokens, vec!["etch", "and", "engrav"]);
    }

    #[test]
    fn extract_ngrams_tool_selects_by_floor() {
        let server = ProjectServer::default();
        let params = Parameters(ExtractNgramsParams {
            texts: vec![
                "oil on canvas".to_string(),
                "oil on board".to_string(),
                "acrylic on canvas".to_string(),
            ],
            n: 1,
            min_count: Some(2),
            coverage: None,
            stem: false,
        });

        let result = server
            .extract_ngrams(params)
            .expect("extract_ngrams should succeed");
        let text = extract_text(&result).expect("should have text content");
        let json: serde_json::Value = serde_json::from_str(text).expect("valid JSON");
        assert_eq!(json["total"], 9);
        let names: Vec<&str> = json["selected"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["ngram"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["on", "oil", "canvas"]);
    }

    #[test]
    fn extract_ngrams_rejects_zero_length() {
        let server = ProjectServer::default();
        let params = Parameters(ExtractNgramsParams {
            texts: vec!["oil on canvas".to_string()],
            n: 0,
            min_count: None,
            coverage: None,
            stem: false,
        });
        assert!(server.extract_ngrams(params).is_err());
    }

    #[test]
    fn extract_ngrams_rejects_bad_coverage() {
        let server = ProjectServer::default();
        let params = Parameters(ExtractNgramsParams {
            texts: vec!["oil on canvas".to_string()],
            n: 2,
            min_count: None,
            coverage: Some(1.5),
            stem: false,
        });
        assert!(server.extract_ngrams(params).is_err());
    }
}
