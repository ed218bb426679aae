//! Elasticsearch-backed vocabulary search.
//!
//! Issues a `multi_match` query with the `best_fields` strategy over the
//! preferred-name, scope-note and alternate-terms fields, weighted in that
//! order, and maps hits back to [`VocabularyEntry`] values.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde_json::{Value, json};

use super::{VocabularyEntry, VocabularySearch};
use crate::config::VocabularyConfig;
use crate::error::{SearchError, SearchResult};

/// HTTP client for one vocabulary index.
#[derive(Debug, Clone)]
pub struct ElasticsearchVocabulary {
    client: Client,
    search_url: String,
    config: VocabularyConfig,
}

impl ElasticsearchVocabulary {
    /// Build a client from configuration.
    pub fn from_config(config: &VocabularyConfig) -> SearchResult<Self> {
        let mut headers = HeaderMap::new();
        if let Some(ref key) = config.api_key {
            let value = HeaderValue::from_str(&format!("ApiKey {key}"))?;
            headers.insert(AUTHORIZATION, value);
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            search_url: format!(
                "{}/{}/_search",
                config.url.trim_end_matches('/'),
                config.index
            ),
            config: config.clone(),
        })
    }

    /// Endpoint queries are posted to.
    pub fn search_url(&self) -> &str {
        &self.search_url
    }

    /// Request body for `query`, asking for `size` hits.
    pub fn query_body(&self, query: &str, size: usize) -> Value {
        let c = &self.config;
        json!({
            "size": size,
            "query": {
                "multi_match": {
                    "query": query,
                    "type": "best_fields",
                    "fields": [
                        format!("{}^{}", c.name_field, c.name_weight),
                        format!("{}^{}", c.scope_note_field, c.scope_note_weight),
                        format!("{}^{}", c.terms_field, c.terms_weight),
                    ],
                }
            }
        })
    }

    /// Map a search response body to entries, in hit order.
    ///
    /// Hits without a preferred name are skipped.
    pub fn parse_hits(&self, body: &Value) -> SearchResult<Vec<VocabularyEntry>> {
        let hits = body
            .pointer("/hits/hits")
            .and_then(Value::as_array)
            .ok_or_else(|| SearchError::Decode("response has no hits.hits array".to_string()))?;

        Ok(hits.iter().filter_map(|hit| self.entry_from_hit(hit)).collect())
    }

    fn entry_from_hit(&self, hit: &Value) -> Option<VocabularyEntry> {
        let c = &self.config;
        let source = hit.get("_source")?;
        let text = |field: &str| source.get(field).and_then(Value::as_str).map(str::to_string);

        let Some(name) = text(&c.name_field) else {
            tracing::debug!(hit = %hit, "skipping hit without a preferred name");
            return None;
        };
        let terms = match source.get(&c.terms_field) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Some(Value::String(single)) => vec![single.clone()],
            _ => Vec::new(),
        };
        let id = hit
            .get("_id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| text(&c.id_field))
            .unwrap_or_default();

        Some(VocabularyEntry {
            id,
            name,
            scope_note: text(&c.scope_note_field),
            terms,
            facet: text(&c.facet_field),
            record_type: text(&c.record_type_field),
        })
    }
}

impl VocabularySearch for ElasticsearchVocabulary {
    #[tracing::instrument(skip(self), fields(url = %self.search_url))]
    async fn search(&self, query: &str, size: usize) -> SearchResult<Vec<VocabularyEntry>> {
        let response = self
            .client
            .post(&self.search_url)
            .json(&self.query_body(query, size))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::Decode(e.to_string()))?;
        self.parse_hits(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocabulary() -> ElasticsearchVocabulary {
        ElasticsearchVocabulary::from_config(&VocabularyConfig::default()).unwrap()
    }

    #[test]
    fn builds_search_url() {
        let config = VocabularyConfig {
            url: "http://search.example:9200/".to_string(),
            index: "aat-2024".to_string(),
            ..VocabularyConfig::default()
        };
        let vocab = ElasticsearchVocabulary::from_config(&config).unwrap();
        assert_eq!(vocab.search_url(), "http://search.example:9200/aat-2024/_search");
    }

    #[test]
    fn api_key_with_newline_is_rejected() {
        let config = VocabularyConfig {
            api_key: Some("abc\ndef".to_string()),
            ..VocabularyConfig::default()
        };
        let err = ElasticsearchVocabulary::from_config(&config).unwrap_err();
        assert!(matches!(err, SearchError::InvalidApiKey(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn query_uses_weighted_best_fields() {
        let body = vocabulary().query_body("gold leaf", 5);
        assert_eq!(body["size"], 5);
        let mm = &body["query"]["multi_match"];
        assert_eq!(mm["query"], "gold leaf");
        assert_eq!(mm["type"], "best_fields");
        assert_eq!(
            mm["fields"],
            json!(["name^10", "scopeNote^5", "terms^3"])
        );
    }

    #[test]
    fn parses_hits_in_rank_order() {
        let body = json!({
            "hits": {
                "hits": [
                    {
                        "_id": "300264831",
                        "_source": {
                            "name": "gold foil",
                            "scopeNote": "Gold beaten into thin sheets.",
                            "terms": ["gold leaf", "leaf, gold"],
                            "facetName": "Materials",
                            "recordType": "Concept"
                        }
                    },
                    {
                        "_id": "300011021",
                        "_source": { "name": "gold", "terms": "Au" }
                    },
                    { "_id": "x", "_source": { "scopeNote": "no name" } }
                ]
            }
        });
        let entries = vocabulary().parse_hits(&body).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "300264831");
        assert_eq!(entries[0].terms, vec!["gold leaf", "leaf, gold"]);
        assert_eq!(entries[0].facet.as_deref(), Some("Materials"));
        assert_eq!(entries[0].record_type.as_deref(), Some("Concept"));
        assert_eq!(entries[1].terms, vec!["Au"]);
        assert!(entries[1].scope_note.is_none());
    }

    #[test]
    fn missing_hits_is_decode_error() {
        let err = vocabulary().parse_hits(&json!({"error": "boom"})).unwrap_err();
        assert!(matches!(err, SearchError::Decode(_)));
    }

    #[test]
    fn api_key_becomes_authorization_header() {
        let config = VocabularyConfig {
            api_key: Some("secret".to_string()),
            ..VocabularyConfig::default()
        };
        assert!(ElasticsearchVocabulary::from_config(&config).is_ok());
    }
}
