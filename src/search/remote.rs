//! REST client for the remote search index.
//!
//! Documents come back as free-form JSON objects: the index schema is
//! owned by the service, so field extraction happens downstream with
//! fallbacks rather than with typed structs.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

use crate::config::SearchConfig;
use crate::search::credentials::{CredentialChain, SearchAuth};

const SEARCH_TIMEOUT_SECS: u64 = 15;

pub struct SearchIndexClient {
    endpoint: String,
    index: String,
    api_version: String,
    credentials: CredentialChain,
}

#[derive(Serialize)]
struct SearchQuery<'a> {
    search: &'a str,
    top: usize,
}

#[derive(Deserialize)]
struct SearchResults {
    value: Vec<Map<String, Value>>,
}

impl SearchIndexClient {
    /// Build a client when the config names both an endpoint and an index.
    pub fn from_config(config: &SearchConfig) -> Option<Self> {
        let endpoint = config.endpoint.clone()?;
        let index = config.index.clone()?;
        Some(Self {
            endpoint,
            index,
            api_version: config.api_version.clone(),
            credentials: CredentialChain::new(config.api_key.clone()),
        })
    }

    fn search_url(&self) -> String {
        format!(
            "{}/indexes/{}/docs/search?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.index,
            self.api_version
        )
    }

    /// Run a full-text query against the index and return the raw
    /// documents.
    pub async fn search(
        &self,
        client: &reqwest::Client,
        query: &str,
        top: usize,
    ) -> Result<Vec<Map<String, Value>>> {
        let auth = self.credentials.resolve(client).await?;

        let req = client
            .post(self.search_url())
            .timeout(Duration::from_secs(SEARCH_TIMEOUT_SECS))
            .json(&SearchQuery { search: query, top });

        let req = match auth {
            SearchAuth::ApiKey(key) => req.header("api-key", key),
            SearchAuth::Bearer(token) => {
                req.header("Authorization", format!("Bearer {token}"))
            }
        };

        let resp = req
            .send()
            .await
            .context("Failed to reach the search index")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Search index returned {status}: {body}");
        }

        let body: SearchResults = resp
            .json()
            .await
            .context("Failed to parse the search response")?;

        Ok(body.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> SearchConfig {
        SearchConfig {
            endpoint: Some("https://example.search.windows.net".into()),
            index: Some("profile-docs".into()),
            api_key: Some("k".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_from_config_requires_endpoint() {
        let config = SearchConfig {
            endpoint: None,
            ..configured()
        };
        assert!(SearchIndexClient::from_config(&config).is_none());
    }

    #[test]
    fn test_from_config_requires_index() {
        let config = SearchConfig {
            index: None,
            ..configured()
        };
        assert!(SearchIndexClient::from_config(&config).is_none());
    }

    #[test]
    fn test_search_url_shape() {
        let client = SearchIndexClient::from_config(&configured()).unwrap();
        assert_eq!(
            client.search_url(),
            "https://example.search.windows.net/indexes/profile-docs/docs/search?api-version=2024-07-01"
        );
    }

    #[test]
    fn test_search_url_trims_trailing_slash() {
        let config = SearchConfig {
            endpoint: Some("https://example.search.windows.net/".into()),
            ..configured()
        };
        let client = SearchIndexClient::from_config(&config).unwrap();
        assert!(!client.search_url().contains("net//"));
    }

    #[test]
    fn test_results_parse_free_form_documents() {
        let json = r#"{"value":[{"@search.score":1.2,"content":"text","source_file":"a.md"}]}"#;
        let parsed: SearchResults = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.value.len(), 1);
        assert_eq!(parsed.value[0]["content"], "text");
    }
}
