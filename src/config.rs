use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address
    pub bind_addr: String,
    /// Where the passage store is persisted
    pub data_dir: PathBuf,
    /// Directory of local documents to chunk and embed
    pub docs_dir: PathBuf,
    /// Optional JSON file overriding the built-in profile
    pub profile_path: Option<PathBuf>,
    /// Chat-completion provider configuration
    pub llm: LlmConfig,
    /// Remote search index configuration
    pub search: SearchConfig,
    /// Embedding provider for the local document store
    pub embedding: EmbeddingConfig,
    /// Chunking and retrieval settings
    pub rag: RagConfig,
}

/// Chat-completion providers, in fallback order: an Azure Foundry
/// deployment is preferred, the public OpenAI API is the fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Azure Foundry endpoint: either a full `/deployments/` URL or a base
    /// resource URL (the deployment name is then required)
    pub azure_endpoint: Option<String>,
    pub azure_api_key: Option<String>,
    pub azure_deployment: Option<String>,
    pub azure_api_version: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    /// Completion cap for plain (ungrounded) answers
    pub max_tokens: u32,
    /// Sampling temperature for plain answers; grounded answers always use 0.0
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            azure_endpoint: None,
            azure_api_key: None,
            azure_deployment: None,
            azure_api_version: "2025-01-01-preview".to_string(),
            openai_api_key: None,
            openai_model: "gpt-3.5-turbo".to_string(),
            max_tokens: 150,
            temperature: 0.7,
        }
    }
}

/// Remote search index (Azure AI Search wire format).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub endpoint: Option<String>,
    pub index: Option<String>,
    /// Admin/query key. When absent the credential chain falls back to the
    /// Azure CLI and then to a client-secret token.
    pub api_key: Option<String>,
    pub api_version: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            index: None,
            api_key: None,
            api_version: "2024-07-01".to_string(),
        }
    }
}

impl SearchConfig {
    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some() && self.index.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// "ollama" or "openai"
    pub provider: String,
    /// Base URL for the embedding API
    pub base_url: String,
    /// Embedding model name
    pub model: String,
    /// API key (only needed for cloud providers)
    pub api_key: Option<String>,
    /// Embedding vector dimension
    pub dim: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            model: "nomic-embed-text".to_string(),
            api_key: None,
            dim: 768,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Character budget per passage
    pub chunk_chars: usize,
    /// Trailing characters of a passage carried into the next one
    pub chunk_overlap: usize,
    /// Passages retrieved per question
    pub top_k: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_chars: 800,
            chunk_overlap: 100,
            top_k: 3,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            data_dir: PathBuf::from("./data"),
            docs_dir: PathBuf::from("./docs"),
            profile_path: None,
            llm: LlmConfig::default(),
            search: SearchConfig::default(),
            embedding: EmbeddingConfig::default(),
            rag: RagConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("PROFILE_ASK_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(dir) = std::env::var("PROFILE_ASK_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("PROFILE_ASK_DOCS_DIR") {
            config.docs_dir = PathBuf::from(dir);
        }
        if let Ok(path) = std::env::var("PROFILE_ASK_PROFILE") {
            config.profile_path = Some(PathBuf::from(path));
        }

        // Chat providers
        if let Ok(url) = std::env::var("AZURE_FOUNDRY_MODEL_ENDPOINT") {
            config.llm.azure_endpoint = normalize_endpoint(&url);
        }
        if let Ok(key) = std::env::var("AZURE_FOUNDRY_MODEL_API_KEY") {
            config.llm.azure_api_key = normalize_secret(&key);
        }
        if let Ok(dep) = std::env::var("AZURE_FOUNDRY_MODEL_DEPLOYMENT") {
            let dep = strip_quotes(&dep).to_string();
            if !dep.is_empty() {
                config.llm.azure_deployment = Some(dep);
            }
        }
        if let Ok(ver) = std::env::var("AZURE_FOUNDRY_MODEL_API_VERSION") {
            config.llm.azure_api_version = strip_quotes(&ver).to_string();
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            config.llm.openai_api_key = normalize_secret(&key);
        }
        if let Ok(model) = std::env::var("OPENAI_CHAT_MODEL") {
            config.llm.openai_model = model;
        }
        if let Ok(val) = std::env::var("LLM_MAX_TOKENS") {
            if let Ok(v) = val.parse() {
                config.llm.max_tokens = v;
            }
        }
        if let Ok(val) = std::env::var("LLM_TEMPERATURE") {
            if let Ok(v) = val.parse() {
                config.llm.temperature = v;
            }
        }

        // Search index
        if let Ok(url) = std::env::var("AZURE_SEARCH_SERVICE_ENDPOINT") {
            config.search.endpoint = normalize_endpoint(&url);
        }
        if let Ok(index) = std::env::var("AZURE_SEARCH_INDEX_NAME") {
            let index = strip_quotes(&index).to_string();
            if !index.is_empty() {
                config.search.index = Some(index);
            }
        }
        if let Ok(key) = std::env::var("AZURE_SEARCH_API_KEY") {
            config.search.api_key = normalize_secret(&key);
        }
        if let Ok(ver) = std::env::var("AZURE_SEARCH_API_VERSION") {
            config.search.api_version = ver;
        }

        // Embeddings
        if let Ok(provider) = std::env::var("EMBEDDING_PROVIDER") {
            config.embedding.provider = provider;
        }
        if let Ok(url) = std::env::var("EMBEDDING_BASE_URL") {
            config.embedding.base_url = url;
        }
        if let Ok(model) = std::env::var("EMBEDDING_MODEL") {
            config.embedding.model = model;
        }
        if let Ok(key) = std::env::var("EMBEDDING_API_KEY") {
            config.embedding.api_key = normalize_secret(&key);
        }
        if let Ok(val) = std::env::var("EMBEDDING_DIM") {
            if let Ok(v) = val.parse() {
                config.embedding.dim = v;
            }
        }

        // Chunking / retrieval
        if let Ok(val) = std::env::var("RAG_CHUNK_CHARS") {
            if let Ok(v) = val.parse() {
                config.rag.chunk_chars = v;
            }
        }
        if let Ok(val) = std::env::var("RAG_CHUNK_OVERLAP") {
            if let Ok(v) = val.parse() {
                config.rag.chunk_overlap = v;
            }
        }
        if let Ok(val) = std::env::var("RAG_TOP_K") {
            if let Ok(v) = val.parse() {
                config.rag.top_k = v;
            }
        }

        config
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("passages.json")
    }
}

/// Strip stray quotes that survive copy-pasted `.env` values.
pub fn strip_quotes(s: &str) -> &str {
    s.trim().trim_matches(|c| c == '"' || c == '\'')
}

/// Treat empty strings and `PUT-YOUR...` placeholders from `.env`
/// templates as unset.
pub fn normalize_secret(raw: &str) -> Option<String> {
    let s = strip_quotes(raw);
    if s.is_empty() || s.starts_with("PUT-YOUR") {
        None
    } else {
        Some(s.to_string())
    }
}

/// Normalize an endpoint URL: strip quotes, force https, prefix bare
/// hostnames. Empty values and placeholders map to None.
pub fn normalize_endpoint(raw: &str) -> Option<String> {
    let endpoint = strip_quotes(raw);
    if endpoint.is_empty() || endpoint.starts_with("PUT-YOUR") {
        return None;
    }

    let endpoint = if let Some(rest) = endpoint.strip_prefix("http://") {
        format!("https://{rest}")
    } else if endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("https://{endpoint}")
    };

    Some(endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ─── Endpoint normalization ──────────────────────────

    #[test]
    fn test_normalize_https_passthrough() {
        assert_eq!(
            normalize_endpoint("https://example.search.windows.net"),
            Some("https://example.search.windows.net".to_string())
        );
    }

    #[test]
    fn test_normalize_coerces_http() {
        assert_eq!(
            normalize_endpoint("http://example.com"),
            Some("https://example.com".to_string())
        );
    }

    #[test]
    fn test_normalize_prefixes_bare_host() {
        assert_eq!(
            normalize_endpoint("example.openai.azure.com"),
            Some("https://example.openai.azure.com".to_string())
        );
    }

    #[test]
    fn test_normalize_strips_quotes() {
        assert_eq!(
            normalize_endpoint("\"https://example.com\""),
            Some("https://example.com".to_string())
        );
        assert_eq!(
            normalize_endpoint("'example.com'"),
            Some("https://example.com".to_string())
        );
    }

    #[test]
    fn test_normalize_empty_is_none() {
        assert_eq!(normalize_endpoint(""), None);
        assert_eq!(normalize_endpoint("  "), None);
        assert_eq!(normalize_endpoint("\"\""), None);
    }

    #[test]
    fn test_normalize_placeholder_is_none() {
        assert_eq!(normalize_endpoint("PUT-YOUR-ENDPOINT-HERE"), None);
    }

    // ─── Secrets ─────────────────────────────────────────

    #[test]
    fn test_secret_placeholder_is_none() {
        assert_eq!(normalize_secret("PUT-YOUR-KEY-HERE"), None);
        assert_eq!(normalize_secret("\"PUT-YOUR-KEY-HERE\""), None);
    }

    #[test]
    fn test_secret_quoted_value() {
        assert_eq!(normalize_secret("'abc123'"), Some("abc123".to_string()));
    }

    // ─── Defaults ────────────────────────────────────────

    #[test]
    fn test_search_not_configured_by_default() {
        let config = SearchConfig::default();
        assert!(!config.is_configured());
    }

    #[test]
    fn test_search_configured_needs_endpoint_and_index() {
        let config = SearchConfig {
            endpoint: Some("https://x.search.windows.net".into()),
            index: None,
            ..Default::default()
        };
        assert!(!config.is_configured());

        let config = SearchConfig {
            endpoint: Some("https://x.search.windows.net".into()),
            index: Some("docs".into()),
            ..Default::default()
        };
        assert!(config.is_configured());
    }

    #[test]
    fn test_store_path_under_data_dir() {
        let config = Config {
            data_dir: PathBuf::from("/tmp/pa"),
            ..Default::default()
        };
        assert_eq!(config.store_path(), PathBuf::from("/tmp/pa/passages.json"));
    }
}
