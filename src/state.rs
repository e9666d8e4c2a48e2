use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::{Config, LlmConfig};
use crate::models::Profile;
use crate::rag::store::DocumentStore;
use crate::search::remote::SearchIndexClient;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub profile: Arc<Profile>,
    pub http_client: reqwest::Client,
    pub llm: Arc<RwLock<LlmConfig>>,
    pub store: Arc<DocumentStore>,
    pub search_index: Option<Arc<SearchIndexClient>>,
    pub ask_semaphore: Arc<tokio::sync::Semaphore>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;

        let profile = Profile::load(config.profile_path.as_deref())?;
        let store = DocumentStore::open_or_create(&config.store_path())?;
        let search_index = SearchIndexClient::from_config(&config.search).map(Arc::new);
        let llm = config.llm.clone();

        Ok(Self {
            config,
            profile: Arc::new(profile),
            http_client: reqwest::Client::builder()
                .connect_timeout(std::time::Duration::from_secs(10))
                .timeout(std::time::Duration::from_secs(120))
                .build()?,
            llm: Arc::new(RwLock::new(llm)),
            store: Arc::new(store),
            search_index,
            ask_semaphore: Arc::new(tokio::sync::Semaphore::new(3)),
        })
    }
}
