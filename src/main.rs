use axum::response::Html;
use axum::routing::{get, post, put};
use axum::Router;
use tracing_subscriber::EnvFilter;

use profile_ask::api;
use profile_ask::config::Config;
use profile_ask::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so local keys are available during development
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!(
        "Chat providers: azure={} openai={}",
        config.llm.azure_endpoint.is_some() && config.llm.azure_api_key.is_some(),
        config.llm.openai_api_key.is_some()
    );
    tracing::info!(
        "Retrieval: index={} docs_dir={}",
        config.search.is_configured(),
        config.docs_dir.display()
    );

    let state = AppState::new(config)?;

    // Index local documents at startup when the store is empty; the
    // /api/search/reindex endpoint handles refreshes after that.
    if state.store.is_empty() && state.config.docs_dir.is_dir() {
        let index_state = state.clone();
        tokio::spawn(async move {
            match profile_ask::rag::index_docs(&index_state).await {
                Ok(count) => tracing::info!("Indexed {count} documents at startup"),
                Err(e) => tracing::error!("Initial document indexing failed: {e:#}"),
            }
        });
    }

    // No CORS layer: the page is served from the same origin so
    // cross-origin access is unnecessary.
    let app = Router::new()
        // Serve frontend
        .route("/", get(serve_index))
        // API routes
        .route("/api/profile", get(api::profile::get_profile))
        .route("/api/ask", post(api::ask::ask))
        .route("/api/search", post(api::search::search))
        .route("/api/search/reindex", post(api::search::reindex))
        .route("/api/config", get(api::config::get_config))
        .route("/api/config", put(api::config::update_config))
        .with_state(state.clone())
        .fallback(get(serve_index));

    let listener = tokio::net::TcpListener::bind(&state.config.bind_addr).await?;
    tracing::info!("Server listening on {}", state.config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn serve_index() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}
