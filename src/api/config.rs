use axum::extract::State;
use axum::Json;

use crate::models::LlmConfigUpdate;
use crate::state::AppState;

/// Config response with secrets redacted to booleans.
#[derive(serde::Serialize)]
pub struct LlmConfigResponse {
    pub azure_endpoint: Option<String>,
    pub azure_deployment: Option<String>,
    pub azure_api_version: String,
    pub openai_model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub has_azure_key: bool,
    pub has_openai_key: bool,
}

/// GET /api/config - current LLM configuration, keys redacted.
pub async fn get_config(State(state): State<AppState>) -> Json<LlmConfigResponse> {
    let config = state.llm.read();
    Json(LlmConfigResponse {
        azure_endpoint: config.azure_endpoint.clone(),
        azure_deployment: config.azure_deployment.clone(),
        azure_api_version: config.azure_api_version.clone(),
        openai_model: config.openai_model.clone(),
        max_tokens: config.max_tokens,
        temperature: config.temperature,
        has_azure_key: config.azure_api_key.is_some(),
        has_openai_key: config.openai_api_key.is_some(),
    })
}

/// PUT /api/config - update LLM settings.
pub async fn update_config(
    State(state): State<AppState>,
    Json(update): Json<LlmConfigUpdate>,
) -> Json<LlmConfigResponse> {
    {
        let mut config = state.llm.write();

        // Endpoints are immutable at runtime (env vars only) to prevent
        // SSRF: an attacker changing one could exfiltrate the API key.
        if let Some(deployment) = update.azure_deployment {
            config.azure_deployment = Some(deployment);
        }
        if let Some(key) = update.azure_api_key {
            config.azure_api_key = Some(key);
        }
        if let Some(model) = update.openai_model {
            config.openai_model = model;
        }
        if let Some(key) = update.openai_api_key {
            config.openai_api_key = Some(key);
        }
        if let Some(max_tokens) = update.max_tokens {
            config.max_tokens = max_tokens;
        }
        if let Some(temperature) = update.temperature {
            config.temperature = temperature;
        }
    }

    get_config(State(state)).await
}
