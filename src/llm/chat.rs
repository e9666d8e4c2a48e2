//! Chat-completion client with an Azure Foundry → OpenAI fallback chain.
//!
//! An Azure Foundry deployment is preferred when both its endpoint and key
//! are configured; otherwise the public OpenAI API is used. A failure of
//! the selected provider is reported as-is rather than silently retried on
//! the other one.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::LlmConfig;
use crate::models::ChatMessage;

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Shown as the answer when neither provider is configured.
pub const NOT_CONFIGURED_MSG: &str = "No AI API key configured. Set OPENAI_API_KEY or \
     AZURE_FOUNDRY_MODEL_API_KEY in the environment to get an AI response.";

/// Which provider the fallback chain selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    AzureFoundry,
    OpenAi,
}

/// Pick a provider: Azure Foundry when endpoint + key are present,
/// otherwise OpenAI when its key is present.
pub fn pick_provider(config: &LlmConfig) -> Option<Provider> {
    if config.azure_endpoint.is_some() && config.azure_api_key.is_some() {
        Some(Provider::AzureFoundry)
    } else if config.openai_api_key.is_some() {
        Some(Provider::OpenAi)
    } else {
        None
    }
}

pub fn is_configured(config: &LlmConfig) -> bool {
    pick_provider(config).is_some()
}

/// Per-call generation options.
#[derive(Debug, Clone, Copy)]
pub struct ChatOptions {
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl ChatOptions {
    /// Options for the plain /ask path, from config.
    pub fn plain(config: &LlmConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_tokens: Some(config.max_tokens),
        }
    }

    /// Deterministic generation for grounded answers; no completion cap so
    /// the model can cite every source.
    pub fn grounded() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: None,
        }
    }
}

/// Send a chat completion through the provider fallback chain and return
/// the assistant's content.
pub async fn complete(
    client: &reqwest::Client,
    config: &LlmConfig,
    messages: Vec<ChatMessage>,
    opts: ChatOptions,
) -> Result<String> {
    match pick_provider(config) {
        Some(Provider::AzureFoundry) => call_azure(client, config, messages, opts).await,
        Some(Provider::OpenAi) => call_openai(client, config, messages, opts).await,
        None => anyhow::bail!("No chat-completion provider is configured"),
    }
}

/// Build the Azure deployments URL. An endpoint that already contains
/// `/deployments/` is used verbatim; a base resource URL needs the
/// deployment name appended.
pub fn build_azure_url(
    endpoint: &str,
    deployment: Option<&str>,
    api_version: &str,
) -> Result<String> {
    if endpoint.contains("/deployments/") {
        return Ok(endpoint.to_string());
    }
    let deployment = deployment
        .context("A deployment name is required when the Azure endpoint is a base URL")?;
    Ok(format!(
        "{}/openai/deployments/{}/chat/completions?api-version={}",
        endpoint.trim_end_matches('/'),
        deployment,
        api_version
    ))
}

// ─── Wire types ──────────────────────────────────────────

#[derive(Serialize)]
struct AzureChatRequest {
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct OpenAiChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

// ─── Providers ───────────────────────────────────────────

async fn call_azure(
    client: &reqwest::Client,
    config: &LlmConfig,
    messages: Vec<ChatMessage>,
    opts: ChatOptions,
) -> Result<String> {
    let endpoint = config
        .azure_endpoint
        .as_deref()
        .context("Azure endpoint is not configured")?;
    let api_key = config
        .azure_api_key
        .as_deref()
        .context("Azure API key is not configured")?;

    let url = build_azure_url(
        endpoint,
        config.azure_deployment.as_deref(),
        &config.azure_api_version,
    )?;

    let req = AzureChatRequest {
        messages,
        temperature: opts.temperature,
        max_tokens: opts.max_tokens,
    };

    let resp = client
        .post(&url)
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .header("api-key", api_key)
        .json(&req)
        .send()
        .await
        .context("Failed to reach the Azure Foundry endpoint")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!(
            "Azure Foundry request failed (status={status}): {}",
            error_snippet(&body)
        );
    }

    let body: ChatResponse = resp
        .json()
        .await
        .context("Azure Foundry returned a non-JSON response")?;

    extract_content(body)
}

async fn call_openai(
    client: &reqwest::Client,
    config: &LlmConfig,
    messages: Vec<ChatMessage>,
    opts: ChatOptions,
) -> Result<String> {
    let api_key = config
        .openai_api_key
        .as_deref()
        .context("OpenAI API key is not configured")?;

    let req = OpenAiChatRequest {
        model: config.openai_model.clone(),
        messages,
        temperature: opts.temperature,
        max_tokens: opts.max_tokens,
    };

    let resp = client
        .post(OPENAI_CHAT_URL)
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .header("Authorization", format!("Bearer {api_key}"))
        .json(&req)
        .send()
        .await
        .context("Failed to reach the OpenAI API")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!(
            "OpenAI request failed (status={status}): {}",
            error_snippet(&body)
        );
    }

    let body: ChatResponse = resp
        .json()
        .await
        .context("OpenAI returned a non-JSON response")?;

    extract_content(body)
}

fn extract_content(body: ChatResponse) -> Result<String> {
    body.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .context("The response did not contain assistant content")
}

/// Flatten and cap an upstream error body so it fits on one log line.
fn error_snippet(body: &str) -> String {
    let flat = body.replace('\n', " ");
    let mut end = flat.len().min(500);
    while !flat.is_char_boundary(end) {
        end -= 1;
    }
    flat[..end].to_string()
}

/// Strip ChatML control tokens from user-supplied text before it is
/// embedded in a prompt.
pub fn sanitize_for_prompt(text: &str) -> String {
    text.replace("<|im_start|>", "").replace("<|im_end|>", "")
}
