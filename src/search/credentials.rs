//! Credential fallback chain for the search service.
//!
//! Resolution order mirrors the managed-identity ladder: an explicit API
//! key wins, then a token minted by the Azure CLI (`az account
//! get-access-token`), then a client-credentials token from
//! `AZURE_TENANT_ID` / `AZURE_CLIENT_ID` / `AZURE_CLIENT_SECRET`.
//! Bearer tokens are cached until shortly before expiry.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;
use serde::Deserialize;

/// OAuth resource / scope root for the search service.
const SEARCH_RESOURCE: &str = "https://search.azure.com";

/// Tokens are refreshed this long before they actually expire.
const REFRESH_MARGIN_SECS: i64 = 120;

/// An authorization resolved from the chain, ready to stamp on a request.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchAuth {
    /// `api-key` header
    ApiKey(String),
    /// `Authorization: Bearer` header
    Bearer(String),
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(REFRESH_MARGIN_SECS) < self.expires_at
    }
}

pub struct CredentialChain {
    api_key: Option<String>,
    cached: Mutex<Option<CachedToken>>,
}

impl CredentialChain {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            cached: Mutex::new(None),
        }
    }

    /// Walk the chain and produce an authorization for the next request.
    pub async fn resolve(&self, client: &reqwest::Client) -> Result<SearchAuth> {
        if let Some(key) = &self.api_key {
            return Ok(SearchAuth::ApiKey(key.clone()));
        }

        if let Some(cached) = self.cached.lock().clone() {
            if cached.is_fresh(Utc::now()) {
                return Ok(SearchAuth::Bearer(cached.token));
            }
        }

        let token = match cli_token().await {
            Ok(token) => token,
            Err(cli_err) => {
                tracing::debug!("Azure CLI credential unavailable: {cli_err:#}");
                client_secret_token(client).await.context(
                    "No search credential available: set AZURE_SEARCH_API_KEY, log in \
                     with the Azure CLI, or provide a service principal",
                )?
            }
        };

        let auth = SearchAuth::Bearer(token.token.clone());
        *self.cached.lock() = Some(token);
        Ok(auth)
    }
}

// ─── Azure CLI ───────────────────────────────────────────

#[derive(Deserialize)]
struct CliTokenResponse {
    #[serde(rename = "accessToken")]
    access_token: String,
    /// Unix seconds; present on recent CLI versions.
    #[serde(rename = "expires_on")]
    expires_on: Option<i64>,
}

async fn cli_token() -> Result<CachedToken> {
    let output = tokio::process::Command::new("az")
        .args([
            "account",
            "get-access-token",
            "--resource",
            SEARCH_RESOURCE,
            "--output",
            "json",
        ])
        .output()
        .await
        .context("Failed to run the Azure CLI")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("az account get-access-token failed: {}", stderr.trim());
    }

    let parsed: CliTokenResponse = serde_json::from_slice(&output.stdout)
        .context("Failed to parse the Azure CLI token output")?;

    let expires_at = parsed
        .expires_on
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
        // Old CLI versions only emit a local-time string; assume a short
        // lifetime rather than parse it.
        .unwrap_or_else(|| Utc::now() + Duration::minutes(5));

    Ok(CachedToken {
        token: parsed.access_token,
        expires_at,
    })
}

// ─── Client-credentials flow ─────────────────────────────

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

async fn client_secret_token(client: &reqwest::Client) -> Result<CachedToken> {
    let tenant = std::env::var("AZURE_TENANT_ID")
        .context("AZURE_TENANT_ID is not set")?;
    let client_id = std::env::var("AZURE_CLIENT_ID")
        .context("AZURE_CLIENT_ID is not set")?;
    let client_secret = std::env::var("AZURE_CLIENT_SECRET")
        .context("AZURE_CLIENT_SECRET is not set")?;

    let url = format!("https://login.microsoftonline.com/{tenant}/oauth2/v2.0/token");
    let scope = format!("{SEARCH_RESOURCE}/.default");

    let resp = client
        .post(&url)
        .form(&[
            ("grant_type", "client_credentials"),
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret.as_str()),
            ("scope", scope.as_str()),
        ])
        .send()
        .await
        .context("Failed to reach the token endpoint")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Token endpoint returned {status}: {body}");
    }

    let parsed: TokenResponse = resp
        .json()
        .await
        .context("Failed to parse the token response")?;

    Ok(CachedToken {
        token: parsed.access_token,
        expires_at: Utc::now() + Duration::seconds(parsed.expires_in),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_api_key_short_circuits_the_chain() {
        let chain = CredentialChain::new(Some("secret".to_string()));
        let client = reqwest::Client::new();
        let auth = chain.resolve(&client).await.unwrap();
        assert_eq!(auth, SearchAuth::ApiKey("secret".to_string()));
    }

    #[test]
    fn test_cached_token_fresh_before_margin() {
        let token = CachedToken {
            token: "t".into(),
            expires_at: Utc::now() + Duration::minutes(10),
        };
        assert!(token.is_fresh(Utc::now()));
    }

    #[test]
    fn test_cached_token_stale_inside_margin() {
        let token = CachedToken {
            token: "t".into(),
            expires_at: Utc::now() + Duration::seconds(60),
        };
        assert!(!token.is_fresh(Utc::now()));
    }

    #[test]
    fn test_cached_token_stale_after_expiry() {
        let token = CachedToken {
            token: "t".into(),
            expires_at: Utc::now() - Duration::seconds(1),
        };
        assert!(!token.is_fresh(Utc::now()));
    }

    #[test]
    fn test_cli_token_output_parses() {
        let json = r#"{"accessToken":"abc","expires_on":1754000000,"subscription":"s","tenant":"t","tokenType":"Bearer"}"#;
        let parsed: CliTokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.access_token, "abc");
        assert_eq!(parsed.expires_on, Some(1754000000));
    }

    #[test]
    fn test_cli_token_output_without_unix_expiry_parses() {
        let json = r#"{"accessToken":"abc","expiresOn":"2026-01-01 10:00:00.000000"}"#;
        let parsed: CliTokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.expires_on, None);
    }
}
