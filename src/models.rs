use serde::{Deserialize, Serialize};
use std::path::Path;

/// The profile rendered on the landing page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub title: String,
    pub bio: String,
    pub email: String,
    pub location: String,
    pub skills: Vec<String>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: "Alex Doe".to_string(),
            title: "Software Engineer".to_string(),
            bio: "Passionate developer with experience in web and backend systems."
                .to_string(),
            email: "alex.doe@example.com".to_string(),
            location: "Toronto, Canada".to_string(),
            skills: vec![
                "Rust".to_string(),
                "Python".to_string(),
                "LLM".to_string(),
            ],
        }
    }
}

impl Profile {
    /// Load a profile from a JSON file, or fall back to the built-in one
    /// when no path is configured.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => {
                let data = std::fs::read_to_string(p).map_err(|e| {
                    anyhow::anyhow!("Failed to read profile file {}: {e}", p.display())
                })?;
                let profile = serde_json::from_str(&data).map_err(|e| {
                    anyhow::anyhow!("Failed to parse profile file {}: {e}", p.display())
                })?;
                Ok(profile)
            }
            None => Ok(Self::default()),
        }
    }
}

/// A single chat turn sent to the completion API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Ask request
#[derive(Debug, Clone, Deserialize)]
pub struct AskRequest {
    pub question: String,
    /// Ground the answer in retrieved documents instead of answering from
    /// the model alone.
    #[serde(default)]
    pub ground: bool,
}

/// Ask response
#[derive(Debug, Clone, Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub citations: Vec<Citation>,
    pub grounded: bool,
}

/// A numbered source reference, parallel to the `Source [N]` blocks in the
/// generation prompt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Citation {
    /// "[1]", "[2]", ...
    pub label: String,
    /// Human-readable source name (file name, document title)
    pub source: String,
}

/// A retrieved document, normalized from either retrieval backend.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedDoc {
    pub source: String,
    pub content: String,
    pub score: Option<f32>,
}

/// Search request
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_top")]
    pub top: usize,
}

fn default_top() -> usize {
    3
}

/// Search response
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query: String,
    /// Which retrieval backend served the request: "index", "local", or "none"
    pub backend: &'static str,
    pub results: Vec<RetrievedDoc>,
}

/// LLM config update request. Endpoints are intentionally absent: they are
/// immutable at runtime to prevent SSRF via the config API.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfigUpdate {
    pub azure_deployment: Option<String>,
    pub azure_api_key: Option<String>,
    pub openai_model: Option<String>,
    pub openai_api_key: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ask_request_ground_defaults_to_false() {
        let req: AskRequest = serde_json::from_str(r#"{"question":"hi"}"#).unwrap();
        assert!(!req.ground);
    }

    #[test]
    fn test_search_request_top_defaults_to_three() {
        let req: SearchRequest = serde_json::from_str(r#"{"query":"rust"}"#).unwrap();
        assert_eq!(req.top, 3);
    }

    #[test]
    fn test_profile_load_without_path_uses_default() {
        let profile = Profile::load(None).unwrap();
        assert_eq!(profile.name, "Alex Doe");
        assert!(!profile.skills.is_empty());
    }

    #[test]
    fn test_profile_load_missing_file_errors() {
        let result = Profile::load(Some(Path::new("/nonexistent/profile.json")));
        assert!(result.is_err());
    }

    #[test]
    fn test_profile_round_trips() {
        let profile = Profile::default();
        let json = serde_json::to_string(&profile).unwrap();
        let back: Profile = serde_json::from_str(&json).unwrap();
        assert_eq!(back.email, profile.email);
    }
}
