use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::llm::chat::{self, ChatOptions, Provider, NOT_CONFIGURED_MSG};
use crate::models::{AskRequest, AskResponse, ChatMessage};
use crate::rag::pipeline;
use crate::state::AppState;

const MAX_QUESTION_LEN: usize = 2000;

/// POST /api/ask - answer a question, plain or grounded.
///
/// Provider misconfiguration and upstream failures come back as friendly
/// answer text with HTTP 200, so the page always renders something.
pub async fn ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, (StatusCode, String)> {
    let question = req.question.trim();
    if question.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Question is required".to_string()));
    }
    let question =
        chat::sanitize_for_prompt(&truncate_to_char_boundary(question, MAX_QUESTION_LEN));

    let _permit = state
        .ask_semaphore
        .clone()
        .acquire_owned()
        .await
        .map_err(|_| {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Ask service at capacity".to_string(),
            )
        })?;

    let llm = state.llm.read().clone();
    if !chat::is_configured(&llm) {
        return Ok(Json(AskResponse {
            answer: NOT_CONFIGURED_MSG.to_string(),
            citations: Vec::new(),
            grounded: req.ground,
        }));
    }

    if req.ground {
        match pipeline::answer_grounded(&state, &question).await {
            Ok(grounded) => Ok(Json(AskResponse {
                answer: grounded.answer,
                citations: grounded.citations,
                grounded: true,
            })),
            Err(e) => {
                tracing::warn!("Grounded answer failed: {e:#}");
                Ok(Json(AskResponse {
                    answer: format!("Failed to generate a grounded answer: {e:#}"),
                    citations: Vec::new(),
                    grounded: true,
                }))
            }
        }
    } else {
        let messages = vec![ChatMessage::user(question)];
        let opts = ChatOptions::plain(&llm);
        match chat::complete(&state.http_client, &llm, messages, opts).await {
            Ok(answer) => Ok(Json(AskResponse {
                answer,
                citations: Vec::new(),
                grounded: false,
            })),
            Err(e) => {
                tracing::warn!("Chat completion failed: {e:#}");
                let answer = match chat::pick_provider(&llm) {
                    Some(Provider::AzureFoundry) => {
                        format!("Failed to fetch response from the Azure Foundry model: {e:#}")
                    }
                    _ => "Failed to fetch response from OpenAI.".to_string(),
                };
                Ok(Json(AskResponse {
                    answer,
                    citations: Vec::new(),
                    grounded: false,
                }))
            }
        }
    }
}

fn truncate_to_char_boundary(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    s.char_indices()
        .take_while(|(i, _)| *i < max_len)
        .map(|(_, c)| c)
        .collect()
}
