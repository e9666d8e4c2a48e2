//! Connectivity probe for the chat-completion providers.
//!
//! Usage:
//!     check_llm "Hello"
//!
//! Reads the same environment (or `.env`) as the server. Exits 0 on
//! success, 1 when no provider is configured, 2 on a failed request.

use profile_ask::config::Config;
use profile_ask::llm::chat::{self, ChatOptions};
use profile_ask::models::ChatMessage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let prompt = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let prompt = if prompt.is_empty() {
        "Hello from the connectivity probe".to_string()
    } else {
        prompt
    };

    let config = Config::from_env();
    if !chat::is_configured(&config.llm) {
        eprintln!(
            "No provider configured. Set AZURE_FOUNDRY_MODEL_ENDPOINT and \
             AZURE_FOUNDRY_MODEL_API_KEY, or OPENAI_API_KEY."
        );
        std::process::exit(1);
    }

    let client = reqwest::Client::builder()
        .connect_timeout(std::time::Duration::from_secs(10))
        .timeout(std::time::Duration::from_secs(60))
        .build()?;

    println!("Prompt: {prompt}");
    let messages = vec![ChatMessage::user(prompt)];
    match chat::complete(&client, &config.llm, messages, ChatOptions::plain(&config.llm)).await
    {
        Ok(answer) => {
            println!("--- Assistant response ---");
            println!("{answer}");
            Ok(())
        }
        Err(e) => {
            eprintln!("Request failed: {e:#}");
            std::process::exit(2);
        }
    }
}
