//! Clients for the cloud LLM endpoints: chat completions and embeddings.

pub mod chat;
pub mod embeddings;
