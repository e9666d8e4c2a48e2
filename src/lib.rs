//! # profile-ask
//!
//! A personal-profile web application with an "ask" page that forwards
//! questions to a cloud chat-completion endpoint, optionally grounding the
//! answer in retrieved documents (RAG).
//!
//! ## Architecture
//!
//! The grounded answer path is a short sequential pipeline:
//!
//! ```text
//!                    ┌──────────────┐
//!                    │   Question   │
//!                    └──────┬───────┘
//!                           │
//!                           ▼
//!              ┌─────────────────────────┐
//!              │        RETRIEVE         │
//!              │  remote search index OR │
//!              │  local vector store     │
//!              └────────────┬────────────┘
//!                           │ top-k documents
//!                           ▼
//!              ┌─────────────────────────┐
//!              │         AUGMENT         │
//!              │ "Source [N]: ..." blocks│
//!              │  + "[N] name" citations │
//!              └────────────┬────────────┘
//!                           │ context + question
//!                           ▼
//!              ┌─────────────────────────┐
//!              │        GENERATE         │
//!              │  chat completion, t=0.0 │
//!              │  Azure Foundry → OpenAI │
//!              └────────────┬────────────┘
//!                           │
//!                           ▼
//!              ┌─────────────────────────┐
//!              │   Answer + citations    │
//!              └─────────────────────────┘
//! ```
//!
//! The ungrounded path skips retrieval and sends the question straight
//! through the same provider fallback chain.
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for the server, LLM
//!   providers, search index, embeddings, and chunking
//! - [`models`] - Shared data types: `Profile`, ask/search request and
//!   response types, `Citation`
//! - [`llm::chat`] - Chat-completion client with an Azure Foundry → OpenAI
//!   provider fallback chain
//! - [`llm::embeddings`] - Batch embedding generation via Ollama or
//!   OpenAI-compatible APIs
//! - [`search`] - Remote search-index REST client and its credential
//!   fallback chain (API key → CLI token → client secret)
//! - [`rag`] - Passage chunking, the local vector store, and the
//!   retrieve → augment → generate pipeline
//! - [`api`] - Axum HTTP handlers for the profile, ask, search, and config
//!   endpoints
//! - [`state`] - Shared application state holding the store, config, and
//!   HTTP client

pub mod api;
pub mod config;
pub mod llm;
pub mod models;
pub mod rag;
pub mod search;
pub mod state;
