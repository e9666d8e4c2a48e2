//! Retrieval-augmented generation: chunking, the local passage store, and
//! the retrieve → augment → generate pipeline.

pub mod chunk;
pub mod pipeline;
pub mod store;

use anyhow::{Context, Result};
use std::path::Path;

use crate::llm::embeddings;
use crate::state::AppState;

/// Chunk and embed every document in the configured docs directory,
/// replacing each source's passages in the store. Returns the number of
/// documents indexed.
pub async fn index_docs(state: &AppState) -> Result<usize> {
    let docs_dir = &state.config.docs_dir;
    if !docs_dir.is_dir() {
        tracing::debug!("Docs directory {} does not exist; nothing to index", docs_dir.display());
        return Ok(0);
    }

    let mut paths: Vec<_> = std::fs::read_dir(docs_dir)
        .with_context(|| format!("Failed to read docs directory {}", docs_dir.display()))?
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| is_doc_file(p))
        .collect();
    paths.sort();

    let embedding_config = state.config.embedding.clone();
    let mut indexed = 0usize;

    for path in paths {
        let source = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .to_string();
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let passages = chunk::chunk_text(
            &content,
            state.config.rag.chunk_chars,
            state.config.rag.chunk_overlap,
        );
        if passages.is_empty() {
            continue;
        }

        let texts: Vec<String> = passages.iter().map(|p| p.content.clone()).collect();
        let embeddings =
            embeddings::embed_passages(&state.http_client, &embedding_config, &texts).await?;

        if let Some(first) = embeddings.first() {
            if first.len() != embedding_config.dim {
                tracing::warn!(
                    "Embedding dimension mismatch for {source}: got {}, config says {}",
                    first.len(),
                    embedding_config.dim
                );
            }
        }

        state.store.replace_source(&source, &passages, embeddings)?;
        tracing::info!("Indexed {source} ({} passages)", passages.len());
        indexed += 1;
    }

    Ok(indexed)
}

fn is_doc_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("txt") | Some("md")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_file_extensions() {
        assert!(is_doc_file(Path::new("notes.txt")));
        assert!(is_doc_file(Path::new("bio.md")));
        assert!(!is_doc_file(Path::new("photo.png")));
        assert!(!is_doc_file(Path::new("Makefile")));
    }
}
