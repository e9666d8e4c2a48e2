use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::rag::chunk::Passage;

/// A stored passage with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredPassage {
    doc_id: Uuid,
    source: String,
    chunk_index: usize,
    content: String,
    start_line: usize,
    end_line: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedStore {
    indexed_at: Option<DateTime<Utc>>,
    entries: Vec<StoredPassage>,
}

/// In-memory passage store with disk persistence and cosine similarity
/// search.
pub struct DocumentStore {
    inner: RwLock<PersistedStore>,
    persist_path: PathBuf,
}

/// A retrieval hit from the local store.
#[derive(Debug, Clone)]
pub struct PassageHit {
    pub doc_id: Uuid,
    pub source: String,
    pub chunk_index: usize,
    pub content: String,
    pub start_line: usize,
    pub end_line: usize,
    pub score: f32,
}

impl DocumentStore {
    pub fn open_or_create(persist_path: &Path) -> Result<Self> {
        if let Some(parent) = persist_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let inner = if persist_path.exists() {
            let data = std::fs::read_to_string(persist_path)
                .context("Failed to read the passage store")?;
            serde_json::from_str(&data).unwrap_or_default()
        } else {
            PersistedStore::default()
        };

        Ok(Self {
            inner: RwLock::new(inner),
            persist_path: persist_path.to_path_buf(),
        })
    }

    /// Replace all passages for a source document. `embeddings` must be
    /// parallel with `passages`.
    pub fn replace_source(
        &self,
        source: &str,
        passages: &[Passage],
        embeddings: Vec<Vec<f32>>,
    ) -> Result<()> {
        let doc_id = Uuid::new_v4();
        let mut inner = self.inner.write();

        inner.entries.retain(|e| e.source != source);
        for (i, passage) in passages.iter().enumerate() {
            if let Some(embedding) = embeddings.get(i) {
                inner.entries.push(StoredPassage {
                    doc_id,
                    source: source.to_string(),
                    chunk_index: i,
                    content: passage.content.clone(),
                    start_line: passage.start_line,
                    end_line: passage.end_line,
                    embedding: embedding.clone(),
                });
            }
        }
        inner.indexed_at = Some(Utc::now());

        self.persist(&inner)
    }

    /// Delete all passages for a source document.
    pub fn delete_source(&self, source: &str) -> Result<()> {
        let mut inner = self.inner.write();
        inner.entries.retain(|e| e.source != source);
        self.persist(&inner)
    }

    /// Search by cosine similarity against a query embedding.
    pub fn search(&self, query_embedding: &[f32], limit: usize) -> Vec<PassageHit> {
        let inner = self.inner.read();

        let mut scored: Vec<(f32, &StoredPassage)> = inner
            .entries
            .iter()
            .map(|e| (cosine_similarity(query_embedding, &e.embedding), e))
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);

        scored
            .into_iter()
            .map(|(score, e)| PassageHit {
                doc_id: e.doc_id,
                source: e.source.clone(),
                chunk_index: e.chunk_index,
                content: e.content.clone(),
                start_line: e.start_line,
                end_line: e.end_line,
                score,
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }

    pub fn passage_count(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn indexed_at(&self) -> Option<DateTime<Utc>> {
        self.inner.read().indexed_at
    }

    /// Passage counts grouped by source document.
    pub fn source_counts(&self) -> HashMap<String, usize> {
        let inner = self.inner.read();
        let mut counts = HashMap::new();
        for e in inner.entries.iter() {
            *counts.entry(e.source.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Atomic write via temp file + rename.
    fn persist(&self, inner: &PersistedStore) -> Result<()> {
        let data = serde_json::to_string(inner)?;
        let tmp_path = self.persist_path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &data).context("Failed to write the passage store")?;
        std::fs::rename(&tmp_path, &self.persist_path)
            .context("Failed to replace the passage store")?;
        Ok(())
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for i in 0..a.len() {
        dot += a[i] * b[i];
        norm_a += a[i] * a[i];
        norm_b += b[i] * b[i];
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}
