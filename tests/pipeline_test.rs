//! Integration tests for the local retrieval pipeline.
//!
//! These exercise the chunk → store → retrieve → context-assembly flow
//! without requiring a running LLM (embeddings are synthetic).

use profile_ask::models::RetrievedDoc;
use profile_ask::rag::chunk::chunk_text;
use profile_ask::rag::pipeline::build_context;
use profile_ask::rag::store::DocumentStore;

/// Helper: a small bio document with paragraph structure.
fn sample_bio() -> &'static str {
    "Alex Doe is a software engineer based in Toronto.\n\
     Over the last decade they have shipped backend services in Rust and Python.\n\
     \n\
     Alex maintains several open source crates for HTTP clients and parsers.\n\
     They speak regularly at community meetups about async programming.\n\
     \n\
     Outside of work, Alex restores vintage synthesizers and hikes the Bruce Trail."
}

#[test]
fn test_chunk_then_store_then_search() {
    let dir = tempfile::tempdir().unwrap();
    let store = DocumentStore::open_or_create(&dir.path().join("passages.json")).unwrap();

    // Tight budget so each paragraph becomes its own passage
    let passages = chunk_text(sample_bio(), 160, 0);
    assert!(passages.len() >= 3, "expected one passage per paragraph");

    // Synthetic embeddings: one axis per passage
    let embeddings: Vec<Vec<f32>> = (0..passages.len())
        .map(|i| {
            let mut v = vec![0.0f32; passages.len()];
            v[i] = 1.0;
            v
        })
        .collect();

    store
        .replace_source("bio.md", &passages, embeddings)
        .unwrap();
    assert_eq!(store.passage_count(), passages.len());

    // Query pointing at the second passage's axis
    let mut query = vec![0.0f32; passages.len()];
    query[1] = 1.0;
    let hits = store.search(&query, 2);

    assert_eq!(hits[0].content, passages[1].content);
    assert!(hits[0].score > hits[1].score);
    assert_eq!(hits[0].source, "bio.md");
}

#[test]
fn test_hits_become_numbered_context_with_citations() {
    let dir = tempfile::tempdir().unwrap();
    let store = DocumentStore::open_or_create(&dir.path().join("passages.json")).unwrap();

    let passages = chunk_text(sample_bio(), 160, 0);
    let embeddings: Vec<Vec<f32>> =
        passages.iter().map(|_| vec![0.5f32, 0.5f32]).collect();
    store
        .replace_source("bio.md", &passages, embeddings)
        .unwrap();

    let docs: Vec<RetrievedDoc> = store
        .search(&[0.5, 0.5], 3)
        .into_iter()
        .map(|hit| RetrievedDoc {
            source: hit.source,
            content: hit.content,
            score: Some(hit.score),
        })
        .collect();

    let (context, citations) = build_context(&docs);

    assert_eq!(citations.len(), docs.len());
    for (i, citation) in citations.iter().enumerate() {
        assert_eq!(citation.label, format!("[{}]", i + 1));
        assert_eq!(citation.source, "bio.md");
        assert!(context.contains(&format!("Source [{}]:", i + 1)));
    }
}

#[test]
fn test_reindex_replaces_stale_passages() {
    let dir = tempfile::tempdir().unwrap();
    let store = DocumentStore::open_or_create(&dir.path().join("passages.json")).unwrap();

    let v1 = chunk_text("Old bio content about Java.", 800, 0);
    store
        .replace_source("bio.md", &v1, vec![vec![1.0, 0.0]])
        .unwrap();

    let v2 = chunk_text("New bio content about Rust.", 800, 0);
    store
        .replace_source("bio.md", &v2, vec![vec![0.0, 1.0]])
        .unwrap();

    let hits = store.search(&[0.0, 1.0], 5);
    assert_eq!(hits.len(), 1);
    assert!(hits[0].content.contains("Rust"));
}

#[test]
fn test_multiple_sources_tracked_independently() {
    let dir = tempfile::tempdir().unwrap();
    let store = DocumentStore::open_or_create(&dir.path().join("passages.json")).unwrap();

    let bio = chunk_text("A short bio.", 800, 0);
    let talks = chunk_text("A list of conference talks.", 800, 0);
    store
        .replace_source("bio.md", &bio, vec![vec![1.0, 0.0]])
        .unwrap();
    store
        .replace_source("talks.md", &talks, vec![vec![0.0, 1.0]])
        .unwrap();

    let counts = store.source_counts();
    assert_eq!(counts.len(), 2);
    assert_eq!(counts["bio.md"], 1);
    assert_eq!(counts["talks.md"], 1);

    store.delete_source("bio.md").unwrap();
    let hits = store.search(&[1.0, 0.0], 5);
    assert!(hits.iter().all(|h| h.source == "talks.md"));
}

#[test]
fn test_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("passages.json");

    {
        let store = DocumentStore::open_or_create(&path).unwrap();
        let passages = chunk_text(sample_bio(), 160, 40);
        let embeddings: Vec<Vec<f32>> =
            passages.iter().map(|_| vec![0.1f32, 0.9f32]).collect();
        store
            .replace_source("bio.md", &passages, embeddings)
            .unwrap();
    }

    let reopened = DocumentStore::open_or_create(&path).unwrap();
    assert!(!reopened.is_empty());
    let hits = reopened.search(&[0.1, 0.9], 1);
    assert_eq!(hits[0].source, "bio.md");
}
