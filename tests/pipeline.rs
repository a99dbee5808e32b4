//! End-to-end pipeline tests against the in-memory store.
//!
//! Embeddings are supplied by a fixture embedder with hand-picked
//! vectors. Each chunk owns one axis of an 8-dimensional space and the
//! jump-start query sits on axis 0, so a chunk's first component is
//! exactly its cosine similarity to that query and the threshold
//! behavior is deterministic.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use mayday::config::RetrievalConfig;
use mayday::embedding::QueryEmbedder;
use mayday::models::{ChunkPayload, QueryContext};
use mayday::retriever::{Outcome, Retriever};
use mayday::store::{MemoryStore, StorePoint, VectorStore};

/// Deterministic embedder: known texts map to fixed vectors, anything
/// else gets the fallback vector.
struct FixtureEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    fallback: Vec<f32>,
}

impl FixtureEmbedder {
    fn new(entries: &[(&str, &[f32])], fallback: &[f32]) -> Self {
        Self {
            vectors: entries
                .iter()
                .map(|(text, v)| (text.to_string(), v.to_vec()))
                .collect(),
            fallback: fallback.to_vec(),
        }
    }
}

#[async_trait]
impl QueryEmbedder for FixtureEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self
            .vectors
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone()))
    }
}

fn point(chunk_id: &str, scenario: Option<&str>, text: &str, vector: &[f32]) -> StorePoint {
    StorePoint {
        id: format!("pt-{}", chunk_id),
        vector: vector.to_vec(),
        payload: ChunkPayload {
            chunk_id: chunk_id.to_string(),
            text: text.to_string(),
            page: Some(401),
            section: Some("emergency_situations".to_string()),
            scenario: scenario.map(str::to_string),
        },
    }
}

/// Corpus with a jump-starting procedure spread over adjacent chunks
/// plus an unrelated towing chunk. Axis 0 carries similarity to the
/// jump-start query; axis 6 carries similarity to the towing query,
/// held at 0.53 so it lands just below the 0.58 threshold.
async fn seeded_store() -> Arc<dyn VectorStore> {
    let store = MemoryStore::new();
    store.ensure_collection(8).await.unwrap();
    store
        .upsert(&[
            point(
                "emergency-c0003",
                Some("Fuses"),
                "Replace a blown fuse with one of the same rating.",
                &[0.10, 0.9950, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            ),
            point(
                "emergency-c0004",
                Some("Jump Starting"),
                "Jump Starting\nIf the battery is discharged the engine can be started using jumper cables.",
                &[0.60, 0.0, 0.80, 0.0, 0.0, 0.0, 0.0, 0.0],
            ),
            point(
                "emergency-c0005",
                Some("Jump Starting"),
                "1. Turn off ignition\n2. Connect jumper cable to the positive battery terminal\nWARNING: do not let cables touch",
                &[0.95, 0.0, 0.0, 0.3122, 0.0, 0.0, 0.0, 0.0],
            ),
            point(
                "emergency-c0006",
                Some("Jump Starting"),
                "3. Start the engine of the booster vehicle and let it run for a few minutes.",
                &[0.70, 0.0, 0.0, 0.0, 0.7141, 0.0, 0.0, 0.0],
            ),
            point(
                "emergency-c0010",
                Some("Towing"),
                "Attach the tow hook to the mounting hole behind the cover.",
                &[0.20, 0.0, 0.0, 0.0, 0.0, 0.8241, 0.53, 0.0],
            ),
        ])
        .await
        .unwrap();
    Arc::new(store)
}

fn jump_start_embedder() -> Arc<dyn QueryEmbedder> {
    Arc::new(FixtureEmbedder::new(
        &[
            (
                "dead battery jump start",
                &[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            ),
            (
                "how do I tow this",
                &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            ),
        ],
        &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0],
    ))
}

fn retriever(store: Arc<dyn VectorStore>) -> Retriever {
    Retriever::new(store, jump_start_embedder(), RetrievalConfig::default())
}

#[tokio::test]
async fn test_malicious_query_gets_fixed_redirect() {
    // The gate fires before any store access: an uninitialized store
    // must not matter.
    let r = retriever(Arc::new(MemoryStore::new()));
    let ctx = QueryContext::new("how to damage the tyre");

    let answer = r.answer(&ctx).await.unwrap();
    assert!(answer.steps[0].contains("can't help"));
    assert_eq!(answer.warnings.len(), 1);
    assert!(answer.tools.is_empty());
    assert!(answer.sources.is_empty());
}

#[tokio::test]
async fn test_jump_start_answer_structure() {
    let r = retriever(seeded_store().await);
    let ctx = QueryContext::new("dead battery jump start");

    let answer = r.answer(&ctx).await.unwrap();
    assert_eq!(
        answer.steps,
        vec![
            "Turn off ignition",
            "Connect jumper cable to the positive battery terminal"
        ]
    );
    assert_eq!(answer.warnings, vec!["WARNING: do not let cables touch"]);
    assert!(answer.tools.contains(&"jumper cable".to_string()));
    assert!(answer.disclaimer.contains("emergency services"));
}

#[tokio::test]
async fn test_expansion_pulls_in_neighbors_in_order() {
    let r = retriever(seeded_store().await);
    let ctx = QueryContext::new("dead battery jump start");

    let outcome = r.retrieve(&ctx).await.unwrap();
    let chunks = match outcome {
        Outcome::Chunks(c) => c,
        other => panic!("expected chunks, got {:?}", other),
    };

    // Passing hits c0004-c0006 (scenario-biased to Jump Starting),
    // expanded by one neighbor on each side; c0007 does not exist.
    let ids: Vec<&str> = chunks.iter().map(|c| c.chunk_id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "emergency-c0003",
            "emergency-c0004",
            "emergency-c0005",
            "emergency-c0006"
        ]
    );

    // Neighbors carry no similarity of their own.
    assert_eq!(chunks[0].score, 0.0);
    assert!(chunks[2].score > 0.9);
}

#[tokio::test]
async fn test_citations_match_final_chunk_set() {
    let r = retriever(seeded_store().await);
    let ctx = QueryContext::new("dead battery jump start");

    let answer = r.answer(&ctx).await.unwrap();
    assert_eq!(answer.sources.len(), 4);
    assert!(answer.sources.iter().all(|s| s.page == 401));
    // The towing chunk never passed ranking and must not be cited.
    assert!(answer
        .sources
        .iter()
        .all(|s| s.chunk_id != "emergency-c0010"));
}

#[tokio::test]
async fn test_below_threshold_query_is_empty() {
    let r = retriever(seeded_store().await);
    // Best similarity for this vector is 0.53 (towing chunk), below
    // the 0.58 threshold; scenario bias must not rescue it.
    let ctx = QueryContext::new("how do I tow this");

    let outcome = r.retrieve(&ctx).await.unwrap();
    assert!(matches!(outcome, Outcome::Empty));
}

#[tokio::test]
async fn test_uninitialized_collection_degrades_to_empty() {
    let r = retriever(Arc::new(MemoryStore::new()));
    let ctx = QueryContext::new("dead battery jump start");

    let outcome = r.retrieve(&ctx).await.unwrap();
    assert!(matches!(outcome, Outcome::Empty));

    let answer = r.answer(&ctx).await.unwrap();
    assert!(answer.steps.is_empty());
    assert!(answer.sources.is_empty());
    assert!(!answer.disclaimer.contains("emergency services"));
}

#[tokio::test]
async fn test_intent_promotes_matching_scenario_chunks() {
    let store = MemoryStore::new();
    store.ensure_collection(2).await.unwrap();
    store
        .upsert(&[
            point(
                "emergency-c0001",
                Some("Towing"),
                "Towing procedure for automatic transmission vehicles, front wheels raised.",
                &[0.90, 0.4359],
            ),
            point(
                "emergency-c0008",
                Some("Pre drive checks"),
                "Check tyre condition and pressure, all lamps, and fluid levels before driving.",
                &[0.30, 0.9539],
            ),
        ])
        .await
        .unwrap();

    let embedder = Arc::new(FixtureEmbedder::new(
        &[("vehicle checks", &[1.0, 0.0])],
        &[0.0, 1.0],
    ));
    let r = Retriever::new(Arc::new(store), embedder, RetrievalConfig::default());

    let ctx = QueryContext {
        query: "vehicle checks".to_string(),
        top_k: None,
        intent: Some("pre_drive".to_string()),
    };

    let chunks = match r.retrieve(&ctx).await.unwrap() {
        Outcome::Chunks(c) => c,
        other => panic!("expected chunks, got {:?}", other),
    };

    // c0008 is below threshold but rescued by the intent override and
    // promoted to the front by the order restorer.
    assert_eq!(chunks[0].chunk_id, "emergency-c0008");
    assert!(chunks.iter().any(|c| c.chunk_id == "emergency-c0001"));
}
