//! Vector store abstraction.
//!
//! The [`VectorStore`] trait covers every store operation the query
//! pipeline and ingestion need, enabling pluggable backends (Qdrant
//! over HTTP, in-memory for tests). Implementations must be
//! `Send + Sync` so requests can run concurrently against one shared
//! client.
//!
//! Store failures are typed: callers must be able to distinguish "the
//! collection does not exist yet" (behaves like an empty knowledge
//! base) from "the store is broken" (surfaces as a server error).

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;

use crate::models::{ChunkPayload, RawHit};

/// Typed failure at the vector-store boundary.
///
/// `CollectionMissing` is an expected condition (nothing ingested yet)
/// and is degraded to an empty result set by the pipeline; the other
/// variants are infrastructure faults that propagate to the caller.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("collection '{0}' does not exist")]
    CollectionMissing(String),
    #[error("vector store unreachable: {0}")]
    Unavailable(String),
    #[error("vector store error: {0}")]
    Api(String),
}

/// A point to upsert: id, embedding, and typed payload.
#[derive(Debug, Clone)]
pub struct StorePoint {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: ChunkPayload,
}

/// Abstract vector store backend.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`ensure_collection`](VectorStore::ensure_collection) | Recreate the collection with the given dimensionality |
/// | [`upsert`](VectorStore::upsert) | Store embedded points with payloads |
/// | [`search`](VectorStore::search) | Similarity search, ordered hits with payload and score |
/// | [`fetch_by_chunk_ids`](VectorStore::fetch_by_chunk_ids) | Fetch payloads for a set of chunk ids (paginated internally) |
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Drop and recreate the collection for vectors of `dims` length.
    async fn ensure_collection(&self, dims: usize) -> Result<(), StoreError>;

    /// Insert or overwrite points.
    async fn upsert(&self, points: &[StorePoint]) -> Result<(), StoreError>;

    /// Similarity search returning up to `limit` hits, best first.
    async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<RawHit>, StoreError>;

    /// Fetch every point whose payload `chunk_id` is in `ids`.
    ///
    /// Unordered. Implementations paginate internally until the id set
    /// is exhausted; unknown ids simply yield no hit.
    async fn fetch_by_chunk_ids(&self, ids: &[String]) -> Result<Vec<RawHit>, StoreError>;
}

fn cosine_sim(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a < f32::EPSILON || mag_b < f32::EPSILON {
        0.0
    } else {
        dot / (mag_a * mag_b)
    }
}

struct StoredPoint {
    vector: Vec<f32>,
    payload: ChunkPayload,
}

/// In-memory [`VectorStore`] for tests.
///
/// Brute-force cosine similarity over all stored vectors. Mirrors the
/// "collection missing until created" behavior of a real store so the
/// pipeline's degrade path is testable.
pub struct MemoryStore {
    points: RwLock<Option<HashMap<String, StoredPoint>>>,
}

impl MemoryStore {
    /// An empty store with no collection yet.
    pub fn new() -> Self {
        Self {
            points: RwLock::new(None),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn ensure_collection(&self, _dims: usize) -> Result<(), StoreError> {
        let mut guard = self.points.write().unwrap();
        *guard = Some(HashMap::new());
        Ok(())
    }

    async fn upsert(&self, points: &[StorePoint]) -> Result<(), StoreError> {
        let mut guard = self.points.write().unwrap();
        let map = guard
            .as_mut()
            .ok_or_else(|| StoreError::CollectionMissing("memory".to_string()))?;
        for p in points {
            map.insert(
                p.id.clone(),
                StoredPoint {
                    vector: p.vector.clone(),
                    payload: p.payload.clone(),
                },
            );
        }
        Ok(())
    }

    async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<RawHit>, StoreError> {
        let guard = self.points.read().unwrap();
        let map = guard
            .as_ref()
            .ok_or_else(|| StoreError::CollectionMissing("memory".to_string()))?;

        let mut hits: Vec<RawHit> = map
            .iter()
            .map(|(id, p)| RawHit {
                id: id.clone(),
                payload: p.payload.clone(),
                score: Some(cosine_sim(vector, &p.vector) as f64),
                distance: None,
            })
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(limit);
        Ok(hits)
    }

    async fn fetch_by_chunk_ids(&self, ids: &[String]) -> Result<Vec<RawHit>, StoreError> {
        let guard = self.points.read().unwrap();
        let map = guard
            .as_ref()
            .ok_or_else(|| StoreError::CollectionMissing("memory".to_string()))?;

        let hits = map
            .iter()
            .filter(|(_, p)| ids.iter().any(|id| *id == p.payload.chunk_id))
            .map(|(id, p)| RawHit {
                id: id.clone(),
                payload: p.payload.clone(),
                score: None,
                distance: None,
            })
            .collect();
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(chunk_id: &str, text: &str) -> ChunkPayload {
        ChunkPayload {
            chunk_id: chunk_id.to_string(),
            text: text.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_search_before_create_is_collection_missing() {
        let store = MemoryStore::new();
        let err = store.search(&[1.0, 0.0], 4).await.unwrap_err();
        assert!(matches!(err, StoreError::CollectionMissing(_)));
    }

    #[tokio::test]
    async fn test_search_orders_by_similarity() {
        let store = MemoryStore::new();
        store.ensure_collection(2).await.unwrap();
        store
            .upsert(&[
                StorePoint {
                    id: "a".into(),
                    vector: vec![1.0, 0.0],
                    payload: payload("m-c0000", "aligned"),
                },
                StorePoint {
                    id: "b".into(),
                    vector: vec![0.0, 1.0],
                    payload: payload("m-c0001", "orthogonal"),
                },
            ])
            .await
            .unwrap();

        let hits = store.search(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].payload.chunk_id, "m-c0000");
        assert!(hits[0].score.unwrap() > hits[1].score.unwrap());
    }

    #[tokio::test]
    async fn test_fetch_by_chunk_ids_ignores_unknown() {
        let store = MemoryStore::new();
        store.ensure_collection(2).await.unwrap();
        store
            .upsert(&[StorePoint {
                id: "a".into(),
                vector: vec![1.0, 0.0],
                payload: payload("m-c0000", "text"),
            }])
            .await
            .unwrap();

        let hits = store
            .fetch_by_chunk_ids(&["m-c0000".to_string(), "m-c9999".to_string()])
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].payload.chunk_id, "m-c0000");
    }
}
