//! Core data types that flow through the retrieval and answer pipeline.
//!
//! Payloads arriving from the vector store are converted into these
//! typed structures at the boundary; untyped JSON maps never travel
//! further into the pipeline. All per-request types are constructed
//! fresh for each query and discarded once the answer is built.

use serde::{Deserialize, Serialize};

/// Typed payload stored alongside each vector point.
///
/// Produced by ingestion, read-only afterwards. The `chunk_id` follows
/// the `<prefix>-c<NNNN>` scheme (fixed-width zero-padded sequence
/// number) that context expansion depends on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkPayload {
    #[serde(default)]
    pub chunk_id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub scenario: Option<String>,
}

/// A raw hit as returned by a [`VectorStore`](crate::store::VectorStore)
/// backend, before score normalization.
///
/// Depending on which store API produced the hit it carries either a
/// similarity `score` or a `distance`; [`CandidateHit::from_raw`]
/// collapses the two into one canonical value.
#[derive(Debug, Clone)]
pub struct RawHit {
    /// Point id in the store (uuid string).
    pub id: String,
    pub payload: ChunkPayload,
    /// Similarity score, higher is better.
    pub score: Option<f64>,
    /// Distance, lower is better. Converted via `1 − distance`.
    pub distance: Option<f64>,
}

/// A candidate hit with one canonical similarity value, higher is better.
#[derive(Debug, Clone)]
pub struct CandidateHit {
    pub id: String,
    pub payload: ChunkPayload,
    pub score: f64,
}

impl CandidateHit {
    /// Normalize a [`RawHit`] into a candidate with a single similarity.
    ///
    /// Preference order: explicit score, then `1 − distance`, then `1.0`
    /// when the store reported neither (a valid match must not be
    /// silently dropped for lacking a measure).
    pub fn from_raw(raw: RawHit) -> Self {
        let score = raw
            .score
            .or_else(|| raw.distance.map(|d| 1.0 - d))
            .unwrap_or(1.0);
        Self {
            id: raw.id,
            payload: raw.payload,
            score,
        }
    }
}

/// The pipeline's internal representation of a fetched chunk.
///
/// Constructed per request after context expansion; never persisted.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    /// Point id in the store.
    pub id: String,
    /// Stable chunk identifier (`<prefix>-c<NNNN>`).
    pub chunk_id: String,
    pub text: String,
    pub page: Option<i64>,
    pub section: Option<String>,
    pub scenario: Option<String>,
    /// Similarity of the originating hit; `0.0` for neighbors pulled in
    /// by context expansion.
    pub score: f64,
}

impl RetrievedChunk {
    pub fn from_hit(hit: CandidateHit) -> Self {
        Self {
            id: hit.id,
            chunk_id: hit.payload.chunk_id,
            text: hit.payload.text,
            page: hit.payload.page,
            section: hit.payload.section,
            scenario: hit.payload.scenario,
            score: hit.score,
        }
    }
}

/// Inputs for one query, immutable for the duration of the request.
#[derive(Debug, Clone)]
pub struct QueryContext {
    pub query: String,
    /// Requested result count; the configured default applies when absent.
    pub top_k: Option<usize>,
    /// Optional hint biasing ranking and ordering toward a named
    /// procedure category (e.g. `"pre_drive"`).
    pub intent: Option<String>,
}

impl QueryContext {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            top_k: None,
            intent: None,
        }
    }
}

/// A source citation attached to an [`Answer`].
///
/// Citations are never truncated or filtered: every chunk in the final
/// ordered set becomes exactly one citation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceCitation {
    pub id: String,
    /// Page number, or `-1` when the chunk carries none.
    pub page: i64,
    pub chunk_id: String,
    pub text: String,
    pub score: f64,
}

/// The structured answer returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub query: String,
    pub steps: Vec<String>,
    pub warnings: Vec<String>,
    pub tools: Vec<String>,
    pub sources: Vec<SourceCitation>,
    pub disclaimer: String,
}
