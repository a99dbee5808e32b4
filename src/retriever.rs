//! End-to-end query pipeline.
//!
//! One request runs synchronously through the chain:
//! gate → embed → broad search → rank → expand → fetch → order →
//! synthesize. Requests share the store client and embedding
//! configuration read-only, so any number may run concurrently.
//!
//! A missing or empty collection is not an error: it degrades to the
//! [`Outcome::Empty`] result so callers see the same behavior as
//! "nothing relevant found". Only genuine infrastructure faults
//! propagate.

use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::answer::build_answer;
use crate::config::RetrievalConfig;
use crate::embedding::QueryEmbedder;
use crate::expand::expand_context;
use crate::intent::{classify_intent, safety_redirect, Intent};
use crate::models::{Answer, CandidateHit, QueryContext, RetrievedChunk};
use crate::order::restore_order;
use crate::rank::{rank_hits, search_limit};
use crate::store::{StoreError, VectorStore};

/// What the retrieval stage produced for a query.
///
/// Distinguishing `Redirect` and `Empty` lets the HTTP layer return
/// 200 for the safety redirect but 404 for "nothing found", while the
/// CLI can render an answer for both.
#[derive(Debug)]
pub enum Outcome {
    /// The safety gate fired; the fixed redirect answer, no retrieval.
    Redirect(Answer),
    /// Retrieval yielded nothing (no passing hits, or no collection).
    Empty,
    /// The ordered chunk set ready for synthesis.
    Chunks(Vec<RetrievedChunk>),
}

/// The query pipeline: a shared vector-store client, a query embedder,
/// and the retrieval tuning.
pub struct Retriever {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn QueryEmbedder>,
    retrieval: RetrievalConfig,
}

impl Retriever {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn QueryEmbedder>,
        retrieval: RetrievalConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            retrieval,
        }
    }

    /// Run retrieval for one query context.
    pub async fn retrieve(&self, ctx: &QueryContext) -> Result<Outcome> {
        if classify_intent(&ctx.query) == Intent::Malicious {
            info!(query = %ctx.query, "safety gate fired, returning redirect");
            return Ok(Outcome::Redirect(safety_redirect(&ctx.query)));
        }

        let top_k = ctx.top_k.unwrap_or(self.retrieval.top_k);
        let intent = ctx.intent.as_deref();
        let limit = search_limit(&self.retrieval, top_k, intent.is_some());

        let vector = self.embedder.embed(&ctx.query).await?;

        let raw = match self.store.search(&vector, limit).await {
            Ok(hits) => hits,
            Err(StoreError::CollectionMissing(name)) => {
                debug!(collection = %name, "collection missing, treating as empty corpus");
                return Ok(Outcome::Empty);
            }
            Err(e) => return Err(e.into()),
        };

        let candidates: Vec<CandidateHit> = raw.into_iter().map(CandidateHit::from_raw).collect();
        let passing = rank_hits(candidates, &self.retrieval, &ctx.query, intent);
        if passing.is_empty() {
            debug!(query = %ctx.query, "no hits passed the relevance threshold");
            return Ok(Outcome::Empty);
        }

        // Score lookup so fetched chunks keep the similarity of the hit
        // that pulled them in; pure neighbors carry 0.0.
        let scores: HashMap<String, f64> = passing
            .iter()
            .map(|h| (h.payload.chunk_id.clone(), h.score))
            .collect();

        let wanted = expand_context(&passing, self.retrieval.context_window);
        let id_list: Vec<String> = wanted.into_iter().collect();

        let fetched = match self.store.fetch_by_chunk_ids(&id_list).await {
            Ok(hits) => hits,
            Err(StoreError::CollectionMissing(_)) => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        let chunks: Vec<RetrievedChunk> = if fetched.is_empty() {
            // Fetch came back empty (store hiccup or ids rotated out);
            // fall back to the passing hits themselves.
            passing.into_iter().map(RetrievedChunk::from_hit).collect()
        } else {
            fetched
                .into_iter()
                .map(|raw| {
                    let mut hit = CandidateHit::from_raw(raw);
                    hit.score = scores.get(&hit.payload.chunk_id).copied().unwrap_or(0.0);
                    RetrievedChunk::from_hit(hit)
                })
                .collect()
        };

        let ordered = restore_order(chunks, intent);
        debug!(count = ordered.len(), "retrieval complete");
        Ok(Outcome::Chunks(ordered))
    }

    /// Retrieve and synthesize in one call. Empty retrieval yields the
    /// well-defined empty answer.
    pub async fn answer(&self, ctx: &QueryContext) -> Result<Answer> {
        match self.retrieve(ctx).await? {
            Outcome::Redirect(answer) => Ok(answer),
            Outcome::Empty => Ok(build_answer(&ctx.query, &[])),
            Outcome::Chunks(chunks) => Ok(build_answer(&ctx.query, &chunks)),
        }
    }
}
