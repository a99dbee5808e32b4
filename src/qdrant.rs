//! Qdrant REST gateway.
//!
//! Implements [`VectorStore`] against the Qdrant HTTP API using the
//! canonical 1.x endpoints: `points/query` for similarity search and
//! `points/scroll` (with a payload filter) for id-based fetches.
//! Scrolling paginates via `next_page_offset` until the store reports
//! no further page, so id fetches are bounded by the corpus size
//! rather than an unbounded stream.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::config::QdrantConfig;
use crate::models::{ChunkPayload, RawHit};
use crate::store::{StoreError, StorePoint, VectorStore};

/// Page size for `points/scroll` requests.
const SCROLL_PAGE_SIZE: usize = 64;

/// Qdrant-backed [`VectorStore`] over plain HTTP.
pub struct QdrantStore {
    client: reqwest::Client,
    base_url: String,
    collection: String,
    api_key: Option<String>,
}

impl QdrantStore {
    pub fn new(config: &QdrantConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        if let Some(key) = &self.api_key {
            req = req.header("api-key", key);
        }
        req
    }

    async fn send(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<serde_json::Value, StoreError> {
        let resp = req
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::CollectionMissing(self.collection.clone()));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Api(format!("{}: {}", status, body)));
        }

        resp.json()
            .await
            .map_err(|e| StoreError::Api(format!("invalid response body: {}", e)))
    }
}

#[derive(Debug, Deserialize)]
struct ScoredPointDto {
    id: serde_json::Value,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    payload: Option<ChunkPayload>,
}

impl ScoredPointDto {
    fn into_raw_hit(self) -> RawHit {
        // Point ids may be uuid strings or integers depending on how
        // the collection was populated.
        let id = match &self.id {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        RawHit {
            id,
            payload: self.payload.unwrap_or_default(),
            score: self.score,
            distance: None,
        }
    }
}

fn parse_points(result: &serde_json::Value, key: &str) -> Result<Vec<RawHit>, StoreError> {
    let points = result
        .get("result")
        .and_then(|r| r.get(key))
        .cloned()
        .unwrap_or(serde_json::Value::Array(Vec::new()));

    let dtos: Vec<ScoredPointDto> = serde_json::from_value(points)
        .map_err(|e| StoreError::Api(format!("malformed points payload: {}", e)))?;

    Ok(dtos.into_iter().map(ScoredPointDto::into_raw_hit).collect())
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn ensure_collection(&self, dims: usize) -> Result<(), StoreError> {
        // Recreate from scratch; a stale collection with a different
        // dimensionality would reject the new vectors.
        let delete = self
            .request(
                reqwest::Method::DELETE,
                &format!("/collections/{}", self.collection),
            )
            .send()
            .await;
        if let Err(e) = delete {
            return Err(StoreError::Unavailable(e.to_string()));
        }

        let body = json!({
            "vectors": { "size": dims, "distance": "Cosine" }
        });
        self.send(
            self.request(
                reqwest::Method::PUT,
                &format!("/collections/{}", self.collection),
            )
            .json(&body),
        )
        .await?;
        Ok(())
    }

    async fn upsert(&self, points: &[StorePoint]) -> Result<(), StoreError> {
        let dtos: Vec<serde_json::Value> = points
            .iter()
            .map(|p| {
                json!({
                    "id": p.id,
                    "vector": p.vector,
                    "payload": p.payload,
                })
            })
            .collect();

        self.send(
            self.request(
                reqwest::Method::PUT,
                &format!("/collections/{}/points?wait=true", self.collection),
            )
            .json(&json!({ "points": dtos })),
        )
        .await?;
        Ok(())
    }

    async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<RawHit>, StoreError> {
        let body = json!({
            "query": vector,
            "limit": limit,
            "with_payload": true,
        });

        let result = self
            .send(
                self.request(
                    reqwest::Method::POST,
                    &format!("/collections/{}/points/query", self.collection),
                )
                .json(&body),
            )
            .await?;

        parse_points(&result, "points")
    }

    async fn fetch_by_chunk_ids(&self, ids: &[String]) -> Result<Vec<RawHit>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut hits = Vec::new();
        let mut offset: Option<serde_json::Value> = None;

        loop {
            let mut body = json!({
                "filter": {
                    "must": [
                        { "key": "chunk_id", "match": { "any": ids } }
                    ]
                },
                "limit": SCROLL_PAGE_SIZE,
                "with_payload": true,
            });
            if let Some(off) = &offset {
                body["offset"] = off.clone();
            }

            let result = self
                .send(
                    self.request(
                        reqwest::Method::POST,
                        &format!("/collections/{}/points/scroll", self.collection),
                    )
                    .json(&body),
                )
                .await?;

            hits.extend(parse_points(&result, "points")?);

            let next = result
                .get("result")
                .and_then(|r| r.get("next_page_offset"))
                .cloned();
            match next {
                Some(serde_json::Value::Null) | None => break,
                Some(off) => offset = Some(off),
            }
        }

        Ok(hits)
    }
}
