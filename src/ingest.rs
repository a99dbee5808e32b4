//! Manual-text ingestion pipeline.
//!
//! Reads a plain-text manual extract, splits it into scenario blocks,
//! embeds them, and upserts everything into the vector store under
//! chunk ids of the form `{prefix}-c{NNNN}` (zero-padded, four
//! digits). The context expander depends on exactly this numbering
//! scheme, so any change here must keep ids parseable by splitting on
//! the last `-c<digits>` suffix.
//!
//! PDF extraction and OCR are out of scope; feed this the extracted
//! text instead.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::chunk::{extract_heading, split_structural_blocks};
use crate::config::EmbeddingConfig;
use crate::embedding::embed_texts;
use crate::models::ChunkPayload;
use crate::store::{StorePoint, VectorStore};

/// Section label stored on every ingested chunk.
const SECTION_NAME: &str = "emergency_situations";

/// Stable point id for a chunk id, so re-ingestion overwrites rather
/// than duplicates.
pub fn deterministic_point_id(chunk_id: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, chunk_id.as_bytes()).to_string()
}

/// Format the chunk id for a block index.
pub fn chunk_id_for(prefix: &str, idx: usize) -> String {
    format!("{}-c{:04}", prefix, idx)
}

/// Ingest a plain-text manual file into the store.
///
/// Recreates the collection, embeds all blocks with the configured
/// provider, and upserts one point per block with its scenario heading
/// as payload.
pub async fn ingest_txt_file(
    store: Arc<dyn VectorStore>,
    embedding: &EmbeddingConfig,
    path: &Path,
    prefix: &str,
) -> Result<usize> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read source file: {}", path.display()))?;

    let raw = raw.replace('\u{00a0}', " ");
    let raw = raw.trim();
    if raw.is_empty() {
        bail!("Source file is empty: {}", path.display());
    }

    let blocks = split_structural_blocks(raw);
    if blocks.is_empty() {
        bail!("No scenario blocks produced from {}", path.display());
    }

    info!(blocks = blocks.len(), "embedding scenario blocks");
    let vectors = embed_texts(embedding, &blocks).await?;
    if vectors.len() != blocks.len() {
        bail!(
            "Embedding count mismatch: {} blocks, {} vectors",
            blocks.len(),
            vectors.len()
        );
    }

    let dims = vectors.first().map(Vec::len).unwrap_or(0);
    if dims == 0 {
        bail!("Embedding provider returned zero-dimensional vectors");
    }

    store.ensure_collection(dims).await?;

    let points: Vec<StorePoint> = blocks
        .iter()
        .zip(vectors)
        .enumerate()
        .map(|(idx, (block, vector))| {
            let chunk_id = chunk_id_for(prefix, idx);
            StorePoint {
                id: deterministic_point_id(&chunk_id),
                vector,
                payload: ChunkPayload {
                    chunk_id,
                    text: block.clone(),
                    page: None,
                    section: Some(SECTION_NAME.to_string()),
                    scenario: extract_heading(block),
                },
            }
        })
        .collect();

    store.upsert(&points).await?;
    info!(points = points.len(), "ingestion complete");
    Ok(points.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expand::ChunkId;

    #[test]
    fn test_chunk_id_zero_padding() {
        assert_eq!(chunk_id_for("emergency", 7), "emergency-c0007");
        assert_eq!(chunk_id_for("emergency", 1234), "emergency-c1234");
    }

    #[test]
    fn test_chunk_ids_parse_back() {
        let id = chunk_id_for("manualA-section2", 12);
        let parsed = ChunkId::parse(&id).unwrap();
        assert_eq!(parsed.prefix, "manualA-section2");
        assert_eq!(parsed.seq, 12);
    }

    #[test]
    fn test_point_id_deterministic() {
        let a = deterministic_point_id("emergency-c0001");
        let b = deterministic_point_id("emergency-c0001");
        let c = deterministic_point_id("emergency-c0002");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
