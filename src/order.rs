//! Order restorer.
//!
//! Expanded fetches come back unordered; this module produces the
//! deterministic presentation sequence. The default key is the chunk
//! id string itself, which is order-preserving because sequence
//! numbers are zero-padded to a uniform width per prefix. With an
//! intent tag, chunks whose scenario matches the intent are promoted
//! to the front, ordered by chunk id within each group.

use crate::models::RetrievedChunk;
use crate::rank::scenario_matches_intent;

/// Sort the expanded chunk set into presentation order.
///
/// Total and deterministic: repeated calls on the same input produce
/// the same sequence.
pub fn restore_order(mut chunks: Vec<RetrievedChunk>, intent: Option<&str>) -> Vec<RetrievedChunk> {
    match intent {
        Some(tag) => {
            chunks.sort_by(|a, b| {
                let a_miss = !scenario_matches_intent(a.scenario.as_deref(), tag);
                let b_miss = !scenario_matches_intent(b.scenario.as_deref(), tag);
                a_miss
                    .cmp(&b_miss)
                    .then_with(|| a.chunk_id.cmp(&b.chunk_id))
            });
        }
        None => chunks.sort_by(|a, b| a.chunk_id.cmp(&b.chunk_id)),
    }
    chunks
}
