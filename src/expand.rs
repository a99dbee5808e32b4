//! Context expander.
//!
//! Emergency procedures span adjacent chunks: a heading chunk is often
//! followed by the numbered steps in the next one. Expansion turns the
//! passing hit set into the full set of chunk ids to fetch, adding a
//! fixed window of positional neighbors around each hit so a procedure
//! is not cut off at a chunk boundary.
//!
//! Chunk ids look like `<prefix>-c<NNNN>`. The prefix may itself
//! contain `-c`, so parsing splits on the LAST `-c` followed by
//! digits. Malformed ids are skipped silently; they never abort the
//! batch.

use std::collections::BTreeSet;

use crate::models::CandidateHit;

/// A parsed chunk identifier: prefix, sequence number, and the
/// zero-padding width needed to reconstruct neighbor ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkId<'a> {
    pub prefix: &'a str,
    pub seq: u64,
    pub width: usize,
}

impl<'a> ChunkId<'a> {
    /// Parse `<prefix>-c<NNNN>`, splitting on the last `-c<digits>`
    /// suffix. Returns `None` for anything that does not end in such a
    /// suffix.
    pub fn parse(id: &'a str) -> Option<Self> {
        let pos = id.rfind("-c")?;
        let digits = &id[pos + 2..];
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let seq = digits.parse().ok()?;
        Some(Self {
            prefix: &id[..pos],
            seq,
            width: digits.len(),
        })
    }

    /// Reconstruct the id for `seq + delta`, preserving the padding
    /// width. Returns `None` when the neighbor would have a negative
    /// sequence number.
    pub fn neighbor(&self, delta: i64) -> Option<String> {
        let seq = (self.seq as i64).checked_add(delta)?;
        if seq < 0 {
            return None;
        }
        Some(format!(
            "{}-c{:0width$}",
            self.prefix,
            seq,
            width = self.width
        ))
    }
}

/// Compute the set of chunk ids to fetch for the passing hits: each
/// hit's own id plus ids within `±window` by sequence number.
///
/// Pure set construction; iteration order of the input does not affect
/// the result. No upper-bound check is made — an unfetchable id simply
/// yields no hit later.
pub fn expand_context(hits: &[CandidateHit], window: u32) -> BTreeSet<String> {
    expand_ids(hits.iter().map(|h| h.payload.chunk_id.as_str()), window)
}

/// Expansion over bare chunk-id strings.
pub fn expand_ids<'a>(ids: impl IntoIterator<Item = &'a str>, window: u32) -> BTreeSet<String> {
    let mut out = BTreeSet::new();

    for id in ids {
        let Some(parsed) = ChunkId::parse(id) else {
            continue;
        };
        for delta in -(window as i64)..=(window as i64) {
            if let Some(neighbor) = parsed.neighbor(delta) {
                out.insert(neighbor);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_id() {
        let id = ChunkId::parse("emergency-c0007").unwrap();
        assert_eq!(id.prefix, "emergency");
        assert_eq!(id.seq, 7);
        assert_eq!(id.width, 4);
    }

    #[test]
    fn test_parse_prefix_containing_dash_c() {
        let id = ChunkId::parse("manualA-section2-c0012").unwrap();
        assert_eq!(id.prefix, "manualA-section2");
        assert_eq!(id.seq, 12);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(ChunkId::parse("no-suffix").is_none());
        assert!(ChunkId::parse("emergency-c").is_none());
        assert!(ChunkId::parse("emergency-c12x").is_none());
        assert!(ChunkId::parse("").is_none());
    }

    #[test]
    fn test_neighbor_preserves_padding() {
        let id = ChunkId::parse("emergency-c0007").unwrap();
        assert_eq!(id.neighbor(1).unwrap(), "emergency-c0008");
        assert_eq!(id.neighbor(-1).unwrap(), "emergency-c0006");
    }

    #[test]
    fn test_negative_neighbor_dropped() {
        let id = ChunkId::parse("emergency-c0000").unwrap();
        assert!(id.neighbor(-1).is_none());
        assert_eq!(id.neighbor(0).unwrap(), "emergency-c0000");
    }

    #[test]
    fn test_overlapping_windows_dedup() {
        let ids = expand_ids(["emergency-c0005", "emergency-c0006"], 1);
        let expected: BTreeSet<String> = [
            "emergency-c0004",
            "emergency-c0005",
            "emergency-c0006",
            "emergency-c0007",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_malformed_ids_skipped_silently() {
        let ids = expand_ids(["bogus", "emergency-c0002"], 1);
        assert_eq!(ids.len(), 3);
        assert!(ids.contains("emergency-c0001"));
    }

    #[test]
    fn test_expansion_idempotent_up_to_window() {
        let first = expand_ids(["emergency-c0005"], 1);
        let refs: Vec<&str> = first.iter().map(String::as_str).collect();
        let second = expand_ids(refs.clone(), 1);
        // Re-expansion only grows by the window on each edge.
        assert!(second.is_superset(&first));
        let third_refs: Vec<&str> = second.iter().map(String::as_str).collect();
        let third = expand_ids(third_refs, 0);
        assert_eq!(third, second);
    }

    #[test]
    fn test_zero_window_is_identity_set() {
        let ids = expand_ids(["a-c0003", "a-c0001"], 0);
        assert_eq!(ids.len(), 2);
    }
}
