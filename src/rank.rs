//! Relevance ranker.
//!
//! Converts the broad similarity-search result set into a thresholded,
//! scenario-biased candidate set:
//!
//! 1. Keep hits at or above the similarity threshold, plus any hit
//!    whose scenario label matches the supplied intent tag (override).
//! 2. If nothing passes, return empty — the pipeline short-circuits to
//!    an empty answer rather than falling back to unranked hits.
//! 3. When the query names a known procedure and at least one passing
//!    hit mentions it, narrow the passing set to those hits. This
//!    resolves queries whose vocabulary straddles several procedures.
//!
//! The input order (original retrieval order, best first) is preserved
//! throughout, so ties stay stable.

use crate::config::RetrievalConfig;
use crate::models::CandidateHit;

/// Query vocabulary and passage markers for procedures that share
/// terms with unrelated sections of the manual. A query term match
/// alone is not enough to narrow; a passing hit must also mention the
/// procedure.
const PROCEDURE_VOCAB: &[(&str, &[&str], &[&str])] = &[
    (
        "jump starting",
        &["battery", "jump", "jumper"],
        &["jump start", "jump-start", "jumper", "battery"],
    ),
    (
        "flat tyre",
        &["tyre", "tire", "puncture", "flat"],
        &["tyre", "tire", "wheel", "spare"],
    ),
    ("towing", &["tow", "towing", "towed"], &["tow", "towing"]),
    (
        "overheating",
        &["overheat", "overheating", "coolant"],
        &["overheat", "coolant", "temperature"],
    ),
];

/// Effective similarity-search limit for the broad query.
///
/// At least the configured fan-out regardless of the requested result
/// count; doubled when evaluating against an intent so the override
/// has candidates to rescue.
pub fn search_limit(cfg: &RetrievalConfig, top_k: usize, has_intent: bool) -> usize {
    let base = top_k.max(cfg.base_fan_out);
    if has_intent {
        base * 2
    } else {
        base
    }
}

/// Does a chunk's scenario label match a caller-supplied intent tag?
///
/// Both sides are lowercased and intent underscores become spaces, so
/// `"pre_drive"` matches a scenario heading of `"Pre-Drive Checks"`
/// only via the space form; matching is a substring test on the
/// scenario.
pub fn scenario_matches_intent(scenario: Option<&str>, intent: &str) -> bool {
    let needle = intent.to_lowercase().replace('_', " ");
    if needle.trim().is_empty() {
        return false;
    }
    scenario
        .map(|s| s.to_lowercase().contains(&needle))
        .unwrap_or(false)
}

/// Reduce raw candidates to the passing set.
///
/// Returns hits in their original order. An empty return means the
/// caller must short-circuit; it must never substitute unranked hits.
pub fn rank_hits(
    hits: Vec<CandidateHit>,
    cfg: &RetrievalConfig,
    query: &str,
    intent: Option<&str>,
) -> Vec<CandidateHit> {
    let passing: Vec<CandidateHit> = hits
        .into_iter()
        .filter(|h| {
            h.score >= cfg.score_threshold
                || intent
                    .map(|tag| scenario_matches_intent(h.payload.scenario.as_deref(), tag))
                    .unwrap_or(false)
        })
        .collect();

    if passing.is_empty() {
        return passing;
    }

    apply_scenario_bias(passing, query)
}

/// Narrow the passing set to one procedure when the query names it and
/// at least one passing hit mentions it. The first procedure whose
/// query vocabulary matches wins; with no hit-side evidence the set is
/// left untouched.
fn apply_scenario_bias(passing: Vec<CandidateHit>, query: &str) -> Vec<CandidateHit> {
    let q = query.to_lowercase();

    for (_procedure, query_terms, markers) in PROCEDURE_VOCAB {
        if !query_terms.iter().any(|t| q.contains(t)) {
            continue;
        }

        let matching: Vec<&CandidateHit> = passing
            .iter()
            .filter(|h| hit_mentions(h, markers))
            .collect();

        if !matching.is_empty() {
            return matching.into_iter().cloned().collect();
        }
        // Query names this procedure but no hit carries it: keep the
        // full passing set and stop probing other procedures.
        return passing;
    }

    passing
}

fn hit_mentions(hit: &CandidateHit, markers: &[&str]) -> bool {
    let scenario = hit
        .payload
        .scenario
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();
    let text = hit.payload.text.to_lowercase();
    markers
        .iter()
        .any(|m| scenario.contains(m) || text.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChunkPayload;

    fn hit(chunk_id: &str, score: f64, scenario: Option<&str>, text: &str) -> CandidateHit {
        CandidateHit {
            id: format!("pt-{}", chunk_id),
            payload: ChunkPayload {
                chunk_id: chunk_id.to_string(),
                text: text.to_string(),
                scenario: scenario.map(str::to_string),
                ..Default::default()
            },
            score,
        }
    }

    fn cfg() -> RetrievalConfig {
        RetrievalConfig::default()
    }

    #[test]
    fn test_search_limit_uses_fan_out_floor() {
        assert_eq!(search_limit(&cfg(), 4, false), 12);
        assert_eq!(search_limit(&cfg(), 20, false), 20);
        assert_eq!(search_limit(&cfg(), 4, true), 24);
    }

    #[test]
    fn test_below_threshold_hits_are_dropped() {
        let hits = vec![
            hit("m-c0001", 0.80, None, "relevant passage"),
            hit("m-c0002", 0.30, None, "noise"),
        ];
        let passing = rank_hits(hits, &cfg(), "some query", None);
        assert_eq!(passing.len(), 1);
        assert_eq!(passing[0].payload.chunk_id, "m-c0001");
    }

    #[test]
    fn test_empty_passing_set_stays_empty() {
        let hits = vec![hit("m-c0001", 0.10, None, "noise")];
        let passing = rank_hits(hits, &cfg(), "query", None);
        assert!(passing.is_empty());
    }

    #[test]
    fn test_intent_override_rescues_below_threshold() {
        let hits = vec![hit(
            "m-c0003",
            0.20,
            Some("Pre drive safety checks"),
            "inspect lights",
        )];
        let passing = rank_hits(hits, &cfg(), "checks", Some("pre_drive"));
        assert_eq!(passing.len(), 1);
    }

    #[test]
    fn test_intent_override_requires_scenario_match() {
        let hits = vec![hit("m-c0003", 0.20, Some("Towing"), "tow hook")];
        let passing = rank_hits(hits, &cfg(), "checks", Some("pre_drive"));
        assert!(passing.is_empty());
    }

    #[test]
    fn test_scenario_bias_narrows_to_procedure() {
        let hits = vec![
            hit("m-c0001", 0.70, Some("Jump Starting"), "connect jumper cable"),
            hit("m-c0002", 0.69, Some("Fuses"), "replace the blown fuse"),
        ];
        let passing = rank_hits(hits, &cfg(), "dead battery jump start", None);
        assert_eq!(passing.len(), 1);
        assert_eq!(passing[0].payload.chunk_id, "m-c0001");
    }

    #[test]
    fn test_scenario_bias_without_evidence_keeps_all() {
        let hits = vec![
            hit("m-c0001", 0.70, Some("Fuses"), "replace the blown fuse"),
            hit("m-c0002", 0.69, Some("Bulbs"), "replace the bulb"),
        ];
        let passing = rank_hits(hits, &cfg(), "dead battery jump start", None);
        assert_eq!(passing.len(), 2);
    }

    #[test]
    fn test_order_is_preserved() {
        let hits = vec![
            hit("m-c0005", 0.70, None, "first"),
            hit("m-c0001", 0.70, None, "second"),
            hit("m-c0003", 0.65, None, "third"),
        ];
        let passing = rank_hits(hits, &cfg(), "plain query", None);
        let ids: Vec<&str> = passing
            .iter()
            .map(|h| h.payload.chunk_id.as_str())
            .collect();
        assert_eq!(ids, vec!["m-c0005", "m-c0001", "m-c0003"]);
    }
}
