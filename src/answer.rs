//! Answer synthesizer.
//!
//! Turns the ordered retrieved-chunk list into the structured
//! [`Answer`]: pick the best passage for the query, narrow it to
//! query-relevant blocks, extract numbered steps and warning lines,
//! scan all passages for tool mentions, and attach one citation per
//! retrieved chunk. Nothing here generates text — every emitted string
//! comes from the source corpus or a fixed template.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::{Answer, RetrievedChunk, SourceCitation};

/// Conservative, manual-faithful tool keyword list. Static on purpose:
/// tools must be grounded in the source text, never inferred.
const TOOL_KEYWORDS: &[&str] = &[
    "jack",
    "wheel spanner",
    "spanner",
    "tow hook",
    "towing",
    "jumper cable",
    "jumper cables",
    "battery cable",
    "warning triangle",
];

/// Maximum warnings surfaced in one answer.
const MAX_WARNINGS: usize = 10;

/// Maximum steps produced by the sentence-splitting fallback.
const SENTENCE_FALLBACK_CAP: usize = 8;

/// Leading numeric step marker: digits, then `.`, `)`, `:` or `-`,
/// then whitespace, then the step content.
static STEP_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+[.):-]\s+(.*)$").expect("step marker regex"));

static BLANK_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("blank line regex"));

const DISCLAIMER: &str = "Information is retrieved from the owner's manual excerpts. \
     Always prioritize safety and your local regulations. \
     If you are in danger, contact emergency services or roadside assistance.";

/// Variant used when nothing was retrieved: no emergency-services
/// reminder, since there is no retrieved content to ground it.
const DISCLAIMER_EMPTY: &str = "Information is retrieved from the owner's manual excerpts. \
     Always prioritize safety and your local regulations.";

/// Build the final answer from the ordered retrieved chunks.
///
/// An empty chunk list yields the well-defined empty answer with the
/// short disclaimer variant. Otherwise steps and warnings come from
/// the best-matching passage (filtered to query-relevant blocks),
/// tools from all passages, and every chunk becomes a citation.
pub fn build_answer(query: &str, chunks: &[RetrievedChunk]) -> Answer {
    if chunks.is_empty() {
        return Answer {
            query: query.to_string(),
            steps: Vec::new(),
            warnings: Vec::new(),
            tools: Vec::new(),
            sources: Vec::new(),
            disclaimer: DISCLAIMER_EMPTY.to_string(),
        };
    }

    let best = best_passage(query, chunks);
    let focused = filter_relevant_blocks(&best.text, query);

    let mut steps = extract_numbered_steps(&focused);
    if steps.is_empty() {
        steps = sentence_fallback(&focused);
    }

    let warnings = extract_warning_lines(&focused);
    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    let tools = extract_tools(&texts);

    let sources = chunks
        .iter()
        .map(|c| SourceCitation {
            id: c.id.clone(),
            page: c.page.unwrap_or(-1),
            chunk_id: c.chunk_id.clone(),
            text: c.text.clone(),
            score: c.score,
        })
        .collect();

    Answer {
        query: query.to_string(),
        steps,
        warnings,
        tools,
        sources,
        disclaimer: DISCLAIMER.to_string(),
    }
}

/// Score each passage as `similarity + 1.5 if the whole lowercased
/// query appears verbatim + 0.2 per query term present`, and return
/// the maximum. Ties resolve to the first maximum in input order.
pub fn best_passage<'a>(query: &str, chunks: &'a [RetrievedChunk]) -> &'a RetrievedChunk {
    let q = query.to_lowercase();
    let terms: Vec<&str> = q.split_whitespace().collect();

    let score_of = |c: &RetrievedChunk| -> f64 {
        let text = c.text.to_lowercase();
        let mut score = c.score;
        if !q.is_empty() && text.contains(&q) {
            score += 1.5;
        }
        for term in &terms {
            if text.contains(term) {
                score += 0.2;
            }
        }
        score
    };

    let mut best = &chunks[0];
    let mut best_score = score_of(best);
    for c in &chunks[1..] {
        let s = score_of(c);
        if s > best_score {
            best = c;
            best_score = s;
        }
    }
    best
}

/// Keep only blank-line-delimited blocks containing at least one query
/// term longer than 2 characters. If filtering would discard every
/// block, the unfiltered text is returned instead — the answer must
/// never lose all usable content to its own filter.
pub fn filter_relevant_blocks(text: &str, query: &str) -> String {
    let q = query.to_lowercase();
    let terms: Vec<&str> = q.split_whitespace().filter(|t| t.len() > 2).collect();

    let relevant: Vec<String> = BLANK_LINE
        .split(text)
        .filter_map(|block| {
            let lower = block.to_lowercase();
            if terms.iter().any(|t| lower.contains(t)) {
                Some(block.trim().to_string())
            } else {
                None
            }
        })
        .collect();

    if relevant.is_empty() {
        text.to_string()
    } else {
        relevant.join("\n\n")
    }
}

/// Lines with a leading numeric marker, marker stripped.
pub fn extract_numbered_steps(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|ln| {
            STEP_MARKER
                .captures(ln.trim())
                .map(|caps| caps[1].to_string())
        })
        .collect()
}

/// Split unstructured prose into sentences and take the first few as
/// steps, so a passage without numbered lines still yields actionable
/// output.
fn sentence_fallback(text: &str) -> Vec<String> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(SENTENCE_FALLBACK_CAP)
        .map(str::to_string)
        .collect()
}

/// Lines whose stripped, uppercased form starts with WARNING, CAUTION,
/// or NOTICE. Deduplicated preserving first-seen order, capped.
pub fn extract_warning_lines(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();

    for ln in text.lines() {
        let stripped = ln.trim();
        let upper = stripped.to_uppercase();
        if upper.starts_with("WARNING") || upper.starts_with("CAUTION") || upper.starts_with("NOTICE")
        {
            if !out.iter().any(|w| w == stripped) {
                out.push(stripped.to_string());
            }
        }
    }

    out.truncate(MAX_WARNINGS);
    out
}

/// Case-insensitive scan of all retrieved passages for the fixed tool
/// keywords, deduplicated preserving first-seen order.
pub fn extract_tools(texts: &[&str]) -> Vec<String> {
    let haystack = texts.join(" ").to_lowercase();

    TOOL_KEYWORDS
        .iter()
        .filter(|kw| haystack.contains(*kw))
        .map(|kw| kw.to_string())
        .collect()
}
