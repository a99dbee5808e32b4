//! Structural block chunker for manual text.
//!
//! Manuals are structured as a scenario heading followed by numbered
//! steps and warning lines. A new block starts at any non-empty line
//! that is not a numbered step and begins with an uppercase letter;
//! everything until the next such heading belongs to the block. Blocks
//! shorter than a minimum length are dropped as noise (page furniture,
//! stray captions).
//!
//! Works for plain-text and PDF-extracted manuals alike; no scenario
//! names are hardcoded.

use regex::Regex;
use std::sync::LazyLock;

/// Blocks shorter than this are discarded.
const MIN_BLOCK_LEN: usize = 80;

static NUMBERED_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.").expect("numbered line regex"));

/// Split manual text into scenario-sized blocks.
pub fn split_structural_blocks(text: &str) -> Vec<String> {
    let mut blocks: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for raw in text.lines() {
        let line = raw.trim_end();

        // Warning lines are uppercase-initial but belong to the
        // procedure above them, not to a new scenario.
        let upper = line.to_uppercase();
        let is_callout = upper.starts_with("WARNING")
            || upper.starts_with("CAUTION")
            || upper.starts_with("NOTICE");

        let is_heading = !line.is_empty()
            && !is_callout
            && !NUMBERED_LINE.is_match(line)
            && line.chars().next().is_some_and(|c| c.is_uppercase());

        if is_heading && !current.is_empty() {
            blocks.push(current.join("\n").trim().to_string());
            current.clear();
        }

        if !line.is_empty() {
            current.push(line);
        }
    }

    if !current.is_empty() {
        blocks.push(current.join("\n").trim().to_string());
    }

    blocks.retain(|b| b.len() > MIN_BLOCK_LEN);
    blocks
}

/// The first non-numbered line of a block, used as its scenario label.
pub fn extract_heading(block: &str) -> Option<String> {
    block
        .lines()
        .find(|line| !line.is_empty() && !NUMBERED_LINE.is_match(line))
        .map(|line| line.trim().to_string())
}
