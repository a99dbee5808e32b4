//! Intent safety gate.
//!
//! Classifies a query as benign assistance or a request for harmful
//! instructions before any retrieval-derived content is surfaced.
//! The rule is a fixed vocabulary intersection: a harmful verb AND a
//! vehicle target must both be present. The gate is a pure function
//! and never fails; anything it does not recognize falls through to
//! [`Intent::Assistance`].

use crate::models::Answer;

/// Result of the safety gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Assistance,
    Malicious,
}

const HARMFUL_VERBS: &[&str] = &[
    "cause", "damage", "break", "puncture", "sabotage", "destroy",
];

const VEHICLE_TARGETS: &[&str] = &["tyre", "tire", "engine", "battery", "vehicle", "car"];

/// Classify a raw query string.
///
/// Matching is a case-insensitive substring check against both fixed
/// vocabularies; `Malicious` requires at least one term from each.
pub fn classify_intent(query: &str) -> Intent {
    let q = query.to_lowercase();

    let harmful = HARMFUL_VERBS.iter().any(|v| q.contains(v));
    let targeted = VEHICLE_TARGETS.iter().any(|t| q.contains(t));

    if harmful && targeted {
        Intent::Malicious
    } else {
        Intent::Assistance
    }
}

/// The fixed safety-redirect answer returned for malicious queries.
///
/// This is a constant template, never derived from retrieval: static
/// steps for handling an unexpected flat tyre safely, one static
/// warning, no tools, no sources.
pub fn safety_redirect(query: &str) -> Answer {
    Answer {
        query: query.to_string(),
        steps: vec![
            "I can't help with damaging a vehicle.".to_string(),
            "If you are dealing with a flat tyre unexpectedly, follow these safe steps:"
                .to_string(),
            "Reduce speed gradually and avoid sudden braking.".to_string(),
            "Move the vehicle to a safe place away from traffic.".to_string(),
            "Switch on the hazard warning flasher.".to_string(),
            "Inspect the tyre only after the vehicle is safely stopped.".to_string(),
        ],
        warnings: vec![
            "Intentionally damaging a vehicle can be dangerous and illegal.".to_string(),
        ],
        tools: Vec::new(),
        sources: Vec::new(),
        disclaimer: "This assistant provides safety guidance based on vehicle manuals. \
                     It does not support harmful or illegal actions."
            .to_string(),
    }
}
