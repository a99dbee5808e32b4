//! # Mayday
//!
//! A vehicle-manual emergency assistant. Natural-language questions
//! ("dead battery jump start") are answered by retrieving passages
//! from an ingested owner's-manual corpus and synthesizing a
//! structured, safety-gated answer: ordered steps, warnings, required
//! tools, and cited sources. No free text is ever generated — every
//! emitted string comes from the corpus or a fixed template.
//!
//! ## Architecture
//!
//! ```text
//! query ──▶ safety gate ──▶ embed ──▶ vector search ──▶ rank
//!              │                                          │
//!              ▼ (malicious)                               ▼
//!         fixed redirect            expand ──▶ fetch ──▶ order ──▶ synthesize
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`store`] | Vector store trait + in-memory backend |
//! | [`qdrant`] | Qdrant REST gateway |
//! | [`embedding`] | Embedding backends and dispatch |
//! | [`intent`] | Intent safety gate |
//! | [`rank`] | Relevance ranking and scenario biasing |
//! | [`expand`] | Neighbor-context expansion |
//! | [`order`] | Presentation-order restoration |
//! | [`answer`] | Structured answer synthesis |
//! | [`retriever`] | End-to-end query pipeline |
//! | [`chunk`] | Structural chunking for ingestion |
//! | [`ingest`] | Manual-text ingestion |
//! | [`server`] | HTTP API server |

pub mod answer;
pub mod chunk;
pub mod config;
pub mod embedding;
pub mod expand;
pub mod ingest;
pub mod intent;
pub mod models;
pub mod order;
pub mod qdrant;
pub mod rank;
pub mod retriever;
pub mod server;
pub mod store;
