//! # Mayday CLI
//!
//! The `mayday` binary serves the emergency-assistant HTTP API and
//! provides ingestion and one-shot query commands for operating the
//! corpus.
//!
//! ## Usage
//!
//! ```bash
//! mayday --config ./config/mayday.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `mayday ingest <file>` | Chunk, embed, and upsert a manual text extract |
//! | `mayday query "<text>"` | Answer one question and print the JSON answer |
//! | `mayday serve` | Start the HTTP API server |

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use mayday::config::load_config;
use mayday::embedding::ConfigEmbedder;
use mayday::ingest::ingest_txt_file;
use mayday::models::QueryContext;
use mayday::qdrant::QdrantStore;
use mayday::retriever::Retriever;
use mayday::server::run_server;
use mayday::store::VectorStore;

/// Mayday — a vehicle-manual emergency assistant.
///
/// All commands accept a `--config` flag pointing to a TOML
/// configuration file. See `config/mayday.example.toml`.
#[derive(Parser)]
#[command(
    name = "mayday",
    about = "Mayday — retrieval-grounded emergency answers from vehicle manuals",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/mayday.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Ingest a plain-text manual extract into the vector store.
    ///
    /// Splits the text into scenario blocks, embeds them, recreates
    /// the collection, and upserts one point per block.
    Ingest {
        /// Path to the text file to ingest.
        source: PathBuf,

        /// Chunk-id prefix (ids become `<prefix>-c0000`, `<prefix>-c0001`, ...).
        #[arg(long, default_value = "emergency")]
        prefix: String,
    },

    /// Answer one question and print the structured answer as JSON.
    Query {
        /// The emergency question.
        query: String,

        /// Number of results to retrieve (1-10).
        #[arg(long)]
        top_k: Option<usize>,

        /// Intent tag biasing ranking toward a procedure category
        /// (e.g. `pre_drive`).
        #[arg(long)]
        intent: Option<String>,
    },

    /// Start the HTTP API server.
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    let store: Arc<dyn VectorStore> = Arc::new(QdrantStore::new(&config.qdrant)?);

    match cli.command {
        Commands::Ingest { source, prefix } => {
            let count =
                ingest_txt_file(store, &config.embedding, &source, &prefix).await?;
            println!("Ingested {} scenario chunks", count);
        }
        Commands::Query {
            query,
            top_k,
            intent,
        } => {
            let embedder = Arc::new(ConfigEmbedder::new(config.embedding.clone()));
            let retriever = Retriever::new(store, embedder, config.retrieval.clone());
            let ctx = QueryContext {
                query,
                top_k,
                intent,
            };
            let answer = retriever.answer(&ctx).await?;
            println!("{}", serde_json::to_string_pretty(&answer)?);
        }
        Commands::Serve => {
            let embedder = Arc::new(ConfigEmbedder::new(config.embedding.clone()));
            let retriever = Arc::new(Retriever::new(store, embedder, config.retrieval.clone()));
            run_server(&config, retriever).await?;
        }
    }

    Ok(())
}
