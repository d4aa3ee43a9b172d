//! # Knowledge Relay CLI (`relay`)
//!
//! ## Usage
//!
//! ```bash
//! relay [--config ./config/relay.toml] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `relay serve` | Start the HTTP server |
//! | `relay search "<query>"` | Send one query through the search relay |
//! | `relay ask "<question>" --file <path>` | Load files into a fresh knowledge base and ask once |
//! | `relay chunk --file <path>` | Print the chunks a file would be stored as |
//!
//! Logging goes to stderr and is controlled with `RUST_LOG` (default `info`).

use anyhow::Context;
use clap::{Parser, Subcommand};
use knowledge_relay::config::{self, Config};
use knowledge_relay::ingest;
use knowledge_relay::server::{self, AppState};
use knowledge_relay_core::KnowledgeStore;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Knowledge Relay: a query relay and retrieval-augmented knowledge
/// chatbot in front of a generative-language API.
#[derive(Parser)]
#[command(name = "relay", version, about)]
struct Cli {
    /// Path to configuration file (TOML). Built-in defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server.
    ///
    /// Binds to `[server].bind`, or `0.0.0.0:$PORT` when `PORT` is set.
    Serve,

    /// Send a single query through the search relay and print the response.
    Search {
        /// The query text.
        query: String,
    },

    /// Answer a question from local documents.
    ///
    /// Each `--file` is ingested into a fresh in-memory knowledge base
    /// before the question is asked.
    Ask {
        /// The question text.
        question: String,

        /// `.txt` or `.pdf` file to load. May be repeated.
        #[arg(long = "file", required = true)]
        files: Vec<PathBuf>,
    },

    /// Print the chunks a file would be split into. No API key needed.
    Chunk {
        #[arg(long)]
        file: PathBuf,
    },
}

fn load(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(p) => config::load_config(p),
        None => Ok(Config::default()),
    }
}

fn read_upload(path: &Path) -> anyhow::Result<(String, Vec<u8>)> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("invalid file name: {}", path.display()))?
        .to_string();
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok((filename, bytes))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Search { query } => {
            let generator = server::generator_from_config(&cfg)?;
            let state = AppState::new(cfg, generator)?;
            let response = state.relay.perform_search(&query).await?;
            println!("{}", response);
        }
        Commands::Ask { question, files } => {
            let generator = server::generator_from_config(&cfg)?;
            let state = AppState::new(cfg, generator)?;
            for path in &files {
                let (filename, bytes) = read_upload(path)?;
                ingest::add_document_blocking(state.store.clone(), filename, bytes).await?;
            }
            let answer = state.chatbot.ask(&question).await?;
            println!("{}", answer.text());
            println!();
            println!("Sources: {}", state.chatbot.sources().join(", "));
        }
        Commands::Chunk { file } => {
            let (filename, bytes) = read_upload(&file)?;
            let store = KnowledgeStore::new(cfg.chunking.chunk_size()?);
            let id = ingest::add_document(&store, &filename, &bytes)?;
            let doc = store
                .get(&id)
                .context("document disappeared from a private store")?;
            println!(
                "{}: {} characters, {} chunk(s) of up to {} words",
                doc.filename,
                doc.content.chars().count(),
                doc.chunks.len(),
                store.chunk_size()
            );
            for (i, chunk) in doc.chunks.iter().enumerate() {
                println!("\n--- chunk {} ({} words) ---", i, chunk.split(' ').count());
                println!("{}", chunk);
            }
        }
    }

    Ok(())
}
