//! # Decision Recall CLI (`recall`)
//!
//! The `recall` binary loads the decision case corpus, builds the
//! similarity index against the configured embedding provider, and either
//! serves the HTTP API or answers a single search from the command line.
//!
//! ## Usage
//!
//! ```bash
//! recall --config ./recall.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `recall serve` | Build the index and start the HTTP server |
//! | `recall search` | Build the index and run one similarity search |
//!
//! ## Examples
//!
//! ```bash
//! # Start the API server
//! recall --config ./recall.toml serve
//!
//! # One-shot search from the terminal
//! recall --config ./recall.toml search \
//!     --title "Team messaging" \
//!     --summary "A messaging tool for teams" \
//!     --tag chat --top-k 3
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use decision_recall::config;
use decision_recall::embedding::{create_provider, EmbeddingProvider};
use decision_recall::index::CaseIndex;
use decision_recall::loader;
use decision_recall::models::NewIdea;
use decision_recall::server;
use decision_recall::similarity::search_similar_cases;

/// Decision Recall — similarity search and reflective questions over past
/// decision cases.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `recall.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "recall",
    about = "Decision Recall — retrieve similar past decisions for new ideas",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./recall.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server.
    ///
    /// Loads the case corpus, embeds it with the configured provider, and
    /// binds to the address in `[server].bind`.
    Serve,

    /// Run one similarity search and print the ranked results.
    ///
    /// Builds the index the same way `serve` does, then searches once
    /// with the given idea fields.
    Search {
        /// Idea title.
        #[arg(long)]
        title: String,

        /// Idea summary.
        #[arg(long)]
        summary: String,

        /// Idea tag (repeatable).
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Number of results to return (defaults to `[search].top_k`).
        #[arg(long)]
        top_k: Option<usize>,
    },
}

/// Load the corpus and publish the initial index snapshot.
async fn build_index(
    cfg: &config::Config,
    provider: &dyn EmbeddingProvider,
) -> anyhow::Result<CaseIndex> {
    let cases = loader::load_cases(&cfg.data.cases_path)?;
    println!(
        "Loaded {} cases from {}",
        cases.len(),
        cfg.data.cases_path.display()
    );

    let index = CaseIndex::new();
    index.initialize(provider, cases).await?;
    Ok(index)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    let provider = create_provider(&cfg.embedding)?;
    println!(
        "Embedding provider: {} ({}, {} dims)",
        cfg.embedding.provider,
        provider.model_name(),
        provider.dims()
    );

    match cli.command {
        Commands::Serve => {
            let index = build_index(&cfg, provider.as_ref()).await?;
            server::run_server(Arc::new(cfg), Arc::new(index), Arc::from(provider)).await?;
        }
        Commands::Search {
            title,
            summary,
            tags,
            top_k,
        } => {
            let index = build_index(&cfg, provider.as_ref()).await?;
            let idea = NewIdea {
                title,
                summary,
                tags,
            };
            let top_k = top_k.unwrap_or(cfg.search.top_k);
            let results =
                search_similar_cases(&index, provider.as_ref(), &idea, top_k).await?;

            if results.is_empty() {
                println!("No results.");
                return Ok(());
            }

            for (i, scored) in results.iter().enumerate() {
                println!(
                    "{}. [{:.4}] {} ({})",
                    i + 1,
                    scored.score,
                    scored.case.title,
                    scored.case.status
                );
                println!("    reason: {}", scored.case.main_reason);
                if !scored.case.tags.is_empty() {
                    println!("    tags: {}", scored.case.tags.join(", "));
                }
                println!("    id: {}", scored.case.id);
            }
        }
    }

    Ok(())
}
