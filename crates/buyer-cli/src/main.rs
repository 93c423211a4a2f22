//! buyer: Negotiate with an LLM-backed buyer agent
//!
//! You play the seller at the `Seller:` prompt; the buyer replies, may commit
//! to a purchase, and keeps a running budget.

mod commands;
mod repl;
mod transcript;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "buyer")]
#[command(about = "Negotiate with an LLM-backed buyer agent", version)]
#[command(propagate_version = true)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to buyer.toml (searched in current directory and parents if omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Chat options, used when no subcommand is given
    #[command(flatten)]
    chat: ChatArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Start the negotiation REPL
    Chat(ChatArgs),

    /// Show the asset catalog and starting budget
    Assets,

    /// Show the resolved configuration
    Config,

    /// Show a saved transcript
    Transcript {
        /// Transcript id
        id: String,
    },
}

#[derive(Debug, clap::Args)]
pub struct ChatArgs {
    /// API key for the language model
    #[arg(long, env = "GPT_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model to use (overrides config)
    #[arg(short, long, env = "GPT_MODEL_NAME")]
    pub model: Option<String>,

    /// Base URL of an OpenAI-compatible API (overrides config)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Starting budget (overrides config)
    #[arg(short, long)]
    pub budget: Option<u64>,

    /// Seed for reproducible price drift
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write a transcript when the conversation ends
    #[arg(long)]
    pub save: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Chat(args)) => repl::run(cli.config.as_deref(), args).await,
        Some(Commands::Assets) => commands::assets(cli.config.as_deref()),
        Some(Commands::Config) => commands::show_config(cli.config.as_deref()),
        Some(Commands::Transcript { id }) => commands::show_transcript(&id),
        None => repl::run(cli.config.as_deref(), cli.chat).await,
    }
}
