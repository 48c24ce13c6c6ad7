use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "matchday")]
#[command(about = "Push and fetch today's match predictions")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Server base URL
    #[arg(
        short,
        long,
        global = true,
        env = "MATCHDAY_URL",
        default_value = "http://localhost:8080"
    )]
    pub server: String,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Submit a batch of predictions
    Push(PushArgs),
    /// Fetch today's published batch
    Fetch(FetchArgs),
    /// Check server health
    Status,
}

#[derive(clap::Args)]
pub struct PushArgs {
    /// JSON file holding the batch (reads stdin when omitted)
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct FetchArgs {
    /// Access secret sent in the gate header
    #[arg(long, env = "MATCHDAY_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// Name of the gate header
    #[arg(long, default_value = "X-RapidAPI-Proxy-Secret")]
    pub secret_header: String,
}
