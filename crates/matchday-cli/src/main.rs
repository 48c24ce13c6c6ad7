mod cli;
mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};
use client::MatchdayClient;
use output::print_error;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let format = cli.format.unwrap_or_default();
    let client = MatchdayClient::new(&cli.server);

    match &cli.command {
        Commands::Push(args) => {
            commands::predictions::push(&client, args.file.as_deref()).await?;
        }
        Commands::Fetch(args) => {
            commands::predictions::fetch(
                &client,
                &args.secret_header,
                args.secret.as_deref(),
                format,
            )
            .await?;
        }
        Commands::Status => {
            commands::server::status(&client, &cli.server).await?;
        }
    }

    Ok(())
}
