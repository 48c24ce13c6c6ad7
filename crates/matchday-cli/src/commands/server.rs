use anyhow::Result;
use colored::Colorize;

use crate::client::MatchdayClient;

pub async fn status(client: &MatchdayClient, server: &str) -> Result<()> {
    let (code, body) = client.health().await?;
    if code == 200 {
        println!("{} {} is {}", "✓".green(), server.cyan(), "healthy".green());
        Ok(())
    } else {
        anyhow::bail!("{server} returned {code} {body}")
    }
}
