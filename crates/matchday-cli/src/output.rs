use colored::Colorize;
use matchday_core::PredictionBatch;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;

pub fn print_batch(batch: &PredictionBatch, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(batch)?),
        OutputFormat::Table => print_as_table(batch),
    }
    Ok(())
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

fn print_as_table(batch: &PredictionBatch) {
    if batch.is_empty() {
        println!("No predictions published.");
        return;
    }
    println!("{}", batch_table(batch));
    println!("Total: {}", batch.len());
}

/// One row per record, one column per market.
fn batch_table(batch: &PredictionBatch) -> String {
    let mut builder = Builder::default();
    builder.push_record([
        "Match",
        "Home",
        "Away",
        "1X2",
        "O/U 2.5",
        "O/U 3.5",
        "BTTS",
        "Home O/U 1.5",
        "Away O/U 1.5",
        "Home scores",
        "Away scores",
    ]);
    for r in batch.iter() {
        builder.push_record([
            r.match_id.as_str(),
            r.home_team.as_str(),
            r.away_team.as_str(),
            r.result_1x2.as_str(),
            r.over_under_2_5g.as_str(),
            r.over_under_3_5g.as_str(),
            r.btts.as_str(),
            r.home_over_under_1_5.as_str(),
            r.away_over_under_1_5.as_str(),
            r.home_to_score.as_str(),
            r.away_to_score.as_str(),
        ]);
    }
    builder.build().with(Style::rounded()).to_string()
}
