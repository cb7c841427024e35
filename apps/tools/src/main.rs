use anyhow::Result;
use clap::{Parser, Subcommand};
use dispatch::{Catalog, StatusAccessor, StatusSummary};
use storage::CounterStore;
use tracing_subscriber::EnvFilter;
use url::Url;

mod remote;

use remote::StatsClient;

#[derive(Parser, Debug)]
struct Cli {
    /// Status server that owns the live counters.
    #[arg(long, default_value = "http://127.0.0.1:10000")]
    server: Url,
    /// Work on the stats file directly. Only safe while the server is stopped,
    /// otherwise its next save overwrites the file.
    #[arg(long)]
    offline: bool,
    /// Stats file used with `--offline`.
    #[arg(long, default_value = "bot_stats.json")]
    stats_file: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every counter and the total.
    Show {
        #[arg(long)]
        json: bool,
    },
    /// Zero every counter.
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let schema = Catalog::department().counter_schema();

    if cli.offline {
        let status = StatusAccessor::new(CounterStore::load(&cli.stats_file, &schema));
        match cli.command {
            Command::Show { json } => print_summary(&status.summary(), json)?,
            Command::Reset => {
                status.reset_all();
                println!("reset counters in {}", cli.stats_file);
            }
        }
        return Ok(());
    }

    let client = StatsClient::new(cli.server.clone());
    match cli.command {
        Command::Show { json } => print_summary(&client.fetch(&schema).await?, json)?,
        Command::Reset => {
            let summary = client.reset(&schema).await?;
            println!("reset counters on {} (total {})", cli.server, summary.total);
        }
    }
    Ok(())
}

fn print_summary(summary: &StatusSummary, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "button_stats": summary.counts,
                "total_requests": summary.total,
            }))?
        );
    } else {
        for (label, count) in summary.counts.iter() {
            println!("{label}: {count}");
        }
        println!("total: {}", summary.total);
    }
    Ok(())
}
