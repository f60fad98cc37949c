use clap::{Parser, Subcommand};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::error;

use intelfeed::config::Config;
use intelfeed::feed::HttpFeedClient;
use intelfeed::pipeline::{run_sources, PollCycle};
use intelfeed::sink::NdjsonFileSink;
use intelfeed::{logging, metrics};

#[derive(Parser)]
#[command(name = "intelfeed")]
#[command(about = "Incremental threat-intelligence feed poller")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the configuration file (defaults to config.toml)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll every configured source once
    Poll {
        /// Specific sources to poll (comma-separated); defaults to all configured
        #[arg(long)]
        sources: Option<String>,
        /// Override the data root from config
        #[arg(long)]
        data_root: Option<String>,
    },
    /// List configured sources and whether their credentials resolve
    Sources,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();
    metrics::init_metrics();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Poll { sources, data_root } => {
            let selected: Vec<_> = match sources {
                Some(list) => {
                    let wanted: Vec<String> =
                        list.split(',').map(|s| s.trim().to_string()).collect();
                    config
                        .sources
                        .iter()
                        .filter(|s| wanted.contains(&s.name))
                        .cloned()
                        .collect()
                }
                None => config.sources.clone(),
            };
            if selected.is_empty() {
                println!("⚠️  No matching sources configured");
                return Ok(());
            }

            println!("🔄 Polling {} source(s)...", selected.len());

            let data_root = data_root.unwrap_or_else(|| config.poller.data_root.clone());
            let client = HttpFeedClient::new(
                &config.feed.host,
                &config.feed.path,
                Duration::from_secs(config.feed.timeout_seconds),
            )?;
            let sink = NdjsonFileSink::new(Path::new(&data_root).join(&config.poller.event_log));

            let cycle = PollCycle::new(&data_root, Arc::new(client), Arc::new(sink));
            let outcomes = run_sources(&cycle, &selected).await;

            for outcome in &outcomes {
                match &outcome.result {
                    Ok(summary) => {
                        println!("\n📊 Poll results for {}:", outcome.source);
                        println!("   Window since: {}", summary.since_epoch_seconds);
                        println!("   Events emitted: {}", summary.events_emitted);
                    }
                    Err(e) => {
                        error!("Poll failed for {}: {}", outcome.source, e);
                        println!("\n❌ Poll failed for {} ({}): {}", outcome.source, e.kind(), e);
                    }
                }
            }
        }
        Commands::Sources => {
            if config.sources.is_empty() {
                println!("⚠️  No sources configured");
            } else {
                println!("Configured sources:");
                for source in &config.sources {
                    let status = if source.credential_resolved() {
                        "credentials resolved"
                    } else {
                        "credentials missing"
                    };
                    println!("   {} — {}", source.name, status);
                }
            }
        }
    }

    Ok(())
}
