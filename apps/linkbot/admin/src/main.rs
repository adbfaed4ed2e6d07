use anyhow::{Context, Result, bail};
use chrono::{Duration, NaiveDate};
use clap::{Parser, Subcommand};
use common::ServiceError;
use common::config::{ChannelDirectory, Settings};
use common::fetcher::{HttpFetcher, MetadataFetcher};
use common::maintenance::{self, HistoryExport};
use common::queries::start_of_day;
use sea_orm::{DatabaseConnection, TransactionTrait};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "linkbot-admin", about = "Maintenance tasks for the link archive")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replace a channel's entries with the links of a chat history export
    Import {
        #[arg(long)]
        channel: String,
        #[arg(long)]
        file: PathBuf,
    },
    /// Delete a channel's entries, optionally only between two dates (inclusive)
    Delete {
        #[arg(long)]
        channel: String,
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
    },
    /// Re-scrape stored entries, newest first
    Repair {
        /// SQL LIKE pattern the url must match, e.g. '%youtube.com%'
        #[arg(long)]
        pattern: Option<String>,
        #[arg(long)]
        limit: Option<u64>,
    },
    /// Scrape a single url and print what was found
    Scrape { url: String },
}

fn resolve_channel(channels: &ChannelDirectory, name: &str) -> Result<i64, ServiceError> {
    channels
        .id_of(name)
        .ok_or_else(|| ServiceError::Config(format!("Channel {} not found", name)))
}

async fn connect() -> Result<(ChannelDirectory, DatabaseConnection)> {
    let settings = Settings::new().context("Failed to load configuration")?;
    let db = common::db::connect(&settings).await?;
    Ok((settings.channel_directory(), db))
}

#[tokio::main]
async fn main() -> Result<()> {
    common::logger::init();
    let cli = Cli::parse();
    let fetcher = HttpFetcher::new()?;

    match cli.command {
        Command::Import { channel, file } => {
            let (channels, db) = connect().await?;
            let channel_id = resolve_channel(&channels, &channel)?;
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Cannot read {}", file.display()))?;
            let export = HistoryExport::parse(&raw)
                .with_context(|| format!("Cannot parse {}", file.display()))?;

            let stored = maintenance::import_history(&db, &fetcher, channel_id, export).await?;
            info!("Imported {} entries into #{}", stored, channel);
        }
        Command::Delete { channel, from, to } => {
            let (channels, db) = connect().await?;
            let channel_id = resolve_channel(&channels, &channel)?;
            let txn = db.begin().await?;
            let deleted = match (from, to) {
                (Some(from), Some(to)) => {
                    if to < from {
                        bail!("--to must not be before --from");
                    }
                    let end = start_of_day(to + Duration::days(1)) - Duration::microseconds(1);
                    maintenance::delete_channel_range(&txn, channel_id, start_of_day(from), end)
                        .await?
                }
                _ => maintenance::delete_channel(&txn, channel_id).await?,
            };
            txn.commit().await?;
            info!("Deleted {} entries from #{}", deleted, channel);
        }
        Command::Repair { pattern, limit } => {
            let (_, db) = connect().await?;
            let repaired =
                maintenance::repair_metadata(&db, &fetcher, pattern.as_deref(), limit).await?;
            info!("Repaired {} entries", repaired);
        }
        Command::Scrape { url } => {
            let metadata = fetcher.fetch(&url).await;
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        }
    }

    Ok(())
}
