mod config;
mod error;
mod models;
mod pipeline;
mod scraper;
mod storage;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::AppConfig;
use crate::error::ScrapeError;
use crate::models::{MemberId, MemberRow};
use crate::pipeline::{Pipeline, load_universe, scrape_member};
use crate::scraper::SejmScraper;
use crate::storage::RecordStore;

#[derive(Parser)]
#[command(name = "sejm-scraper", about = "Sejm member records scraper", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape every listed member not yet in the record table
    Scrape {
        /// Stop after this many new records
        #[arg(short, long)]
        limit: Option<usize>,

        /// Record table path (overrides storage.table_path)
        #[arg(short, long, env = "SEJM_TABLE")]
        table: Option<PathBuf>,
    },

    /// Print the ids of all active members
    Ids,

    /// Fetch a single member and print the record (nothing is saved)
    Show {
        /// Member id, e.g. 1 or 001
        id: String,

        /// Print the table row as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show record table statistics
    Stats {
        #[arg(short, long, env = "SEJM_TABLE")]
        table: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "sejm_scraper=info,warn",
        1 => "sejm_scraper=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::new(filter))
        .init();

    let config = AppConfig::load()?;

    let result = run(cli.command, config).await;
    if let Err(e) = &result {
        if let Some(ScrapeError::NoResponse { .. }) = e.downcast_ref::<ScrapeError>() {
            error!(
                "No response from server. Check your connection (or try a proxy) and run again; \
                 members already saved will be skipped."
            );
        }
    }
    result
}

async fn run(command: Command, config: AppConfig) -> Result<()> {
    match command {
        Command::Scrape { limit, table } => {
            let path = table.unwrap_or(config.storage.table_path);
            let store = RecordStore::open(&path)
                .with_context(|| format!("Failed to load record table {:?}", path))?;
            let source = SejmScraper::new(&config.scraper)?;

            let stats = Pipeline::new(source, store, config.scraper.email_anchor_id)
                .with_limit(limit)
                .run()
                .await?;
            info!(
                "Done: {} scraped, {} skipped, {} failed",
                stats.scraped, stats.skipped, stats.failed
            );
        }

        Command::Ids => {
            let source = SejmScraper::new(&config.scraper)?;
            let universe = load_universe(&source).await?;
            println!("{} active members:", universe.len());
            for id in universe.iter() {
                println!("  {}", id);
            }
        }

        Command::Show { id, json } => {
            let id = MemberId::parse(&id)?;
            let source = SejmScraper::new(&config.scraper)?;
            let universe = load_universe(&source).await?;
            if !universe.contains(&id) {
                anyhow::bail!("{} is not an active member id", id);
            }

            let record =
                scrape_member(&source, &id, &config.scraper.email_anchor_id, &universe).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&MemberRow::from(&record))?);
            } else {
                println!("{}", record);
                println!("Speeches                 : {}", source.speeches_url(&id));
                println!("Votings                  : {}", source.votings_url(&id));
            }
        }

        Command::Stats { table } => {
            let path = table.unwrap_or(config.storage.table_path);
            let store = RecordStore::open(&path)?;
            let with_email = store.rows().iter().filter(|r| r.email.is_some()).count();
            println!("─────────────────────────────────");
            println!("  Sejm records — {:?}", store.path());
            println!("─────────────────────────────────");
            println!("  Members     : {}", store.len());
            println!("  With e-mail : {}", with_email);
            println!("─────────────────────────────────");
        }
    }

    Ok(())
}
