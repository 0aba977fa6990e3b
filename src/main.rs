use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use newsdesk::config::Config;
use newsdesk::ingest::{self, FETCH_TIMEOUT};
use newsdesk::storage::Database;

#[derive(Parser, Debug)]
#[command(
    name = "newsdesk",
    about = "Crawls RSS/Atom feeds into a deduplicated, categorized article store"
)]
struct Args {
    /// Path to the feed sources config file
    #[arg(long, short, default_value = "newsdesk.toml")]
    config: PathBuf,

    /// Path to the SQLite database
    #[arg(long, default_value = "newsdesk.db")]
    database: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch every configured feed once and store new articles (default)
    Ingest,
    /// Print stored articles as JSON, newest first
    Articles {
        /// Only articles from publishers with this language code (e.g. EN, BM)
        #[arg(long)]
        language: Option<String>,
        /// Print a single article by id instead of the full list
        #[arg(long)]
        id: Option<i64>,
    },
    /// Print known publishers as JSON
    Publishers {
        /// Print a single publisher by id instead of the full list
        #[arg(long)]
        id: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let db_path = args
        .database
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = Database::open(db_path)
        .await
        .with_context(|| format!("Failed to open database at {}", args.database.display()))?;

    match args.command.unwrap_or(Command::Ingest) {
        Command::Ingest => run_ingest(&args.config, db).await,
        Command::Articles { language, id } => {
            match id {
                Some(id) => print_json(&db.get_article(id).await?)?,
                None => print_json(&db.list_articles(language.as_deref()).await?)?,
            }
            Ok(())
        }
        Command::Publishers { id } => {
            match id {
                Some(id) => print_json(&db.get_publisher(id).await?)?,
                None => print_json(&db.list_publishers().await?)?,
            }
            Ok(())
        }
    }
}

async fn run_ingest(config_path: &Path, db: Database) -> Result<()> {
    let config = Config::load(config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let client = reqwest::Client::builder()
        .user_agent(concat!("newsdesk/", env!("CARGO_PKG_VERSION")))
        .timeout(FETCH_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")?;

    let outcomes = ingest::ingest_all(db, client, config.sources).await;

    let mut inserted = 0;
    let mut duplicates = 0;
    let mut skipped = 0;
    let mut failed = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(report) => {
                inserted += report.inserted;
                duplicates += report.duplicates;
                skipped += report.skipped;
            }
            Err(_) => failed += 1,
        }
    }

    println!(
        "Ingested {} feeds: {} new articles, {} already stored, {} entries skipped, {} feeds failed",
        outcomes.len(),
        inserted,
        duplicates,
        skipped,
        failed
    );

    // Failed feeds are logged and retried on the next scheduled run; a
    // partial run is still a successful run.
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
