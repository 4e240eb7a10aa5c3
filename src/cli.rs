//! CLI interface for dom-pilot
//!
//! Operational surface around the selector bank: seed it, inspect the
//! ranking, audit the interaction history. Resolution itself runs inside
//! the automation process, not from here.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use crate::bank::SelectorBank;
use crate::config::Config;
use crate::seed;
use crate::store::SelectorStore;
use crate::types::UiContext;

#[derive(Parser)]
#[command(name = "dom-pilot")]
#[command(about = "Self-healing selector bank for dashboard automation", long_about = None)]
#[command(version)]
struct Cli {
    /// Override the database path from the config file
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the selector store from a JSON file of hand-authored candidates
    Seed {
        /// Path to the seed file
        file: PathBuf,
    },
    /// List ranked candidates for an element type
    List {
        /// Logical element type (e.g. "activity_card")
        element_type: String,
        /// Rank for the mobile layout instead of desktop
        #[arg(short, long)]
        mobile: bool,
        /// Include retired candidates (unranked, flagged)
        #[arg(long)]
        all: bool,
    },
    /// Show store statistics
    Stats,
    /// Show the interaction history for a selector
    History {
        /// Candidate id
        selector_id: String,
        /// Maximum rows to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
}

/// Parse arguments and run the requested command
pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;

    let database_path = cli
        .database
        .unwrap_or_else(|| config.storage.database_path.clone());
    let store = Arc::new(SelectorStore::new(&database_path).await?);

    match cli.command {
        Commands::Seed { file } => {
            let report = seed::seed_from_file(&store, &file).await?;
            println!(
                "Seeded {} candidates from {} ({} already present)",
                report.inserted,
                file.display(),
                report.skipped
            );
        }
        Commands::List {
            element_type,
            mobile,
            all,
        } => {
            list_candidates(store, &config, &element_type, mobile, all).await?;
        }
        Commands::Stats => {
            let stats = store.stats().await?;
            println!("Selector store: {}", database_path.display());
            println!("  Active candidates:  {}", stats.active_candidates);
            println!("  Retired candidates: {}", stats.retired_candidates);
            println!("  Element types:      {}", stats.element_types);
            println!("  Interactions:       {}", stats.interactions);
        }
        Commands::History { selector_id, limit } => {
            let records = store.history(&selector_id, limit).await?;
            if records.is_empty() {
                println!("No interaction history for {}", selector_id);
            }
            for record in records {
                println!(
                    "{}  {:<7}  {:>7.0}ms  {}",
                    record.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    record.action,
                    record.response_time,
                    record.error_message.unwrap_or_default()
                );
            }
        }
    }

    Ok(())
}

async fn list_candidates(
    store: Arc<SelectorStore>,
    config: &Config,
    element_type: &str,
    mobile: bool,
    all: bool,
) -> Result<()> {
    let ctx = if mobile {
        UiContext::mobile("")
    } else {
        UiContext::desktop("")
    };

    let bank = SelectorBank::new(store.clone(), config.selectors.clone());
    bank.load().await?;

    let ranked = bank.candidates(element_type, &ctx).await;
    if ranked.is_empty() && !all {
        println!(
            "No active candidates for '{}' (mobile={})",
            element_type, mobile
        );
        return Ok(());
    }

    println!(
        "{:<5} {:<10} {:<36} {:>6} {:>5}/{:<5} {:>8}",
        "rank", "strategy", "value", "conf", "ok", "fail", "avg ms"
    );
    for (rank, candidate) in ranked.iter().enumerate() {
        println!(
            "{:<5} {:<10} {:<36} {:>6.1} {:>5}/{:<5} {:>8.0}",
            rank + 1,
            candidate.strategy.to_string(),
            candidate.value,
            candidate.confidence,
            candidate.success_count,
            candidate.failure_count,
            candidate.avg_response_time
        );
    }

    if all {
        let retired: Vec<_> = store
            .load_all()
            .await?
            .into_iter()
            .filter(|c| c.element_type == element_type && c.is_retired())
            .collect();
        for candidate in retired {
            println!(
                "{:<5} {:<10} {:<36} {:>6.1} {:>5}/{:<5} retired",
                "-",
                candidate.strategy.to_string(),
                candidate.value,
                candidate.confidence,
                candidate.success_count,
                candidate.failure_count,
            );
        }
    }

    Ok(())
}
