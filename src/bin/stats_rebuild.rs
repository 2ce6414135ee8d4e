//! Stats Rebuild - administrative entry point for the statistics engine
//!
//! Usage:
//!   stats_rebuild                    full rebuild, prints the JSON report
//!   stats_rebuild --player <id>      diagnostic rebuild, prints the JSON trace
//!   stats_rebuild --event <id>       re-derive and refresh players of one event
//!   stats_rebuild --category <id>    refresh players tagged with a category
//!   stats_rebuild --trend <id>       print a player's read-time trend
//!
//! Environment variables:
//!   STATS_DB_PATH - SQLite database path (default: data/squadstats.db)
//!   STATS_REBUILD_CONCURRENCY - concurrent player aggregations (default: 8)
//!   RUST_LOG - log filter (default: info)

use dotenv::dotenv;
use env_logger::{Builder, Env, Target};
use log::{error, info, warn};
use squadstats::store::SqliteStatsStore;
use squadstats::{RebuildCancel, RebuildOrchestrator, StatsConfig};
use std::env;
use std::sync::Arc;

enum Command {
    Full,
    Player(String),
    Event(String),
    Category(String),
    Trend(String),
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    match args {
        [] => Ok(Command::Full),
        [flag, id] => {
            let id = id.trim().to_string();
            if id.is_empty() {
                return Err(format!("{} needs a non-empty id", flag));
            }
            match flag.as_str() {
                "--player" => Ok(Command::Player(id)),
                "--event" => Ok(Command::Event(id)),
                "--category" => Ok(Command::Category(id)),
                "--trend" => Ok(Command::Trend(id)),
                other => Err(format!("Unknown flag: {}", other)),
            }
        }
        _ => Err("Expected no arguments or a single --flag <id> pair".to_string()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let command = match parse_args(&args) {
        Ok(command) => command,
        Err(msg) => {
            eprintln!("{}", msg);
            eprintln!("Usage: stats_rebuild [--player|--event|--category|--trend <id>]");
            std::process::exit(2);
        }
    };

    let config = StatsConfig::from_env();
    config.validate()?;

    info!("🚀 Stats Rebuild");
    info!("   ├─ Database: {}", config.db_path);
    info!("   ├─ Concurrency: {}", config.rebuild_concurrency);
    info!("   └─ Recent games window: {}", config.recent_games);

    let store = Arc::new(SqliteStatsStore::open(&config.db_path)?);
    let orchestrator = RebuildOrchestrator::new(store, &config);
    let cancel = RebuildCancel::new();

    match command {
        Command::Full => {
            let ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("⚠️  Ctrl-C received, finishing in-flight players");
                    ctrl_c.cancel();
                }
            });

            match orchestrator.rebuild_all(&cancel).await {
                Ok(report) => println!("{}", serde_json::to_string_pretty(&report)?),
                Err(e) => {
                    error!("❌ Rebuild aborted: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Command::Player(player_id) => match orchestrator.rebuild_player(&player_id).await {
            Ok(trace) => println!("{}", serde_json::to_string_pretty(&trace)?),
            Err(e) => {
                error!("❌ {}", e);
                std::process::exit(1);
            }
        },
        Command::Event(event_id) => {
            let report = orchestrator.rebuild_for_event(&event_id, &cancel).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Category(category_id) => {
            let report = orchestrator
                .rebuild_for_category(&category_id, &cancel)
                .await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Trend(player_id) => {
            let score = orchestrator.player_trend(&player_id).await?;
            println!("{}", serde_json::to_string_pretty(&score)?);
        }
    }

    Ok(())
}
