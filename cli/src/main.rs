//! scoreindex CLI: run the leaderboard sync and inspect its state.
//!
//! Configuration comes from environment variables (`RPC_URL`,
//! `CONTRACT_ADDRESS`, `GAME_FINISHED_KEY`, `DATABASE_URL`, ...).
//!
//! Usage:
//! ```bash
//! # Sync on a fixed interval until Ctrl-C
//! scoreindex run
//!
//! # Run a single cycle and print what it did
//! scoreindex once
//!
//! # Inspect persisted state
//! scoreindex status
//! scoreindex leaderboard --limit 20
//! ```

mod logging;

use std::env;
use std::process;
use std::sync::Arc;

use scoreindex_core::{
    CursorStore, CycleOutcome, PointLedger, Scheduler, SyncConfig, SyncEngine,
};
use scoreindex_rpc::{HttpClientConfig, HttpRpcClient};
use scoreindex_starknet::{starknet_keccak, StarknetEventSource, EVENT_EMITTED};
use scoreindex_storage::SqliteStorage;
use tokio::sync::watch;

use crate::logging::{init_tracing, LogConfig};

type Engine = SyncEngine<StarknetEventSource<HttpRpcClient>>;

const DEFAULT_LEADERBOARD_LIMIT: usize = 10;

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "run" => cmd_run().await,
        "once" => cmd_once().await,
        "status" => cmd_status().await,
        "leaderboard" => cmd_leaderboard(&args[2..]).await,
        "info" => {
            cmd_info();
            Ok(())
        }
        "version" | "--version" | "-V" => {
            println!("scoreindex {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn print_usage() {
    println!("scoreindex {}", env!("CARGO_PKG_VERSION"));
    println!("Cursor-tracked leaderboard sync for Starknet game results\n");
    println!("USAGE:");
    println!("    scoreindex <COMMAND>\n");
    println!("COMMANDS:");
    println!("    run          Sync on a fixed interval until Ctrl-C");
    println!("    once         Run a single sync cycle");
    println!("    status       Show the persisted cursor and player count");
    println!("    leaderboard  Print the top players");
    println!("    info         Show configuration and defaults");
    println!("    version      Print version");
    println!("    help         Print this help\n");
    println!("LEADERBOARD FLAGS:");
    println!("    --limit <N>  Number of players to show  [default: {DEFAULT_LEADERBOARD_LIMIT}]\n");
    println!("ENVIRONMENT:");
    println!("    RPC_URL, CONTRACT_ADDRESS, GAME_FINISHED_KEY   required for run/once");
    println!("    START_BLOCK, CHUNK_SIZE, POLL_INTERVAL_SECONDS, MAX_EVENTS_PER_CALL,");
    println!("    EVENT_KEY, DATABASE_URL, DECODE_POLICY, RPC_TIMEOUT_SECONDS");
    println!("    SCOREINDEX_LOG, SCOREINDEX_LOG_JSON            logging");
}

fn load_config() -> Result<SyncConfig, String> {
    SyncConfig::from_env().map_err(|e| e.to_string())
}

async fn open_storage(config: &SyncConfig) -> Result<Arc<SqliteStorage>, String> {
    SqliteStorage::open(&config.database_url)
        .await
        .map(Arc::new)
        .map_err(|e| e.to_string())
}

async fn build_engine(config: &SyncConfig) -> Result<Engine, String> {
    config.validate_for_sync().map_err(|e| e.to_string())?;

    let client = HttpRpcClient::new(
        config.rpc_url.clone(),
        HttpClientConfig {
            request_timeout: config.rpc_timeout(),
            ..HttpClientConfig::default()
        },
    )
    .map_err(|e| e.to_string())?;
    let source = StarknetEventSource::from_config(client, config).map_err(|e| e.to_string())?;
    let storage = open_storage(config).await?;

    tracing::info!(
        rpc_url = %config.rpc_url,
        contract = %source.contract_address(),
        start_block = config.start_block,
        chunk_size = config.chunk_size,
        database = %config.database_url,
        "sync engine configured"
    );
    Ok(SyncEngine::new(source, storage.clone(), storage, config))
}

async fn cmd_run() -> Result<(), String> {
    init_tracing(&LogConfig::from_env());
    let config = load_config()?;
    let engine = Arc::new(build_engine(&config).await?);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown requested");
        }
        let _ = shutdown_tx.send(true);
    });

    // Returns only after an in-flight cycle has finished its writes.
    Scheduler::new(engine, config.poll_interval())
        .run(shutdown_rx)
        .await;
    Ok(())
}

async fn cmd_once() -> Result<(), String> {
    init_tracing(&LogConfig::from_env());
    let config = load_config()?;
    let engine = build_engine(&config).await?;

    match engine.run_cycle().await.map_err(|e| e.to_string())? {
        CycleOutcome::Completed(summary) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&summary).map_err(|e| e.to_string())?
            );
        }
        CycleOutcome::Skipped => println!("cycle skipped: another cycle is running"),
    }
    Ok(())
}

async fn cmd_status() -> Result<(), String> {
    let config = load_config()?;
    let storage = open_storage(&config).await?;

    let cursor = storage.load_cursor().await.map_err(|e| e.to_string())?;
    let players = storage.player_count().await.map_err(|e| e.to_string())?;

    println!("Database:     {}", config.database_url);
    match cursor {
        Some(c) => {
            println!("Next block:   {}", c.last_block);
            println!("Updated at:   {}", format_timestamp(c.updated_at));
        }
        None => println!("Next block:   {} (no cursor yet)", config.start_block),
    }
    println!("Players:      {players}");
    Ok(())
}

async fn cmd_leaderboard(args: &[String]) -> Result<(), String> {
    let limit = match parse_flag(args, "--limit") {
        Some(v) => v
            .parse::<usize>()
            .map_err(|_| format!("--limit must be a non-negative integer, got {v:?}"))?,
        None => DEFAULT_LEADERBOARD_LIMIT,
    };

    let config = load_config()?;
    let storage = open_storage(&config).await?;
    let players = storage.top_players(limit).await.map_err(|e| e.to_string())?;

    if players.is_empty() {
        println!("No players yet.");
        return Ok(());
    }
    println!("{:>4}  {:>6}  ADDRESS", "RANK", "POINT");
    for (rank, player) in players.iter().enumerate() {
        println!("{:>4}  {:>6}  {}", rank + 1, player.point, player.address);
    }
    Ok(())
}

fn cmd_info() {
    let defaults = SyncConfig::default();
    println!("scoreindex v{}", env!("CARGO_PKG_VERSION"));
    println!("  Default start block:    {}", defaults.start_block);
    println!("  Default chunk size:     {} blocks past the cursor", defaults.chunk_size);
    println!("  Default poll interval:  {}s", defaults.poll_interval_secs);
    println!("  Default page size:      {} events/call", defaults.max_events_per_call);
    println!("  Default event key:      {}", starknet_keccak(EVENT_EMITTED));
    println!("  Default database:       {}", defaults.database_url);
    println!("  Default decode policy:  {}", defaults.decode_policy);
    println!("  Scoring: winner +1 (new: 1), loser -1 floored at 0 (new: 0)");
}

fn format_timestamp(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| ts.to_string())
}

fn parse_flag(args: &[String], flag: &str) -> Option<String> {
    let pos = args.iter().position(|a| a == flag)?;
    args.get(pos + 1).cloned()
}
