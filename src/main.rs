use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use dialoguer::Confirm;
use dotenvy::dotenv;
use talebedu::talebedu_models::{Collection, QueuedOperation};
use talebedu::{AppConfig, RemoteQuery, SyncState, SyncWorker};
use talebedu_observability::{init_metrics, init_tracing};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "talebedu-sync")]
#[command(about = "TalebEdu offline sync - inspect and drive the local sync queue", long_about = None)]
struct Cli {
    /// Start in offline mode regardless of SYNC_START_ONLINE
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show connectivity, cache sizes, queue counts and last sync time
    Status,
    /// Fetch a collection (remote-first when online) and print it as JSON
    Fetch {
        /// Collection name: students, teachers, fees or attendance
        collection: Collection,

        /// Columns to select (default: all)
        #[arg(short = 's', long)]
        select: Option<String>,

        /// Equality filter, repeatable (e.g. --eq class=5A)
        #[arg(long = "eq", value_parser = parse_filter)]
        filters: Vec<(String, String)>,

        /// Maximum number of rows
        #[arg(short = 'l', long)]
        limit: Option<u32>,
    },
    /// List operations waiting to be replayed
    Pending,
    /// List operations that were given up on
    DeadLetters,
    /// Replay pending operations now
    Replay,
    /// Delete operations already confirmed by the remote
    Purge,
    /// Move a dead-lettered operation back to the pending queue
    Requeue {
        /// Operation id
        id: String,
    },
    /// Delete all dead-lettered operations
    DiscardDeadLetters {
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Run the sync worker until Ctrl-C. Type `online` or `offline` on stdin
    /// to report connectivity changes.
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let cli = Cli::parse();

    init_tracing();
    let _metrics = init_metrics();

    let state = SyncState::init(AppConfig::from_env())
        .await
        .context("Failed to initialize sync state")?;

    if cli.offline {
        state.connectivity.set_online(false);
    }

    match cli.command {
        Commands::Status => handle_status(&state).await,
        Commands::Fetch {
            collection,
            select,
            filters,
            limit,
        } => handle_fetch(&state, collection, select, filters, limit).await,
        Commands::Pending => {
            let pending = state.queue.list_pending().await?;
            print_operations(&pending, "No pending operations");
            Ok(())
        }
        Commands::DeadLetters => {
            let dead = state.queue.list_dead_lettered().await?;
            print_operations(&dead, "No dead-lettered operations");
            Ok(())
        }
        Commands::Replay => handle_replay(&state).await,
        Commands::Purge => {
            let purged = state.queue.purge_synced().await?;
            println!("✅ Purged {purged} synced operation(s)");
            Ok(())
        }
        Commands::Requeue { id } => {
            if !state.queue.requeue(&id).await? {
                bail!("No dead-lettered operation with id {id}");
            }
            println!("✅ Operation {id} moved back to the pending queue");
            Ok(())
        }
        Commands::DiscardDeadLetters { yes } => handle_discard(&state, yes).await,
        Commands::Watch => handle_watch(&state).await,
    }
}

async fn handle_status(state: &SyncState) -> Result<()> {
    let counts = state.queue.counts().await?;
    let last_sync = state.metadata.last_sync().await?;

    println!(
        "Connectivity: {}",
        if state.connectivity.is_online() {
            "online"
        } else {
            "offline"
        }
    );
    println!(
        "Remote:       {}",
        if state.coordinator().is_ok() {
            "configured"
        } else {
            "not configured"
        }
    );
    println!(
        "Last sync:    {}",
        last_sync
            .map(|at| at.to_rfc3339())
            .unwrap_or_else(|| "never".to_string())
    );

    println!("\nCached records:");
    for collection in Collection::ALL {
        println!(
            "  {:<12} {}",
            collection.store_name(),
            state.cache.count(collection).await?
        );
    }

    println!("\nQueue:");
    println!("  {:<14} {}", "pending", counts.pending);
    println!("  {:<14} {}", "synced", counts.synced);
    println!("  {:<14} {}", "dead-lettered", counts.dead_lettered);

    Ok(())
}

async fn handle_fetch(
    state: &SyncState,
    collection: Collection,
    select: Option<String>,
    filters: Vec<(String, String)>,
    limit: Option<u32>,
) -> Result<()> {
    let mut query = RemoteQuery::all();
    if let Some(columns) = select {
        query = query.columns(columns);
    }
    for (column, value) in filters {
        query = query.eq(column, value);
    }
    if let Some(limit) = limit {
        query = query.limit(limit);
    }

    let records = match state.coordinator() {
        Ok(coordinator) => coordinator.fetch_records(collection, &query).await?,
        Err(_) => state.cache.get_all(collection).await?,
    };

    println!("{}", serde_json::to_string_pretty(&records)?);

    Ok(())
}

async fn handle_replay(state: &SyncState) -> Result<()> {
    let coordinator = state.coordinator()?;

    if !coordinator.connectivity().is_online() {
        println!("⚠️  Offline, nothing replayed");
        return Ok(());
    }

    let report = coordinator.replay().await?;

    println!(
        "✅ Replayed {} operation(s): {} synced, {} failed, {} dead-lettered",
        report.attempted, report.synced, report.failed, report.dead_lettered
    );

    Ok(())
}

async fn handle_discard(state: &SyncState, yes: bool) -> Result<()> {
    let dead = state.queue.list_dead_lettered().await?;
    if dead.is_empty() {
        println!("No dead-lettered operations");
        return Ok(());
    }

    let confirmed = yes
        || Confirm::new()
            .with_prompt(format!(
                "Permanently delete {} dead-lettered operation(s)?",
                dead.len()
            ))
            .default(false)
            .interact()
            .context("Failed to read confirmation")?;

    if !confirmed {
        println!("Aborted");
        return Ok(());
    }

    let discarded = state.queue.discard_dead_lettered().await?;
    println!("✅ Discarded {discarded} dead-lettered operation(s)");

    Ok(())
}

async fn handle_watch(state: &SyncState) -> Result<()> {
    let coordinator = state.coordinator()?;
    let worker = SyncWorker::new(coordinator.clone()).spawn();

    println!("👀 Watching. Type `online` or `offline` to change connectivity, Ctrl-C to stop.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                break;
            }
            line = lines.next_line() => match line? {
                Some(line) => match line.trim() {
                    "online" => {
                        coordinator.connectivity().set_online(true);
                    }
                    "offline" => {
                        coordinator.connectivity().set_online(false);
                    }
                    "" => {}
                    other => eprintln!("Unknown input '{other}', expected `online` or `offline`"),
                },
                // stdin closed; keep running until Ctrl-C
                None => {
                    tokio::signal::ctrl_c()
                        .await
                        .context("Failed to listen for Ctrl-C")?;
                    break;
                }
            },
        }
    }

    worker.shutdown().await;
    println!("👋 Stopped");

    Ok(())
}

/// Parses `column=value` into an equality filter.
fn parse_filter(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((column, value)) if !column.trim().is_empty() => {
            Ok((column.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected column=value, got '{raw}'")),
    }
}

fn print_operations(operations: &[QueuedOperation], empty_message: &str) {
    if operations.is_empty() {
        println!("{empty_message}");
        return;
    }

    for op in operations {
        println!(
            "{:>6}  {}  {:<10} {:<6} attempts={} created={}",
            op.sequence,
            op.id,
            op.collection.store_name(),
            op.kind.as_str(),
            op.attempts,
            op.created_at.to_rfc3339()
        );
        if let Some(error) = &op.last_error {
            println!("        last error: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_filter() {
        assert_eq!(
            parse_filter("class=5A"),
            Ok(("class".to_string(), "5A".to_string()))
        );
        assert_eq!(
            parse_filter("note=a=b"),
            Ok(("note".to_string(), "a=b".to_string()))
        );
        assert!(parse_filter("class").is_err());
        assert!(parse_filter("=5A").is_err());
    }

    #[test]
    fn test_fetch_accepts_table_names() {
        let cli = Cli::try_parse_from([
            "talebedu-sync",
            "--offline",
            "fetch",
            "student_fees",
            "--eq",
            "status=pending",
        ])
        .unwrap();

        assert!(cli.offline);
        match cli.command {
            Commands::Fetch {
                collection,
                filters,
                ..
            } => {
                assert_eq!(collection, Collection::Fees);
                assert_eq!(filters, vec![("status".to_string(), "pending".to_string())]);
            }
            _ => panic!("expected fetch"),
        }
    }
}
