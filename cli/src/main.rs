//! ChainMirror CLI — run the mirror and inspect what it has cached.
//!
//! # Commands
//! ```
//! chainmirror run    --node-url <URL> [--db <PATH>] [--once]
//! chainmirror status [--db <PATH>]
//! chainmirror reset  [--db <PATH>] --yes
//! chainmirror query block     <HASH>
//! chainmirror query directory [<HASH>] [--height N] [--range LO HI] [--latest N]
//! chainmirror query entry     <HASH>
//! chainmirror query chain     <NAME> [--offset N] [--limit N]
//! chainmirror query search    <NEEDLE>
//! chainmirror query address   <ADDRESS> --node-url <URL>
//! ```

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use chainmirror_codec::WireCodec;
use chainmirror_core::{BlockCache, CacheStore, LedgerQuery};
use chainmirror_node::{lookup_address, HttpLedgerClient};
use chainmirror_storage::{MemoryBackend, SqliteStore};
use chainmirror_sync::{SyncConfig, SyncEngine, SyncError, DEFAULT_ANCHOR_CHAIN_ID};

#[derive(Parser)]
#[command(
    name = "chainmirror",
    about = "Mirror a remote ledger node into a local queryable cache",
    long_about = "
ChainMirror: fetch a backward-linked block chain from a remote node,
reconstruct its forward links and supply tally, and serve the result from
a local cache.

ENVIRONMENT VARIABLES:
  CHAINMIRROR_NODE_URL   Base URL of the remote ledger node
  CHAINMIRROR_DB         SQLite database path for the cache
  RUST_LOG               Log filter (default: info)
",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Store selection shared by every subcommand that touches the cache.
#[derive(Args)]
struct StoreArgs {
    /// SQLite database path; omit for a fresh in-memory store
    #[arg(long, env = "CHAINMIRROR_DB")]
    db: Option<String>,
}

impl StoreArgs {
    async fn open(&self) -> Result<CacheStore> {
        match &self.db {
            Some(path) => {
                let store = SqliteStore::open(path)
                    .await
                    .with_context(|| format!("open database '{path}'"))?;
                Ok(CacheStore::new(Arc::new(store)))
            }
            None => Ok(CacheStore::new(Arc::new(MemoryBackend::new()))),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run synchronization cycles until interrupted
    Run {
        /// Base URL of the remote ledger node
        #[arg(long, env = "CHAINMIRROR_NODE_URL")]
        node_url: String,
        #[command(flatten)]
        store: StoreArgs,
        /// Chain whose entries are decoded as anchor attestations
        #[arg(long, default_value = DEFAULT_ANCHOR_CHAIN_ID)]
        anchor_chain: String,
        /// Seconds to sleep between cycles
        #[arg(long, default_value_t = 5)]
        interval_secs: u64,
        /// Run a single cycle and exit
        #[arg(long)]
        once: bool,
    },

    /// Print the persisted synchronization progress as JSON
    Status {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// Clear every cache bucket
    Reset {
        #[command(flatten)]
        store: StoreArgs,
        /// Confirm the wipe
        #[arg(long)]
        yes: bool,
    },

    /// Read mirrored records as pretty JSON
    Query {
        #[command(flatten)]
        store: StoreArgs,
        #[command(subcommand)]
        what: QueryCommands,
    },
}

#[derive(Subcommand)]
enum QueryCommands {
    /// A chain block by either of its hashes
    Block { hash: String },

    /// Directory records by hash, height, range or recency
    Directory {
        /// Directory block hash
        hash: Option<String>,
        /// A single height
        #[arg(long)]
        height: Option<u64>,
        /// Inclusive height bounds, e.g. --range 10 20
        #[arg(long, num_args = 2, value_names = ["LO", "HI"])]
        range: Option<Vec<u64>>,
        /// The newest N records
        #[arg(long)]
        latest: Option<u64>,
    },

    /// An entry by hash
    Entry { hash: String },

    /// A chain by registered name or id, with paged entries
    Chain {
        name: String,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        /// 0 means unpaged
        #[arg(long, default_value_t = 0)]
        limit: usize,
    },

    /// Entries whose external ids contain a substring
    Search { needle: String },

    /// Classify an address by its balances on the remote node
    Address {
        address: String,
        #[arg(long, env = "CHAINMIRROR_NODE_URL")]
        node_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            node_url,
            store,
            anchor_chain,
            interval_secs,
            once,
        } => cmd_run(&node_url, &store, anchor_chain, interval_secs, once).await,

        Commands::Status { store } => cmd_status(&store).await,

        Commands::Reset { store, yes } => cmd_reset(&store, yes).await,

        Commands::Query { store, what } => cmd_query(&store, what).await,
    }
}

// ─── Command implementations ──────────────────────────────────────────────────

async fn cmd_run(
    node_url: &str,
    store: &StoreArgs,
    anchor_chain: String,
    interval_secs: u64,
    once: bool,
) -> Result<()> {
    let cache = BlockCache::new(store.open().await?, anchor_chain.clone());
    let client = HttpLedgerClient::default_for(node_url);
    let config = SyncConfig {
        anchor_chain_id: anchor_chain,
        poll_interval_ms: interval_secs.saturating_mul(1000),
    };
    let mut engine = SyncEngine::new(client, cache, Arc::new(WireCodec::new()), config);

    let stop = engine.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, stopping after the unit in flight");
            stop.stop();
        }
    });

    if once {
        match engine.run_cycle().await {
            Ok(()) | Err(SyncError::Stopped) => Ok(()),
            Err(err) => Err(err.into()),
        }
    } else {
        engine.run().await.map_err(Into::into)
    }
}

async fn cmd_status(store: &StoreArgs) -> Result<()> {
    let cache = BlockCache::new(store.open().await?, DEFAULT_ANCHOR_CHAIN_ID);
    print_json(&cache.progress().await?)
}

async fn cmd_reset(store: &StoreArgs, yes: bool) -> Result<()> {
    if !yes {
        bail!("refusing to clear the cache without --yes");
    }
    store.open().await?.reset().await?;
    println!("Cache cleared.");
    Ok(())
}

async fn cmd_query(store: &StoreArgs, what: QueryCommands) -> Result<()> {
    let cache = BlockCache::new(store.open().await?, DEFAULT_ANCHOR_CHAIN_ID);
    let query = LedgerQuery::new(cache);

    match what {
        QueryCommands::Block { hash } => print_found(query.block_by_hash(&hash).await?),

        QueryCommands::Directory {
            hash,
            height,
            range,
            latest,
        } => {
            if let Some(hash) = hash {
                print_found(query.directory_by_hash(&hash).await?)
            } else if let Some(height) = height {
                print_found(query.directory_by_height(height).await?)
            } else if let Some(bounds) = range {
                print_json(&query.directory_range(bounds[0], bounds[1]).await?)
            } else if let Some(count) = latest {
                print_json(&query.latest_directories(count).await?)
            } else {
                bail!("pass a hash, --height, --range or --latest");
            }
        }

        QueryCommands::Entry { hash } => print_found(query.entry_by_hash(&hash).await?),

        QueryCommands::Chain {
            name,
            offset,
            limit,
        } => print_found(query.chain_by_name(&name, offset, limit).await?),

        QueryCommands::Search { needle } => {
            print_json(&query.entries_by_external_id(&needle).await?)
        }

        QueryCommands::Address { address, node_url } => {
            let client = HttpLedgerClient::default_for(node_url);
            print_json(&lookup_address(&client, &address).await?)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_found<T: Serialize>(value: Option<T>) -> Result<()> {
    match value {
        Some(record) => print_json(&record),
        None => bail!("no matching record in the cache"),
    }
}
