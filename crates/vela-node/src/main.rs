//! Vela Node - Ledger bootstrap binary.
//!
//! Opens the versioned substrate, seeds the genesis block on a fresh data
//! directory and reports the resulting ledger state. Network, RPC and
//! forging run in the enclosing services; this binary is the state
//! engine's front door.

mod config;
mod telemetry;

use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use vela_consensus::{Block, ForgerFees};
use vela_state::LedgerState;
use vela_storage::VersionedDb;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "vela-node")]
#[command(about = "Vela ledger state engine")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Config file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Data directory
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load or create config
    let mut config = match &args.config {
        Some(path) => config::NodeConfig::from_file(path)?,
        None => config::NodeConfig::default(),
    };
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }
    config.validate()?;

    telemetry::init_telemetry(&args.log_level, config.logging.json)?;
    info!(name = %config.name, data_dir = %config.data_dir.display(), "starting");

    let db = VersionedDb::open(&config.data_dir.join("state"))?;
    let ledger = LedgerState::open(db)?;

    if ledger.state_height()? == 0 && !config.genesis.is_empty() {
        let allocations: Vec<_> = config
            .genesis
            .iter()
            .map(|alloc| (alloc.address, alloc.amount))
            .collect();
        let genesis = Block::genesis(&allocations, config.genesis_timestamp);
        ledger.process_block(&genesis, &ForgerFees)?;
        info!(accounts = allocations.len(), "genesis block applied");
    }

    info!(
        height = ledger.state_height()?,
        version = ledger.store_version(),
        state_hash = %format!("{:016x}", ledger.state_hash()?),
        "ledger ready"
    );

    Ok(())
}
