//! Ledger node CLI application
//!
//! Runs a proof-of-work ledger node, or mines and validates chains offline.

use clap::{Parser, Subcommand};
use pow_ledger::cli;
use pow_ledger::consensus::DEFAULT_DIFFICULTY;
use pow_ledger::network::{generate_node_id, NodeConfig};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "ledger")]
#[command(version = "0.1.0")]
#[command(about = "A proof-of-work ledger node with longest-chain consensus", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Node operations
    Node {
        #[command(subcommand)]
        action: NodeCommands,
    },

    /// Mine blocks into a fresh in-memory ledger
    Mine {
        /// Address credited with the mining reward
        #[arg(short, long, default_value = "miner")]
        address: String,

        /// Number of blocks to mine
        #[arg(short, long, default_value = "1")]
        count: u64,

        /// Leading zero hex digits required of a proof
        #[arg(short, long, default_value_t = DEFAULT_DIFFICULTY)]
        difficulty: usize,

        /// Write the resulting chain to this file as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a chain stored as JSON
    Validate {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Leading zero hex digits required of a proof
        #[arg(short, long, default_value_t = DEFAULT_DIFFICULTY)]
        difficulty: usize,
    },
}

#[derive(Subcommand)]
enum NodeCommands {
    /// Start the node and its REST API
    Start {
        /// Port to listen on
        #[arg(short, long, default_value = "5000")]
        port: u16,

        /// Peers to register at startup (comma-separated)
        #[arg(long)]
        peers: Option<String>,

        /// Leading zero hex digits required of a proof
        #[arg(short, long, default_value_t = DEFAULT_DIFFICULTY)]
        difficulty: usize,

        /// Seconds to wait for a single peer's chain
        #[arg(long, default_value = "5")]
        peer_timeout_secs: u64,

        /// Resolve conflicts with peers every N seconds
        #[arg(long)]
        resolve_interval_secs: Option<u64>,

        /// Identifier credited with mining rewards (random if omitted)
        #[arg(long)]
        node_id: Option<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Node {
            action:
                NodeCommands::Start {
                    port,
                    peers,
                    difficulty,
                    peer_timeout_secs,
                    resolve_interval_secs,
                    node_id,
                },
        } => {
            let bootstrap_peers: Vec<String> = peers
                .map(|p| {
                    p.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default();

            let config = NodeConfig {
                port,
                bootstrap_peers,
                difficulty,
                peer_timeout: Duration::from_secs(peer_timeout_secs),
                resolve_interval: resolve_interval_secs.map(Duration::from_secs),
                node_id: node_id.unwrap_or_else(generate_node_id),
            };

            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(async {
                tokio::select! {
                    result = cli::cmd_node_start(config) => result,
                    _ = tokio::signal::ctrl_c() => {
                        println!("\n📴 Shutting down node...");
                        Ok(())
                    }
                }
            })?;
        }

        Commands::Mine {
            address,
            count,
            difficulty,
            output,
        } => {
            cli::cmd_mine(&address, count, difficulty, output.as_deref())?;
        }

        Commands::Validate { input, difficulty } => {
            if !cli::cmd_validate(&input, difficulty)? {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
