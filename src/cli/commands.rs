//! CLI commands for the ledger
//!
//! Implements the command handlers behind the `ledger` binary.

use crate::consensus::{ChainValidator, ProofOfWork};
use crate::core::{ChainSnapshot, Ledger};
use crate::mining::Miner;
use crate::network::{Node, NodeConfig};
use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Start a node and serve until interrupted
pub async fn cmd_node_start(config: NodeConfig) -> CliResult<()> {
    println!("🌐 Starting ledger node on port {}...", config.port);
    println!("   🆔 Node id: {}", config.node_id);
    println!("   🔧 Difficulty: {}", config.difficulty);

    let node = Node::new(config)?;
    node.start().await.map_err(|e| -> Box<dyn std::error::Error> { e })?;
    Ok(())
}

/// Mine blocks into a fresh in-memory ledger, optionally exporting the chain
pub fn cmd_mine(
    address: &str,
    count: u64,
    difficulty: usize,
    output: Option<&Path>,
) -> CliResult<()> {
    let mut ledger = Ledger::with_pow(ProofOfWork::new(difficulty));
    let miner = Miner::new(address);

    println!("⛏️  Mining {} block(s) for address: {}", count, address);
    println!("   Difficulty: {}", difficulty);

    for (block, stats) in miner.mine_continuously(&mut ledger, count) {
        println!("\n   Block {} mined!", block.index);
        println!("   ├─ Hash: {}", &block.hash()[..16]);
        println!("   ├─ Proof: {}", block.proof);
        println!("   ├─ Transactions: {}", block.tx_count());
        println!("   ├─ Time: {}ms", stats.time_ms);
        println!("   └─ Hash rate: {:.2} H/s", stats.hash_rate);
    }

    if let Some(path) = output {
        let file = fs::File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), &ledger.snapshot())?;
        println!("\n💾 Chain of {} blocks written to {:?}", ledger.len(), path);
    }

    Ok(())
}

/// Validate a chain exported from `/chain` or `mine --output`
pub fn cmd_validate(input: &Path, difficulty: usize) -> CliResult<bool> {
    let file = fs::File::open(input)?;
    let snapshot: ChainSnapshot = serde_json::from_reader(BufReader::new(file))?;

    println!("🔍 Validating chain from {:?}...", input);

    let validator = ChainValidator::new(ProofOfWork::new(difficulty));
    let valid = match validator.validate(&snapshot.chain) {
        Ok(()) => {
            println!("✅ Chain is valid!");
            println!("   {} blocks verified", snapshot.chain.len());
            true
        }
        Err(e) => {
            println!("❌ Chain validation FAILED!");
            println!("   {}", e);
            false
        }
    };

    if !snapshot.is_consistent() {
        println!(
            "⚠️  Advertised length {} does not match {} blocks",
            snapshot.length,
            snapshot.chain.len()
        );
    }

    Ok(valid)
}
