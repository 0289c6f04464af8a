//! Pow-Ledger: a replicated proof-of-work ledger in Rust
//!
//! This crate provides a small ledger node featuring:
//! - Canonical, key-sorted SHA-256 block hashing
//! - Proof of Work with a fixed difficulty and cancellable search
//! - Whole-chain validation (hash links + puzzle)
//! - Longest-valid-chain consensus across peers
//! - Concurrent, time-bounded peer chain fetching
//! - REST API for transactions, mining and peer management
//!
//! # Example
//!
//! ```rust
//! use pow_ledger::consensus::{ChainValidator, ProofOfWork};
//! use pow_ledger::core::Ledger;
//!
//! let pow = ProofOfWork::new(2);
//! let mut ledger = Ledger::with_pow(pow);
//!
//! ledger.new_transaction("alice", "bob", 5);
//! let block = ledger.mine_block().unwrap();
//!
//! assert_eq!(block.index, 2);
//! assert!(ChainValidator::new(pow).is_valid(ledger.chain()));
//! ```

pub mod api;
pub mod cli;
pub mod consensus;
pub mod core;
pub mod crypto;
pub mod mining;
pub mod network;

// Re-export commonly used types
pub use api::{create_router, ApiState};
pub use consensus::{ChainValidator, ConsensusResolver, ProofOfWork, Resolution, DEFAULT_DIFFICULTY};
pub use crate::core::{Block, ChainSnapshot, Ledger, SharedLedger, Transaction};
pub use crypto::hash_block;
pub use mining::{MineOutcome, Miner, MiningControl};
pub use network::{ChainFetcher, ChainSync, HttpChainFetcher, Node, NodeConfig, NodeRegistry};
