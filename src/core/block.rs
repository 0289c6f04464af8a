//! Block implementation for the ledger
//!
//! A block seals a batch of transactions together with the proof that was
//! found for it and the canonical hash of its predecessor.

use crate::core::transaction::Transaction;
use crate::crypto::hash_block;
use serde::{Deserialize, Serialize};

// =============================================================================
// Genesis Constants
// =============================================================================

/// Proof stored in the genesis block
pub const GENESIS_PROOF: u64 = 100;

/// Sentinel `previous_hash` of the genesis block
pub const GENESIS_PREVIOUS_HASH: &str = "1";

/// Timestamp of the genesis block. Fixed so every node seals the same bytes.
pub const GENESIS_TIMESTAMP: f64 = 0.0;

/// A block in the chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// 1-based position in the chain
    pub index: u64,
    /// Seconds since the Unix epoch
    pub timestamp: f64,
    /// Transactions in submission order
    pub transactions: Vec<Transaction>,
    /// Proof-of-work answer for this block
    pub proof: u64,
    /// Canonical hash of the preceding block
    pub previous_hash: String,
}

impl Block {
    /// Create the genesis block
    pub fn genesis() -> Self {
        Self {
            index: 1,
            timestamp: GENESIS_TIMESTAMP,
            transactions: Vec::new(),
            proof: GENESIS_PROOF,
            previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
        }
    }

    /// Canonical hash of this block
    pub fn hash(&self) -> String {
        hash_block(self)
    }

    /// Whether this is exactly the shared genesis block
    pub fn is_genesis(&self) -> bool {
        *self == Self::genesis()
    }

    /// Get number of transactions in this block
    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }
}

/// A chain together with its advertised length, as served to peers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub chain: Vec<Block>,
    pub length: usize,
}

impl ChainSnapshot {
    pub fn new(chain: Vec<Block>) -> Self {
        let length = chain.len();
        Self { chain, length }
    }

    /// Whether the advertised length matches the blocks actually carried
    pub fn is_consistent(&self) -> bool {
        self.length == self.chain.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_block() {
        let genesis = Block::genesis();
        assert_eq!(genesis.index, 1);
        assert_eq!(genesis.proof, GENESIS_PROOF);
        assert_eq!(genesis.previous_hash, GENESIS_PREVIOUS_HASH);
        assert!(genesis.transactions.is_empty());
        assert!(genesis.is_genesis());
    }

    #[test]
    fn test_lookalike_root_is_not_genesis() {
        let mut root = Block::genesis();
        root.proof = 999;
        assert!(!root.is_genesis());

        let mut root = Block::genesis();
        root.index = 42;
        assert!(!root.is_genesis());
    }

    #[test]
    fn test_genesis_hash_stable() {
        assert_eq!(Block::genesis().hash(), Block::genesis().hash());
    }

    #[test]
    fn test_snapshot_consistency() {
        let mut snapshot = ChainSnapshot::new(vec![Block::genesis()]);
        assert!(snapshot.is_consistent());

        snapshot.length = 7;
        assert!(!snapshot.is_consistent());
    }

    #[test]
    fn test_snapshot_wire_shape() {
        let json = serde_json::to_value(ChainSnapshot::new(vec![Block::genesis()])).unwrap();
        assert_eq!(json["length"], 1);
        assert_eq!(json["chain"][0]["previous_hash"], "1");
        assert_eq!(json["chain"][0]["proof"], 100);
    }
}
