//! Ledger implementation
//!
//! The ledger owns the local chain and the pool of pending transactions.
//! It is the only place either is mutated.

use crate::consensus::{ConsensusResolver, ProofOfWork};
use crate::core::block::{Block, ChainSnapshot};
use crate::core::transaction::Transaction;
use crate::crypto::hash_block;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

/// Ledger shared between the API, the miner and chain sync
pub type SharedLedger = Arc<RwLock<Ledger>>;

/// The local chain plus its pending-transaction pool
#[derive(Debug, Clone)]
pub struct Ledger {
    /// The chain of blocks; never empty
    chain: Vec<Block>,
    /// Transactions waiting for the next block
    current_transactions: Vec<Transaction>,
    /// Puzzle used when mining locally
    pow: ProofOfWork,
}

/// Current time as fractional seconds since the Unix epoch
fn now_seconds() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

impl Ledger {
    /// Create a new ledger holding only the genesis block
    pub fn new() -> Self {
        Self::with_pow(ProofOfWork::default())
    }

    /// Create a ledger that mines with a custom puzzle difficulty
    pub fn with_pow(pow: ProofOfWork) -> Self {
        Self {
            chain: vec![Block::genesis()],
            current_transactions: Vec::new(),
            pow,
        }
    }

    pub fn into_shared(self) -> SharedLedger {
        Arc::new(RwLock::new(self))
    }

    pub fn pow(&self) -> ProofOfWork {
        self.pow
    }

    /// Queue a transaction for the next block.
    ///
    /// Returns the index of the block that will hold it.
    pub fn new_transaction(&mut self, sender: &str, recipient: &str, amount: u64) -> u64 {
        self.current_transactions
            .push(Transaction::new(sender, recipient, amount));

        self.last_block().index + 1
    }

    /// Seal all pending transactions into a new block and append it
    pub fn new_block(&mut self, proof: u64, previous_hash: Option<String>) -> Block {
        let previous_hash = previous_hash.unwrap_or_else(|| hash_block(self.last_block()));

        let block = Block {
            index: self.chain.len() as u64 + 1,
            timestamp: now_seconds(),
            transactions: std::mem::take(&mut self.current_transactions),
            proof,
            previous_hash,
        };

        self.chain.push(block.clone());
        block
    }

    /// Get the latest block
    pub fn last_block(&self) -> &Block {
        // Constructors seed the genesis block and replacement chains are
        // validated, which rejects empty chains
        &self.chain[self.chain.len() - 1]
    }

    /// Mine and seal the next block synchronously on the calling thread.
    ///
    /// Returns `None` only if the proof space is exhausted.
    pub fn mine_block(&mut self) -> Option<Block> {
        let proof = self
            .pow
            .proof_of_work(self.last_block(), &CancellationToken::new())?;
        Some(self.new_block(proof, None))
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn pending_transactions(&self) -> &[Transaction] {
        &self.current_transactions
    }

    /// Copy of the chain in its wire shape
    pub fn snapshot(&self) -> ChainSnapshot {
        ChainSnapshot::new(self.chain.clone())
    }

    /// Run the resolver against `peers` and install the chain it selects.
    ///
    /// Returns whether the local chain was replaced.
    pub fn resolve_conflicts(
        &mut self,
        resolver: &ConsensusResolver,
        peers: Vec<ChainSnapshot>,
    ) -> bool {
        let local = std::mem::take(&mut self.chain);
        let resolution = resolver.resolve(local, peers);
        self.chain = resolution.chain;

        if resolution.adopted {
            log::info!(
                "Chain replaced by peer chain of {} blocks (tip {})",
                self.chain.len(),
                hash_block(self.last_block())
            );
        }

        resolution.adopted
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
