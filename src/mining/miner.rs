//! Mining engine for the ledger
//!
//! Mining snapshots the tip under a read lock, searches for a proof on the
//! blocking pool with the lock released, then re-takes the write lock and
//! seals the block only if the tip is unchanged.

use crate::core::{Block, Ledger, SharedLedger, Transaction};
use crate::crypto::hash_block;
use log::{debug, info};
use std::time::Instant;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Mining errors
#[derive(Error, Debug)]
pub enum MiningError {
    #[error("Mining task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
    #[error("Proof space exhausted for block {0}")]
    Exhausted(u64),
}

/// Mining statistics
#[derive(Debug, Clone)]
pub struct MiningStats {
    /// Number of hash attempts
    pub hash_attempts: u64,
    /// Time taken in milliseconds
    pub time_ms: u128,
    /// Hash rate (hashes per second)
    pub hash_rate: f64,
}

/// Result of a mining attempt
#[derive(Debug, Clone)]
pub enum MineOutcome {
    /// The block was sealed onto the local chain
    Mined { block: Block, stats: MiningStats },
    /// The search was preempted before a proof was found
    Cancelled,
    /// A proof was found but the tip moved meanwhile; the work was discarded
    Stale,
}

/// Preemption handle shared by the miner and chain sync.
///
/// Every mining job holds a child of the current token. [`Self::preempt`]
/// cancels them all and arms a fresh token for later jobs.
#[derive(Debug, Default)]
pub struct MiningControl {
    current: Mutex<CancellationToken>,
}

impl MiningControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token for a new mining job
    pub async fn token(&self) -> CancellationToken {
        self.current.lock().await.child_token()
    }

    /// Cancel all in-flight mining jobs
    pub async fn preempt(&self) {
        let mut current = self.current.lock().await;
        current.cancel();
        *current = CancellationToken::new();
        debug!("In-flight mining preempted");
    }
}

/// Miner for creating new blocks
pub struct Miner {
    /// Node identifier credited with the mining reward
    pub address: String,
}

impl Miner {
    /// Create a new miner
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
        }
    }

    /// Mine the next block on the shared ledger
    pub async fn mine(
        &self,
        ledger: &SharedLedger,
        control: &MiningControl,
    ) -> Result<MineOutcome, MiningError> {
        let (last_block, pow) = {
            let ledger = ledger.read().await;
            (ledger.last_block().clone(), ledger.pow())
        };
        let last_hash = hash_block(&last_block);
        let cancel = control.token().await;
        let job_cancel = cancel.clone();

        info!(
            "Mining block {} with difficulty {}...",
            last_block.index + 1,
            pow.difficulty()
        );

        let start = Instant::now();
        let search_hash = last_hash.clone();
        let last_proof = last_block.proof;
        let found =
            tokio::task::spawn_blocking(move || pow.mine(last_proof, &search_hash, &job_cancel))
                .await?;

        let Some((proof, attempts)) = found else {
            if !cancel.is_cancelled() {
                return Err(MiningError::Exhausted(last_block.index + 1));
            }
            debug!("Mining of block {} cancelled", last_block.index + 1);
            return Ok(MineOutcome::Cancelled);
        };

        let stats = Self::stats(attempts, start);

        let mut ledger = ledger.write().await;
        if hash_block(ledger.last_block()) != last_hash {
            info!(
                "Discarding proof for block {}: chain tip changed while mining",
                last_block.index + 1
            );
            return Ok(MineOutcome::Stale);
        }

        // Reward goes in with the rest of the pool
        let reward = Transaction::reward(&self.address);
        ledger.new_transaction(&reward.sender, &reward.recipient, reward.amount);
        let block = ledger.new_block(proof, Some(last_hash));

        info!(
            "Block {} mined in {}ms ({} attempts, {:.2} H/s)",
            block.index, stats.time_ms, stats.hash_attempts, stats.hash_rate
        );

        Ok(MineOutcome::Mined { block, stats })
    }

    /// Mine `count` blocks one after another on an unshared ledger
    pub fn mine_continuously(&self, ledger: &mut Ledger, count: u64) -> Vec<(Block, MiningStats)> {
        let mut results = Vec::new();

        for _ in 0..count {
            let start = Instant::now();
            let last_hash = hash_block(ledger.last_block());
            let last_proof = ledger.last_block().proof;

            let Some((proof, attempts)) =
                ledger.pow().mine(last_proof, &last_hash, &CancellationToken::new())
            else {
                break;
            };

            let reward = Transaction::reward(&self.address);
            ledger.new_transaction(&reward.sender, &reward.recipient, reward.amount);
            let block = ledger.new_block(proof, Some(last_hash));
            results.push((block, Self::stats(attempts, start)));
        }

        results
    }

    fn stats(attempts: u64, start: Instant) -> MiningStats {
        let elapsed = start.elapsed().as_millis();
        let hash_rate = if elapsed > 0 {
            (attempts as f64) / (elapsed as f64 / 1000.0)
        } else {
            attempts as f64
        };

        MiningStats {
            hash_attempts: attempts,
            time_ms: elapsed,
            hash_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::{ChainValidator, ProofOfWork, MAX_DIFFICULTY};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_miner_seals_block_with_reward() {
        let pow = ProofOfWork::new(2);
        let ledger = Ledger::with_pow(pow).into_shared();
        ledger.write().await.new_transaction("A", "B", 5);

        let miner = Miner::new("node-1");
        let control = MiningControl::new();

        let outcome = miner.mine(&ledger, &control).await.unwrap();
        let MineOutcome::Mined { block, stats } = outcome else {
            panic!("expected a mined block");
        };

        assert_eq!(block.index, 2);
        assert!(stats.hash_attempts > 0);
        assert_eq!(block.transactions.len(), 2);
        assert_eq!(block.transactions[0], Transaction::new("A", "B", 5));
        assert_eq!(block.transactions[1], Transaction::reward("node-1"));

        let ledger = ledger.read().await;
        assert!(ledger.pending_transactions().is_empty());
        assert!(ChainValidator::new(pow).is_valid(ledger.chain()));
    }

    #[tokio::test]
    async fn test_preempt_cancels_mining() {
        // Unreachable difficulty: only preemption can end the search
        let ledger = Ledger::with_pow(ProofOfWork::new(MAX_DIFFICULTY)).into_shared();
        let control = Arc::new(MiningControl::new());
        let miner = Miner::new("node-1");

        let job = {
            let ledger = ledger.clone();
            let control = control.clone();
            tokio::spawn(async move { miner.mine(&ledger, &control).await })
        };

        // Keep preempting until the job has picked up a token and stopped
        let outcome = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                control.preempt().await;
                if job.is_finished() {
                    break job.await;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .unwrap()
        .unwrap()
        .unwrap();
        assert!(matches!(outcome, MineOutcome::Cancelled));
        assert_eq!(ledger.read().await.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_proof_for_moved_tip_is_discarded() {
        let pow = ProofOfWork::new(4);
        let validator = ChainValidator::new(pow);
        let control = Arc::new(MiningControl::new());

        // The miner can occasionally finish before the rival block lands
        for _ in 0..5 {
            let ledger = Ledger::with_pow(pow).into_shared();
            let job = {
                let ledger = ledger.clone();
                let control = control.clone();
                let miner = Miner::new("slow-node");
                tokio::spawn(async move { miner.mine(&ledger, &control).await })
            };

            // Let the miner snapshot genesis, then seal a rival block on it
            tokio::time::sleep(Duration::from_millis(5)).await;
            let rival = {
                let mut ledger = ledger.write().await;
                ledger.new_transaction("A", "B", 5);
                ledger.mine_block().unwrap()
            };

            let outcome = job.await.unwrap().unwrap();
            let ledger = ledger.read().await;
            assert!(validator.is_valid(ledger.chain()));

            match outcome {
                MineOutcome::Stale => {
                    assert_eq!(ledger.len(), 2);
                    assert_eq!(ledger.last_block(), &rival);
                    assert!(!ledger
                        .chain()
                        .iter()
                        .flat_map(|b| &b.transactions)
                        .any(|tx| tx.recipient == "slow-node"));
                    return;
                }
                MineOutcome::Mined { .. } => continue,
                MineOutcome::Cancelled => panic!("mining was never preempted"),
            }
        }

        panic!("miner never raced a moved tip");
    }

    #[tokio::test]
    async fn test_control_rearms_after_preempt() {
        let control = MiningControl::new();
        let before = control.token().await;

        control.preempt().await;
        let after = control.token().await;

        assert!(before.is_cancelled());
        assert!(!after.is_cancelled());
    }

    #[test]
    fn test_mine_multiple_blocks() {
        let pow = ProofOfWork::new(2);
        let mut ledger = Ledger::with_pow(pow);
        let miner = Miner::new("miner_address");

        let results = miner.mine_continuously(&mut ledger, 3);

        assert_eq!(results.len(), 3);
        assert_eq!(ledger.len(), 4);
        assert!(results
            .iter()
            .all(|(block, _)| block.transactions == vec![Transaction::reward("miner_address")]));
        assert!(ChainValidator::new(pow).is_valid(ledger.chain()));
    }
}
