//! Proof-of-work puzzle
//!
//! A proof `p` is valid for a predecessor with proof `lp` and hash `lh` when
//! `sha256(format!("{lp}{p}{lh}"))` starts with `difficulty` zero hex digits.

use crate::core::Block;
use crate::crypto::{hash_block, sha256_hex};
use tokio_util::sync::CancellationToken;

/// Default number of leading zero hex digits a proof digest must have
pub const DEFAULT_DIFFICULTY: usize = 4;

/// Upper bound on difficulty; a SHA-256 hex digest has 64 characters
pub const MAX_DIFFICULTY: usize = 64;

/// The puzzle, parameterised by a static difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofOfWork {
    difficulty: usize,
}

impl ProofOfWork {
    /// Create a puzzle requiring `difficulty` leading zero hex digits
    pub fn new(difficulty: usize) -> Self {
        Self {
            difficulty: difficulty.min(MAX_DIFFICULTY),
        }
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    /// Check a proof against the previous block's proof and hash
    pub fn valid_proof(&self, last_proof: u64, proof: u64, last_hash: &str) -> bool {
        let guess = format!("{}{}{}", last_proof, proof, last_hash);
        let digest = sha256_hex(guess.as_bytes());
        digest.bytes().take(self.difficulty).all(|b| b == b'0')
    }

    /// Search for a proof, starting at 0, until one satisfies [`Self::valid_proof`].
    ///
    /// The token is polled between attempts; returns `None` once it is
    /// cancelled. Without cancellation the search is unbounded.
    pub fn mine(
        &self,
        last_proof: u64,
        last_hash: &str,
        cancel: &CancellationToken,
    ) -> Option<(u64, u64)> {
        let mut proof = 0u64;
        let mut attempts = 0u64;

        loop {
            if cancel.is_cancelled() {
                return None;
            }

            attempts += 1;
            if self.valid_proof(last_proof, proof, last_hash) {
                return Some((proof, attempts));
            }

            proof = proof.checked_add(1)?;
        }
    }

    /// Find the proof for the block following `last_block`
    pub fn proof_of_work(&self, last_block: &Block, cancel: &CancellationToken) -> Option<u64> {
        let last_hash = hash_block(last_block);
        self.mine(last_block.proof, &last_hash, cancel)
            .map(|(proof, _)| proof)
    }
}

impl Default for ProofOfWork {
    fn default() -> Self {
        Self::new(DEFAULT_DIFFICULTY)
    }
}
