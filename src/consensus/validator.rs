//! Whole-chain verification
//!
//! A chain is valid when it is rooted at the shared genesis block, every
//! block's index is its 1-based position, and every later block links to the
//! canonical hash of its predecessor with a proof that solves the puzzle
//! posed by that predecessor.

use crate::consensus::pow::ProofOfWork;
use crate::core::Block;
use crate::crypto::hash_block;
use thiserror::Error;

/// Reasons a candidate chain is rejected
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ChainError {
    #[error("Chain is empty")]
    Empty,
    #[error("Chain is not rooted at the genesis block")]
    ForeignGenesis,
    #[error("Block at position {position} claims index {index}")]
    MisplacedIndex { position: u64, index: u64 },
    #[error("Block {index}: previous hash does not match predecessor")]
    BrokenLink { index: u64 },
    #[error("Block {index}: invalid proof of work")]
    InvalidProof { index: u64 },
}

/// Verifies hash linkage and proof-of-work across a chain
#[derive(Debug, Clone, Copy, Default)]
pub struct ChainValidator {
    pow: ProofOfWork,
}

impl ChainValidator {
    pub fn new(pow: ProofOfWork) -> Self {
        Self { pow }
    }

    /// Walk the chain, stopping at the first broken pair
    pub fn validate(&self, chain: &[Block]) -> Result<(), ChainError> {
        let (first, rest) = chain.split_first().ok_or(ChainError::Empty)?;

        if !first.is_genesis() {
            return Err(ChainError::ForeignGenesis);
        }

        let mut last_block = first;
        for (position, block) in (2u64..).zip(rest) {
            if block.index != position {
                return Err(ChainError::MisplacedIndex {
                    position,
                    index: block.index,
                });
            }

            let last_hash = hash_block(last_block);

            if block.previous_hash != last_hash {
                return Err(ChainError::BrokenLink { index: block.index });
            }

            if !self
                .pow
                .valid_proof(last_block.proof, block.proof, &last_hash)
            {
                return Err(ChainError::InvalidProof { index: block.index });
            }

            last_block = block;
        }

        Ok(())
    }

    /// Whether the chain passes [`Self::validate`]
    pub fn is_valid(&self, chain: &[Block]) -> bool {
        match self.validate(chain) {
            Ok(()) => true,
            Err(e) => {
                log::debug!("Rejected chain of {} blocks: {}", chain.len(), e);
                false
            }
        }
    }
}
