//! Longest-valid-chain rule
//!
//! The local chain is replaced only by a peer chain that is strictly longer
//! and passes validation. Equal lengths keep the incumbent.

use crate::consensus::validator::ChainValidator;
use crate::core::{Block, ChainSnapshot};

/// Outcome of a resolution pass
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Whether a peer chain replaced the local one
    pub adopted: bool,
    /// The chain that should now be held locally
    pub chain: Vec<Block>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConsensusResolver {
    validator: ChainValidator,
}

impl ConsensusResolver {
    pub fn new(validator: ChainValidator) -> Self {
        Self { validator }
    }

    /// Pick the longest valid chain among the local chain and the candidates
    pub fn resolve(&self, local: Vec<Block>, peers: Vec<ChainSnapshot>) -> Resolution {
        let mut max_length = local.len();
        let mut new_chain: Option<Vec<Block>> = None;

        for snapshot in peers {
            if snapshot.length > max_length && self.validator.is_valid(&snapshot.chain) {
                max_length = snapshot.length;
                new_chain = Some(snapshot.chain);
            }
        }

        match new_chain {
            Some(chain) => Resolution {
                adopted: true,
                chain,
            },
            None => Resolution {
                adopted: false,
                chain: local,
            },
        }
    }
}
