//! Consensus rules
//!
//! - Proof-of-work puzzle (fixed difficulty, cancellable search)
//! - Chain validation (hash linkage + puzzle)
//! - Longest-valid-chain resolution

pub mod pow;
pub mod resolver;
pub mod validator;

pub use pow::{ProofOfWork, DEFAULT_DIFFICULTY, MAX_DIFFICULTY};
pub use resolver::{ConsensusResolver, Resolution};
pub use validator::{ChainError, ChainValidator};
