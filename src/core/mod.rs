//! Core ledger components
//!
//! This module contains the fundamental building blocks:
//! - Transactions (plain sender/recipient/amount records)
//! - Blocks (proof plus link to the previous block's hash)
//! - Ledger (chain and pending pool, single owner of both)

pub mod block;
pub mod ledger;
pub mod transaction;

pub use block::{Block, ChainSnapshot, GENESIS_PREVIOUS_HASH, GENESIS_PROOF, GENESIS_TIMESTAMP};
pub use ledger::{Ledger, SharedLedger};
pub use transaction::{Transaction, MINING_REWARD, REWARD_SENDER};
