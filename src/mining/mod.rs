//! Mining module: cancellable block production

pub mod miner;

pub use miner::{MineOutcome, Miner, MiningControl, MiningError, MiningStats};
