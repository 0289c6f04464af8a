//! Transaction record
//!
//! A transfer of `amount` from `sender` to `recipient`. Transactions carry no
//! identifier of their own: once sealed they are addressed by their position
//! inside a block.

use serde::{Deserialize, Serialize};

/// Sender used for the reward transaction a miner pays itself
pub const REWARD_SENDER: &str = "0";

/// Amount credited to a miner for sealing a block
pub const MINING_REWARD: u64 = 1;

/// A pending or sealed value transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Address of the sender
    pub sender: String,
    /// Address of the recipient
    pub recipient: String,
    /// Amount transferred
    pub amount: u64,
}

impl Transaction {
    pub fn new(sender: &str, recipient: &str, amount: u64) -> Self {
        Self {
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            amount,
        }
    }

    /// Create the reward transaction paid to a miner
    pub fn reward(miner: &str) -> Self {
        Self::new(REWARD_SENDER, miner, MINING_REWARD)
    }

    /// Whether this is a miner reward
    pub fn is_reward(&self) -> bool {
        self.sender == REWARD_SENDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reward_transaction() {
        let tx = Transaction::reward("node-1");
        assert!(tx.is_reward());
        assert_eq!(tx.recipient, "node-1");
        assert_eq!(tx.amount, MINING_REWARD);
        assert!(!Transaction::new("A", "B", 5).is_reward());
    }

    #[test]
    fn test_external_representation() {
        let tx = Transaction::new("A", "B", 5);
        let value = serde_json::to_value(&tx).unwrap();

        assert_eq!(value["sender"], "A");
        assert_eq!(value["recipient"], "B");
        assert_eq!(value["amount"], 5);
        assert_eq!(value.as_object().unwrap().len(), 3);
    }
}
