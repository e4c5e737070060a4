/// Transaction types for HashLedger
use serde_json::{json, Value};

/// Reserved sender identity for block rewards. Transactions from this sender
/// are the only way value enters the ledger and skip signature checks.
pub const MINING_SENDER: &str = "The Blockchain";

/// Amount credited to the miner of each block
pub const MINING_REWARD: u64 = 1;

/// A value transfer between two public keys
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Transaction {
    pub sender_public_key: String,
    pub recipient_public_key: String,
    pub amount: u64,
}

impl Transaction {
    pub fn new(
        sender_public_key: impl Into<String>,
        recipient_public_key: impl Into<String>,
        amount: u64,
    ) -> Self {
        Transaction {
            sender_public_key: sender_public_key.into(),
            recipient_public_key: recipient_public_key.into(),
            amount,
        }
    }

    /// Block reward paying `recipient` the fixed mining reward.
    pub fn reward(recipient: impl Into<String>) -> Self {
        Self::new(MINING_SENDER, recipient, MINING_REWARD)
    }

    pub fn is_reward(&self) -> bool {
        self.sender_public_key == MINING_SENDER
    }

    /// Canonical string used both as the signing message and as proof-of-work
    /// input. Field order is sender, recipient, amount and never changes.
    pub fn canonical_string(&self) -> String {
        format!(
            "{{\"sender_public_key\":{},\"recipient_public_key\":{},\"amount\":{}}}",
            Value::from(self.sender_public_key.as_str()),
            Value::from(self.recipient_public_key.as_str()),
            self.amount
        )
    }

    pub fn signable_message(&self) -> Vec<u8> {
        self.canonical_string().into_bytes()
    }

    /// JSON object with keys inserted in sorted order, for block hashing.
    pub fn sorted_value(&self) -> Value {
        json!({
            "amount": self.amount,
            "recipient_public_key": self.recipient_public_key,
            "sender_public_key": self.sender_public_key,
        })
    }
}

/// Canonical string of an ordered transaction list: `[tx,tx,...]`.
pub fn canonical_list(transactions: &[Transaction]) -> String {
    let parts: Vec<String> = transactions.iter().map(Transaction::canonical_string).collect();
    format!("[{}]", parts.join(","))
}
