//! Proof-of-work: the validity predicate and the nonce search

use crate::blockchain::{Block, GENESIS_PREVIOUS_HASH};
use crate::error::ChainError;
use crate::transaction::{canonical_list, Transaction};
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Required number of leading `'0'` hex characters. Fixed, never retargeted.
pub const MINING_DIFFICULTY: usize = 2;

/// How many nonces are tried between checks of the cancellation flag.
const CANCEL_CHECK_INTERVAL: u64 = 1024;

/// Hex SHA-256 of `canonical(transactions) || last_hash || nonce`.
pub fn proof_digest(transactions: &[Transaction], last_hash: &str, nonce: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_list(transactions).as_bytes());
    hasher.update(last_hash.as_bytes());
    hasher.update(nonce.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

pub fn valid_proof(transactions: &[Transaction], last_hash: &str, nonce: u64, difficulty: usize) -> bool {
    let digest = proof_digest(transactions, last_hash, nonce);
    digest.len() >= difficulty && digest.bytes().take(difficulty).all(|b| b == b'0')
}

/// Unbounded search from nonce 0 against the hash of the chain tail.
pub fn proof_of_work(chain: &[Block], pending: &[Transaction]) -> u64 {
    let last_hash = tail_hash(chain);
    let mut nonce = 0u64;
    while !valid_proof(pending, &last_hash, nonce, MINING_DIFFICULTY) {
        nonce += 1;
    }
    nonce
}

fn tail_hash(chain: &[Block]) -> String {
    chain
        .last()
        .map(Block::hash)
        .unwrap_or_else(|| GENESIS_PREVIOUS_HASH.to_string())
}

/// Bounded, cancellable variant of [`proof_of_work`] for hosts that must
/// stay responsive.
#[derive(Debug, Clone)]
pub struct ProofSearch {
    pub difficulty: usize,
    pub max_attempts: Option<u64>,
    cancel: Option<Arc<AtomicBool>>,
}

impl Default for ProofSearch {
    fn default() -> Self {
        Self {
            difficulty: MINING_DIFFICULTY,
            max_attempts: None,
            cancel: None,
        }
    }
}

impl ProofSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, max_attempts: Option<u64>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// The search stops with `MiningCancelled` once `flag` is set.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn run(&self, transactions: &[Transaction], last_hash: &str) -> Result<u64, ChainError> {
        let mut nonce = 0u64;
        loop {
            if let Some(max) = self.max_attempts {
                if nonce >= max {
                    return Err(ChainError::ProofSearchExhausted(max));
                }
            }
            if nonce % CANCEL_CHECK_INTERVAL == 0 && self.is_cancelled() {
                return Err(ChainError::MiningCancelled);
            }
            if valid_proof(transactions, last_hash, nonce, self.difficulty) {
                return Ok(nonce);
            }
            nonce += 1;
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}
