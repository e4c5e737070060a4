use crate::blockchain::core::validation::is_chain_valid;
use crate::consensus::Consensus;
use crate::crypto::generate_node_id;
use crate::error::ChainError;
use crate::mempool::Mempool;
use crate::miner::ProofSearch;
use crate::network::{NodeRegistry, PeerNetwork};
use crate::transaction::Transaction;
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

/// `previous_hash` of the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "00";

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Block {
    pub index: u64,
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
    pub transactions: Vec<Transaction>,
    pub nonce: u64,
    pub previous_hash: String,
}

impl Block {
    pub fn new(index: u64, transactions: Vec<Transaction>, nonce: u64, previous_hash: String) -> Self {
        Block {
            index,
            timestamp: chrono::Utc::now().timestamp_millis() as u64,
            transactions,
            nonce,
            previous_hash,
        }
    }

    pub fn genesis() -> Self {
        Self::new(1, Vec::new(), 0, GENESIS_PREVIOUS_HASH.to_string())
    }

    /// Compact JSON with every object's keys in sorted order. The objects are
    /// built here key by key, so the output never depends on field
    /// declaration order or on serde_json's map implementation.
    pub fn canonical_json(&self) -> String {
        let transactions: Vec<_> = self.transactions.iter().map(Transaction::sorted_value).collect();
        json!({
            "index": self.index,
            "nonce": self.nonce,
            "previous_hash": self.previous_hash,
            "timestamp": self.timestamp,
            "transactions": transactions,
        })
        .to_string()
    }

    /// Hex SHA-256 of [`Block::canonical_json`].
    pub fn hash(&self) -> String {
        hex::encode(Sha256::digest(self.canonical_json().as_bytes()))
    }

    /// Transactions the block's nonce was searched over: everything except
    /// the trailing reward transaction.
    pub fn proof_transactions(&self) -> &[Transaction] {
        self.transactions
            .split_last()
            .map(|(_reward, rest)| rest)
            .unwrap_or_default()
    }
}

/// Inputs a proof-of-work search ran over, captured so the result can be
/// committed only if nothing moved in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiningTemplate {
    pub transactions: Vec<Transaction>,
    pub last_hash: String,
}

/// The ledger: chain, pending pool and peer registry of one node.
#[derive(Debug, Clone)]
pub struct Blockchain {
    pub blocks: Vec<Block>,
    pub mempool: Mempool,
    pub nodes: NodeRegistry,
    pub node_id: String,
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}

impl Blockchain {
    /// New ledger with a random node id and a fresh genesis block.
    pub fn new() -> Self {
        Self::with_node_id(generate_node_id())
    }

    pub fn with_node_id(node_id: impl Into<String>) -> Self {
        let mut blockchain = Blockchain {
            blocks: Vec::new(),
            mempool: Mempool::new(),
            nodes: NodeRegistry::new(),
            node_id: node_id.into(),
        };
        blockchain.create_block(0, GENESIS_PREVIOUS_HASH.to_string());
        blockchain
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn last_block(&self) -> Option<&Block> {
        self.blocks.last()
    }

    pub fn last_hash(&self) -> String {
        self.last_block()
            .map(Block::hash)
            .unwrap_or_else(|| GENESIS_PREVIOUS_HASH.to_string())
    }

    pub fn next_index(&self) -> u64 {
        self.blocks.len() as u64 + 1
    }

    /// Seals the current pool into a new block and clears the pool.
    pub fn create_block(&mut self, nonce: u64, previous_hash: String) -> Block {
        let transactions = self.mempool.take_all();
        let block = Block::new(self.next_index(), transactions, nonce, previous_hash);
        self.blocks.push(block.clone());
        debug!(index = block.index, txs = block.transactions.len(), "block appended");
        block
    }

    /// Admits a transaction into the pool and returns the index of the block
    /// it will land in. Reward transactions skip signature verification.
    pub fn submit_transaction(
        &mut self,
        sender_public_key: &str,
        recipient_public_key: &str,
        signature: &str,
        amount: u64,
    ) -> Result<u64, ChainError> {
        let tx = Transaction::new(sender_public_key, recipient_public_key, amount);

        if !tx.is_reward() && !tx.verify_signature(sender_public_key, signature) {
            return Err(ChainError::InvalidTransactionSignature);
        }

        self.mempool.add_transaction(tx);
        Ok(self.next_index())
    }

    pub fn register_node(&mut self, url: &str) -> Result<String, ChainError> {
        self.nodes.register(url)
    }

    pub fn is_chain_valid(&self, candidate: &[Block]) -> bool {
        is_chain_valid(candidate)
    }

    pub fn mining_template(&self) -> MiningTemplate {
        MiningTemplate {
            transactions: self.mempool.get_all_transactions(),
            last_hash: self.last_hash(),
        }
    }

    /// Pays the reward to this node and seals the block for a nonce found
    /// over `template`. Fails with `StaleProof` if the tip or the pool
    /// changed since the template was taken.
    pub fn commit_proof(&mut self, template: &MiningTemplate, nonce: u64) -> Result<Block, ChainError> {
        let last_hash = self.last_hash();
        if last_hash != template.last_hash {
            return Err(ChainError::StaleProof("chain tip moved".to_string()));
        }
        if self.mempool.transactions() != template.transactions.as_slice() {
            return Err(ChainError::StaleProof("pending pool changed".to_string()));
        }

        self.mempool.add_transaction(Transaction::reward(self.node_id.clone()));
        let block = self.create_block(nonce, last_hash);
        info!(index = block.index, nonce, "mined new block");
        Ok(block)
    }

    /// Search and commit in one exclusive borrow.
    pub fn mine(&mut self, search: &ProofSearch) -> Result<Block, ChainError> {
        let template = self.mining_template();
        let nonce = search.run(&template.transactions, &template.last_hash)?;
        self.commit_proof(&template, nonce)
    }

    /// Replaces the chain wholesale if `candidate` is strictly longer and valid.
    pub fn replace_chain(&mut self, candidate: Vec<Block>) -> Result<(), ChainError> {
        if candidate.len() <= self.blocks.len() {
            return Err(ChainError::InvalidChain(format!(
                "candidate length {} does not exceed local length {}",
                candidate.len(),
                self.blocks.len()
            )));
        }
        if !is_chain_valid(&candidate) {
            return Err(ChainError::InvalidChain("candidate failed validation".to_string()));
        }
        info!(old_len = self.blocks.len(), new_len = candidate.len(), "chain replaced");
        self.blocks = candidate;
        Ok(())
    }

    /// Longest-valid-chain rule against every registered peer. Returns
    /// whether the local chain was replaced.
    pub async fn resolve_conflicts(&mut self, network: &dyn PeerNetwork) -> bool {
        let peers = self.nodes.list();
        let responses = Consensus::fetch_chains(&peers, network).await;
        match Consensus::select_longest(self.blocks.len(), responses) {
            Some(candidate) => self.replace_chain(candidate.chain).is_ok(),
            None => false,
        }
    }
}
