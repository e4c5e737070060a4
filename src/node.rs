//! Node orchestrator: owns the shared ledger and the peer network handle.

use crate::blockchain::{Block, Blockchain};
use crate::config::Config;
use crate::consensus::Consensus;
use crate::error::ChainError;
use crate::miner::ProofSearch;
use crate::network::{HttpPeerNetwork, PeerNetwork};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};

pub struct Node {
    pub config: Config,
    pub blockchain: Arc<RwLock<Blockchain>>,
    pub network: Arc<dyn PeerNetwork>,
    stop_mining: Arc<AtomicBool>,
}

impl Node {
    pub fn new(config: Config, network: Arc<dyn PeerNetwork>) -> Self {
        let blockchain = match &config.miner.node_id {
            Some(id) => Blockchain::with_node_id(id.clone()),
            None => Blockchain::new(),
        };
        Self {
            config,
            blockchain: Arc::new(RwLock::new(blockchain)),
            network,
            stop_mining: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Node that reaches peers over HTTP with the configured timeout.
    pub fn from_config(config: Config) -> Result<Self, ChainError> {
        config.validate()?;
        let timeout = Duration::from_secs(config.network.peer_timeout_secs);
        let network = HttpPeerNetwork::new(timeout)?;
        Ok(Self::new(config, Arc::new(network)))
    }

    pub async fn node_id(&self) -> String {
        self.blockchain.read().await.node_id.clone()
    }

    /// Mines one block. The nonce search runs on a blocking thread without
    /// holding the ledger lock; the commit re-checks the template under the
    /// write lock and the search is retried if the pool or tip moved.
    pub async fn mine(&self) -> Result<Block, ChainError> {
        let search = ProofSearch::new()
            .with_max_attempts(self.config.miner.max_attempts)
            .with_cancel_flag(self.stop_mining.clone());
        let retries = self.config.miner.max_commit_retries;

        for attempt in 0..=retries {
            let template = self.blockchain.read().await.mining_template();

            let job_search = search.clone();
            let job_template = template.clone();
            let nonce = tokio::task::spawn_blocking(move || {
                job_search.run(&job_template.transactions, &job_template.last_hash)
            })
            .await
            .map_err(|e| ChainError::IoError(format!("mining task failed: {}", e)))??;

            match self.blockchain.write().await.commit_proof(&template, nonce) {
                Ok(block) => return Ok(block),
                Err(ChainError::StaleProof(reason)) => {
                    warn!(attempt, reason = %reason, "discarding stale proof");
                }
                Err(e) => return Err(e),
            }
        }

        Err(ChainError::StaleProof(format!(
            "gave up after {} attempts",
            retries + 1
        )))
    }

    /// Pauses mining: any running and future proof search stops with
    /// `MiningCancelled` until [`Node::resume_mining`] is called.
    pub fn stop_mining(&self) {
        self.stop_mining.store(true, Ordering::Relaxed);
    }

    pub fn resume_mining(&self) {
        self.stop_mining.store(false, Ordering::Relaxed);
    }

    pub fn is_mining_paused(&self) -> bool {
        self.stop_mining.load(Ordering::Relaxed)
    }

    pub async fn submit_transaction(
        &self,
        sender_public_key: &str,
        recipient_public_key: &str,
        signature: &str,
        amount: u64,
    ) -> Result<u64, ChainError> {
        self.blockchain
            .write()
            .await
            .submit_transaction(sender_public_key, recipient_public_key, signature, amount)
    }

    /// Registers a comma-separated list of peer URLs. Spaces are ignored.
    /// Stops at the first invalid entry; earlier entries stay registered.
    pub async fn register_nodes(&self, nodes: &str) -> Result<Vec<String>, ChainError> {
        let cleaned = nodes.replace(' ', "");
        let mut blockchain = self.blockchain.write().await;
        for node in cleaned.split(',') {
            let address = blockchain.register_node(node)?;
            info!(peer = %address, "registered peer");
        }
        Ok(blockchain.nodes.list())
    }

    /// Consensus round. Peer chains are fetched without holding the ledger
    /// lock; the winner is re-validated against the current chain on commit.
    pub async fn resolve_conflicts(&self) -> bool {
        let (peers, local_len) = {
            let blockchain = self.blockchain.read().await;
            (blockchain.nodes.list(), blockchain.len())
        };

        let responses = Consensus::fetch_chains(&peers, self.network.as_ref()).await;
        let Some(candidate) = Consensus::select_longest(local_len, responses) else {
            return false;
        };

        match self.blockchain.write().await.replace_chain(candidate.chain) {
            Ok(()) => {
                info!(peer = %candidate.peer, "adopted peer chain");
                true
            }
            Err(e) => {
                warn!(peer = %candidate.peer, error = %e, "peer chain no longer wins");
                false
            }
        }
    }

    /// Registers bootstrap peers and serves the HTTP API until it fails.
    #[cfg(feature = "api")]
    pub async fn run(self: Arc<Self>) -> Result<(), Box<dyn std::error::Error>> {
        for peer in &self.config.network.bootstrap_peers {
            if let Err(e) = self.register_nodes(peer).await {
                warn!(peer = %peer, error = %e, "ignoring bootstrap peer");
            }
        }

        let addr = format!("{}:{}", self.config.network.host, self.config.network.api_port);
        let node_id = self.node_id().await;
        info!(node_id = %node_id, addr = %addr, "starting HashLedger node");
        crate::api::run_api_server(self, &addr).await
    }
}
