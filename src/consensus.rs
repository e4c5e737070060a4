//! Longest-valid-chain consensus

use crate::blockchain::{is_chain_valid, Block};
use crate::error::ChainError;
use crate::network::{ChainResponse, PeerNetwork};
use futures::future::join_all;
use tracing::{debug, warn};

/// A peer chain that beat the local one.
#[derive(Debug, Clone)]
pub struct ChainCandidate {
    pub peer: String,
    pub chain: Vec<Block>,
}

/// Consensus engine for selecting the canonical chain
pub struct Consensus;

impl Consensus {
    /// Fetches every peer's chain concurrently. Results come back in the
    /// same order as `peers`.
    pub async fn fetch_chains(
        peers: &[String],
        network: &dyn PeerNetwork,
    ) -> Vec<(String, Result<ChainResponse, ChainError>)> {
        let fetches = peers.iter().map(|peer| async move {
            let result = network.fetch_chain(peer).await;
            (peer.clone(), result)
        });
        join_all(fetches).await
    }

    /// Picks the longest valid chain strictly longer than `local_len`.
    /// Responses are scanned in order and a candidate only displaces the
    /// current best if it is strictly longer, so ties go to the earlier peer.
    pub fn select_longest(
        local_len: usize,
        responses: Vec<(String, Result<ChainResponse, ChainError>)>,
    ) -> Option<ChainCandidate> {
        let mut max_length = local_len;
        let mut best = None;

        for (peer, response) in responses {
            let chain = match response.and_then(ChainResponse::into_checked_chain) {
                Ok(chain) => chain,
                Err(e) => {
                    warn!(peer = %peer, error = %e, "skipping peer");
                    continue;
                }
            };

            if chain.len() <= max_length {
                debug!(peer = %peer, length = chain.len(), "peer chain not longer");
                continue;
            }

            if !is_chain_valid(&chain) {
                warn!(peer = %peer, length = chain.len(), "peer chain failed validation");
                continue;
            }

            max_length = chain.len();
            best = Some(ChainCandidate { peer, chain });
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::Blockchain;
    use crate::miner::ProofSearch;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct MockNetwork {
        chains: HashMap<String, ChainResponse>,
    }

    #[async_trait]
    impl PeerNetwork for MockNetwork {
        async fn fetch_chain(&self, address: &str) -> Result<ChainResponse, ChainError> {
            self.chains
                .get(address)
                .cloned()
                .ok_or_else(|| ChainError::PeerUnreachable(address.to_string()))
        }
    }

    fn mined(blocks: usize) -> Blockchain {
        let mut chain = Blockchain::new();
        while chain.len() < blocks {
            chain.mine(&ProofSearch::new()).unwrap();
        }
        chain
    }

    fn tampered(blocks: usize) -> Vec<Block> {
        let mut chain = mined(blocks).blocks;
        chain[3].previous_hash = "00".to_string();
        chain
    }

    #[tokio::test]
    async fn test_longer_valid_chain_wins_over_longest_invalid() {
        tokio::time::timeout(std::time::Duration::from_secs(30), async {
            let mut local = mined(3);
            local.register_node("http://peer-a:5000").unwrap();
            local.register_node("http://peer-b:5000").unwrap();

            let peer_a = mined(5);
            let mut chains = HashMap::new();
            chains.insert("peer-a:5000".to_string(), ChainResponse::from_chain(&peer_a.blocks));
            chains.insert("peer-b:5000".to_string(), ChainResponse::from_chain(&tampered(7)));
            let network = MockNetwork { chains };

            assert!(local.resolve_conflicts(&network).await);
            assert_eq!(local.len(), 5);
            assert_eq!(local.blocks, peer_a.blocks);
        })
        .await
        .expect("consensus test timed out");
    }

    #[tokio::test]
    async fn test_equal_length_chain_not_adopted() {
        let mut local = mined(3);
        local.register_node("peer:1").unwrap();
        let before = local.blocks.clone();

        let mut chains = HashMap::new();
        chains.insert("peer:1".to_string(), ChainResponse::from_chain(&mined(3).blocks));
        let network = MockNetwork { chains };

        assert!(!local.resolve_conflicts(&network).await);
        assert_eq!(local.blocks, before);
    }

    #[tokio::test]
    async fn test_unreachable_and_malformed_peers_are_skipped() {
        let mut local = mined(2);
        local.register_node("down:1").unwrap();
        local.register_node("liar:1").unwrap();
        local.register_node("good:1").unwrap();

        let good = mined(4);
        let mut lying = ChainResponse::from_chain(&mined(3).blocks);
        lying.length = 40;

        let mut chains = HashMap::new();
        chains.insert("liar:1".to_string(), lying);
        chains.insert("good:1".to_string(), ChainResponse::from_chain(&good.blocks));
        let network = MockNetwork { chains };

        assert!(local.resolve_conflicts(&network).await);
        assert_eq!(local.blocks, good.blocks);
    }

    #[tokio::test]
    async fn test_no_peers_keeps_local_chain() {
        let mut local = mined(2);
        let network = MockNetwork { chains: HashMap::new() };
        assert!(!local.resolve_conflicts(&network).await);
        assert_eq!(local.len(), 2);
    }

    #[test]
    fn test_tie_goes_to_first_peer() {
        let first = mined(4);
        let second = mined(4);
        let responses = vec![
            ("a".to_string(), Ok(ChainResponse::from_chain(&first.blocks))),
            ("b".to_string(), Ok(ChainResponse::from_chain(&second.blocks))),
        ];
        let winner = Consensus::select_longest(2, responses).unwrap();
        assert_eq!(winner.peer, "a");
        assert_eq!(winner.chain, first.blocks);
    }
}
