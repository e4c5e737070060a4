//! Peer registry and the peer chain-fetch capability
//!
//! Consensus never talks to the wire directly: it goes through the
//! [`PeerNetwork`] trait so tests and alternative transports can be
//! injected. [`HttpPeerNetwork`] is the production implementation and speaks
//! the same `GET /chain` route that [`crate::api`] serves.

use crate::blockchain::Block;
use crate::error::ChainError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// Peer exchange payload for a full chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainResponse {
    pub chain: Vec<Block>,
    pub length: usize,
}

impl ChainResponse {
    pub fn from_chain(chain: &[Block]) -> Self {
        Self {
            chain: chain.to_vec(),
            length: chain.len(),
        }
    }

    /// Rejects responses whose reported length disagrees with the payload,
    /// or that carry no blocks at all.
    pub fn into_checked_chain(self) -> Result<Vec<Block>, ChainError> {
        if self.chain.is_empty() {
            return Err(ChainError::PeerMalformedResponse(
                "peer returned an empty chain".to_string(),
            ));
        }
        if self.length != self.chain.len() {
            return Err(ChainError::PeerMalformedResponse(format!(
                "reported length {} but sent {} blocks",
                self.length,
                self.chain.len()
            )));
        }
        Ok(self.chain)
    }
}

#[async_trait]
pub trait PeerNetwork: Send + Sync {
    /// Fetches the full chain held by the peer at `address` (`host:port`).
    async fn fetch_chain(&self, address: &str) -> Result<ChainResponse, ChainError>;
}

/// Fetches peer chains over plain HTTP.
#[derive(Debug, Clone)]
pub struct HttpPeerNetwork {
    client: reqwest::Client,
}

impl HttpPeerNetwork {
    pub fn new(timeout: Duration) -> Result<Self, ChainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChainError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PeerNetwork for HttpPeerNetwork {
    async fn fetch_chain(&self, address: &str) -> Result<ChainResponse, ChainError> {
        let url = format!("http://{}/chain", address);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ChainError::PeerUnreachable(format!("{}: {}", address, e)))?;

        if !response.status().is_success() {
            return Err(ChainError::PeerMalformedResponse(format!(
                "{} answered with status {}",
                address,
                response.status()
            )));
        }

        response
            .json::<ChainResponse>()
            .await
            .map_err(|e| ChainError::PeerMalformedResponse(format!("{}: {}", address, e)))
    }
}

/// Registered peer addresses. Kept sorted so listings and consensus scans
/// visit peers in a stable order.
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    nodes: BTreeSet<String>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `url` and stores its address. Returns the stored address.
    pub fn register(&mut self, url: &str) -> Result<String, ChainError> {
        let address = parse_node_address(url)?;
        self.nodes.insert(address.clone());
        Ok(address)
    }

    pub fn list(&self) -> Vec<String> {
        self.nodes.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Extracts the network location (`host:port`) from a URL such as
/// `http://10.0.0.5:5002/chain`. Inputs without a `scheme://` or `//` prefix
/// are taken as a bare path and stored verbatim (`10.0.0.5:5002`).
pub fn parse_node_address(url: &str) -> Result<String, ChainError> {
    let invalid = || ChainError::InvalidNodeAddress(url.to_string());

    let trimmed = url.trim();
    let without_fragment = trimmed.split('#').next().unwrap_or_default();
    let without_query = without_fragment.split('?').next().unwrap_or_default();

    let after_scheme = match without_query.find("://") {
        Some(idx) if is_scheme(&without_query[..idx]) => Some(&without_query[idx + 3..]),
        _ => without_query.strip_prefix("//"),
    };

    let address = match after_scheme {
        Some(rest) => {
            let netloc = rest.split('/').next().unwrap_or_default();
            if netloc.is_empty() {
                rest
            } else {
                netloc
            }
        }
        None => without_query,
    };

    if address.is_empty() || address.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    Ok(address.to_string())
}

fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
