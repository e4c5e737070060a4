//! HashLedger - a minimal replicated proof-of-work ledger
//!
//! # Architecture
//!
//! ## Core Ledger
//! - [`blockchain`] - Blocks, canonical hashing, the ledger and chain validation
//! - [`transaction`] - Transaction type, canonical form and signature checks
//! - [`mempool`] - Pending transaction pool
//!
//! ## Consensus & Mining
//! - [`miner`] - Proof-of-work predicate and nonce search
//! - [`consensus`] - Longest-valid-chain selection across peers
//!
//! ## Cryptography
//! - [`crypto`] - Keys, signatures and verification (secp256k1)
//!
//! ## Networking & Integration
//! - [`network`] - Peer registry and the peer chain-fetch capability
//! - [`node`] - Node orchestrator around a shared ledger
//! - [`api`] - HTTP API
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Core Ledger
// ============================================================================
pub mod blockchain;
pub mod mempool;
pub mod transaction;

// ============================================================================
// Consensus & Mining
// ============================================================================
pub mod consensus;
pub mod miner;

// ============================================================================
// Cryptography
// ============================================================================
pub mod crypto;

// ============================================================================
// Networking & Integration
// ============================================================================
pub mod network;
pub mod node;

#[cfg(feature = "api")]
pub mod api;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
