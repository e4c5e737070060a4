use crate::blockchain::core::chain::Block;
use crate::miner::{valid_proof, MINING_DIFFICULTY};
use tracing::debug;

/// Checks hash linkage and proof-of-work for every block after the first.
/// The first block is trusted as-is; an empty chain is never valid.
pub fn is_chain_valid(chain: &[Block]) -> bool {
    if chain.is_empty() {
        return false;
    }

    chain.windows(2).all(|pair| {
        let (previous, block) = (&pair[0], &pair[1]);

        if block.previous_hash != previous.hash() {
            debug!(index = block.index, "previous_hash does not match parent");
            return false;
        }

        if !valid_proof(
            block.proof_transactions(),
            &block.previous_hash,
            block.nonce,
            MINING_DIFFICULTY,
        ) {
            debug!(index = block.index, nonce = block.nonce, "invalid proof of work");
            return false;
        }

        true
    })
}
