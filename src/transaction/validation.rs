/// Signature checks for transactions, separated from type definitions
use crate::crypto::verify_signature;
use crate::transaction::types::Transaction;
use tracing::debug;

impl Transaction {
    /// Verifies `signature` over this transaction's canonical string under
    /// `sender_public_key`. Malformed keys or signatures count as failures.
    pub fn verify_signature(&self, sender_public_key: &str, signature: &str) -> bool {
        match verify_signature(sender_public_key, &self.signable_message(), signature) {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "transaction signature rejected");
                false
            }
        }
    }
}

/// Free-function form of [`Transaction::verify_signature`].
pub fn verify_transaction_signature(
    sender_public_key: &str,
    signature: &str,
    transaction: &Transaction,
) -> bool {
    transaction.verify_signature(sender_public_key, signature)
}
