// core.rs splits responsibilities into submodules: the chain itself and its validation.
pub mod chain;
pub mod validation;

pub use chain::*;
pub use validation::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;
    use crate::error::ChainError;
    use crate::miner::{valid_proof, ProofSearch, MINING_DIFFICULTY};
    use crate::transaction::{Transaction, MINING_REWARD, MINING_SENDER};

    fn signed_submit(chain: &mut Blockchain, keypair: &KeyPair, recipient: &str, amount: u64) -> Result<u64, ChainError> {
        let tx = Transaction::new(keypair.public_key_hex(), recipient, amount);
        let signature = keypair.sign_hex(&tx.signable_message());
        chain.submit_transaction(&keypair.public_key_hex(), recipient, &signature, amount)
    }

    fn mined_chain(blocks: usize) -> Blockchain {
        let mut chain = Blockchain::with_node_id("miner");
        let keypair = KeyPair::generate();
        while chain.len() < blocks {
            let amount = chain.len() as u64;
            signed_submit(&mut chain, &keypair, "someone", amount).unwrap();
            chain.mine(&ProofSearch::new()).unwrap();
        }
        chain
    }

    #[test]
    fn test_genesis_block() {
        let chain = Blockchain::new();
        assert_eq!(chain.len(), 1);
        let genesis = &chain.blocks[0];
        assert_eq!(genesis.index, 1);
        assert_eq!(genesis.nonce, 0);
        assert_eq!(genesis.previous_hash, GENESIS_PREVIOUS_HASH);
        assert!(genesis.transactions.is_empty());
        assert!(chain.mempool.is_empty());
    }

    #[test]
    fn test_hash_is_deterministic() {
        let block = Block {
            index: 2,
            timestamp: 1_700_000_000_000,
            transactions: vec![Transaction::new("a", "b", 3)],
            nonce: 42,
            previous_hash: "ff".to_string(),
        };
        let twin = block.clone();
        assert_eq!(block.hash(), twin.hash());
        assert_eq!(block.hash().len(), 64);
        assert_eq!(
            block.canonical_json(),
            r#"{"index":2,"nonce":42,"previous_hash":"ff","timestamp":1700000000000,"transactions":[{"amount":3,"recipient_public_key":"b","sender_public_key":"a"}]}"#
        );
    }

    #[test]
    fn test_hash_depends_on_every_field() {
        let base = Block {
            index: 2,
            timestamp: 10,
            transactions: vec![Transaction::new("a", "b", 3)],
            nonce: 1,
            previous_hash: "ff".to_string(),
        };
        let mut variants = vec![base.clone(); 5];
        variants[0].index = 3;
        variants[1].timestamp = 11;
        variants[2].transactions[0].amount = 4;
        variants[3].nonce = 2;
        variants[4].previous_hash = "fe".to_string();
        for variant in variants {
            assert_ne!(variant.hash(), base.hash());
        }
    }

    #[test]
    fn test_create_block_drains_pool() {
        let mut chain = Blockchain::new();
        chain.submit_transaction(MINING_SENDER, "bob", "", 5).unwrap();
        let previous_hash = chain.last_hash();

        let block = chain.create_block(7, previous_hash.clone());
        assert_eq!(block.index, 2);
        assert_eq!(block.nonce, 7);
        assert_eq!(block.previous_hash, previous_hash);
        assert_eq!(block.transactions.len(), 1);
        assert!(chain.mempool.is_empty());
        assert_eq!(chain.last_block(), Some(&block));
    }

    #[test]
    fn test_reward_sender_skips_signature() {
        let mut chain = Blockchain::new();
        assert_eq!(chain.submit_transaction(MINING_SENDER, "node", "garbage", 1), Ok(2));
        assert_eq!(chain.mempool.len(), 1);
    }

    #[test]
    fn test_signed_transaction_admitted() {
        let mut chain = Blockchain::new();
        let keypair = KeyPair::generate();
        assert_eq!(signed_submit(&mut chain, &keypair, "bob", 10), Ok(2));
        assert_eq!(chain.mempool.transactions()[0].amount, 10);
    }

    #[test]
    fn test_bad_signature_rejected() {
        let mut chain = Blockchain::new();
        let keypair = KeyPair::generate();
        let other = KeyPair::generate();
        let tx = Transaction::new(keypair.public_key_hex(), "bob", 10);
        let forged = other.sign_hex(&tx.signable_message());

        let result = chain.submit_transaction(&keypair.public_key_hex(), "bob", &forged, 10);
        assert_eq!(result, Err(ChainError::InvalidTransactionSignature));
        assert!(chain.mempool.is_empty());

        let result = chain.submit_transaction("not-a-key", "bob", "not-a-sig", 10);
        assert_eq!(result, Err(ChainError::InvalidTransactionSignature));
    }

    #[test]
    fn test_mine_appends_rewarded_block() {
        let mut chain = Blockchain::with_node_id("miner-1");
        let keypair = KeyPair::generate();
        signed_submit(&mut chain, &keypair, "bob", 3).unwrap();
        let pending = chain.mempool.get_all_transactions();
        let tip = chain.last_hash();

        let block = chain.mine(&ProofSearch::new()).unwrap();
        assert_eq!(block.index, 2);
        assert_eq!(block.previous_hash, tip);
        assert_eq!(block.proof_transactions(), pending.as_slice());
        let reward = block.transactions.last().unwrap();
        assert_eq!(reward, &Transaction::new(MINING_SENDER, "miner-1", MINING_REWARD));
        assert!(valid_proof(&pending, &tip, block.nonce, MINING_DIFFICULTY));
        assert!(chain.mempool.is_empty());
        assert!(is_chain_valid(&chain.blocks));
    }

    #[test]
    fn test_stale_proof_rejected() {
        let mut chain = Blockchain::new();
        let template = chain.mining_template();
        let nonce = ProofSearch::new()
            .run(&template.transactions, &template.last_hash)
            .unwrap();

        chain.submit_transaction(MINING_SENDER, "late", "", 1).unwrap();
        assert!(matches!(
            chain.commit_proof(&template, nonce),
            Err(ChainError::StaleProof(_))
        ));
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.mempool.len(), 1);
    }

    #[test]
    fn test_genesis_only_chain_is_valid() {
        let chain = Blockchain::new();
        assert!(chain.is_chain_valid(&chain.blocks));
        assert!(!is_chain_valid(&[]));
    }

    #[test]
    fn test_mined_chain_is_valid() {
        let chain = mined_chain(4);
        assert!(is_chain_valid(&chain.blocks));
    }

    #[test]
    fn test_flipped_previous_hash_bit_invalidates() {
        let mut chain = mined_chain(3);
        let hash = &chain.blocks[2].previous_hash;
        let mut bytes = hex::decode(hash).unwrap();
        bytes[0] ^= 0x01;
        chain.blocks[2].previous_hash = hex::encode(bytes);
        assert!(!is_chain_valid(&chain.blocks));
    }

    #[test]
    fn test_tampered_transaction_invalidates() {
        let mut chain = mined_chain(3);
        chain.blocks[1].transactions[0].amount += 1;
        assert!(!is_chain_valid(&chain.blocks));
    }

    #[test]
    fn test_bad_nonce_invalidates() {
        let mut chain = mined_chain(2);
        let block = &chain.blocks[1];
        let bad_nonce = (0u64..)
            .find(|n| !valid_proof(block.proof_transactions(), &block.previous_hash, *n, MINING_DIFFICULTY))
            .unwrap();
        chain.blocks[1].nonce = bad_nonce;
        assert!(!is_chain_valid(&chain.blocks));
    }

    #[test]
    fn test_replace_chain_rules() {
        let mut local = mined_chain(2);
        let longer = mined_chain(3);

        let same_length = mined_chain(2);
        assert!(matches!(
            local.replace_chain(same_length.blocks),
            Err(ChainError::InvalidChain(_))
        ));

        let mut broken = longer.blocks.clone();
        broken[2].previous_hash = "00".to_string();
        assert!(local.replace_chain(broken).is_err());

        local.replace_chain(longer.blocks.clone()).unwrap();
        assert_eq!(local.blocks, longer.blocks);
    }

    #[test]
    fn test_replace_chain_keeps_pending_pool() {
        let mut local = Blockchain::with_node_id("local");
        let keypair = KeyPair::generate();
        signed_submit(&mut local, &keypair, "bob", 7).unwrap();
        let pending = local.mempool.get_all_transactions();

        let longer = mined_chain(3);
        local.replace_chain(longer.blocks.clone()).unwrap();
        assert_eq!(local.mempool.len(), 1);
        assert_eq!(local.mempool.get_all_transactions(), pending);

        let block = local.mine(&ProofSearch::new()).unwrap();
        assert_eq!(block.index, 4);
        assert_eq!(block.previous_hash, longer.blocks[2].hash());
        assert_eq!(block.proof_transactions(), pending.as_slice());
        assert!(is_chain_valid(&local.blocks));
    }

    #[test]
    fn test_chain_json_roundtrip_preserves_hashes() {
        let chain = mined_chain(3);
        let encoded = serde_json::to_string(&chain.blocks).unwrap();
        let decoded: Vec<Block> = serde_json::from_str(&encoded).unwrap();
        for (original, restored) in chain.blocks.iter().zip(&decoded) {
            assert_eq!(original.hash(), restored.hash());
        }
        assert!(is_chain_valid(&decoded));
    }
}
