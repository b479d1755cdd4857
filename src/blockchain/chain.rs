use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::block::{Block, BlockInfo};
use super::crypto::{Address, CryptoProvider, Sha256Ed25519};
use super::policy::{self, difficulty_for_length, FEE_PER_TX, MAX_DIFFICULTY, TX_PER_BLOCK};
use super::transaction::{Transaction, TransactionType};
use super::transaction_output::TransactionOutput;
use super::validation::{FailureKind, Validation};

/// Where a transaction was found
///
/// Each index is -1 when the transaction is absent from that collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSearch {
    /// Position in the mempool
    pub mempool_index: i64,

    /// Index of the containing block
    pub block_index: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<Transaction>,
}

impl TransactionSearch {
    fn not_found() -> Self {
        TransactionSearch {
            mempool_index: -1,
            block_index: -1,
            transaction: None,
        }
    }

    pub fn is_found(&self) -> bool {
        self.transaction.is_some()
    }
}

/// Blocks and mempool, always locked together
#[derive(Debug)]
struct ChainState {
    /// Append-only; index 0 is genesis
    blocks: Vec<Block>,

    /// Pending transactions in submission order
    mempool: Vec<Transaction>,

    next_index: u64,
}

impl ChainState {
    fn tip(&self) -> &Block {
        // Genesis is pushed on construction and blocks are never removed
        &self.blocks[self.blocks.len() - 1]
    }

    fn difficulty(&self) -> u32 {
        difficulty_for_length(self.blocks.len())
    }

    fn contains_transaction(&self, hash: &str) -> bool {
        self.mempool.iter().any(|tx| tx.hash == hash)
            || self
                .blocks
                .iter()
                .any(|block| block.transactions.iter().any(|tx| tx.hash == hash))
    }

    fn pending_sender(&self, address: &Address) -> bool {
        self.mempool
            .iter()
            .any(|tx| tx.tx_inputs.iter().any(|input| &input.from_address == address))
    }
}

/// Represents the blockchain
///
/// All state sits behind one read-write lock. `add_transaction` and
/// `add_block` hold the write lock for their whole check-then-append step;
/// every query works on a consistent read snapshot. Mining never happens
/// under the lock.
pub struct Blockchain {
    state: RwLock<ChainState>,

    crypto: Arc<dyn CryptoProvider>,
}

impl fmt::Debug for Blockchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        f.debug_struct("Blockchain")
            .field("blocks", &state.blocks.len())
            .field("mempool", &state.mempool.len())
            .field("next_index", &state.next_index)
            .finish()
    }
}

impl Blockchain {
    /// Creates a new blockchain
    ///
    /// # Arguments
    ///
    /// * `genesis_miner` - The address that mines genesis and receives its reward
    ///
    /// # Returns
    ///
    /// A blockchain holding only the mined genesis block, using SHA-256 and ed25519
    pub fn new(genesis_miner: &Address) -> Self {
        Self::with_crypto(Arc::new(Sha256Ed25519), genesis_miner)
    }

    /// Creates a new blockchain with a custom hashing and signature provider
    ///
    /// # Arguments
    ///
    /// * `crypto` - The provider used for every hash and signature check, genesis included
    /// * `genesis_miner` - The address that mines genesis and receives its reward
    pub fn with_crypto(crypto: Arc<dyn CryptoProvider>, genesis_miner: &Address) -> Self {
        let difficulty = difficulty_for_length(0);

        let mut reward = Transaction::build(
            TransactionType::Fee,
            chrono::Utc::now().timestamp_millis(),
            Vec::new(),
            vec![TransactionOutput::new(genesis_miner.clone(), policy::block_reward(difficulty))],
        );
        reward.finalize_with(crypto.as_ref());

        let mut genesis = Block::new(0, "", vec![reward]);
        genesis.mine_cancellable(crypto.as_ref(), difficulty, genesis_miner, &AtomicBool::new(false));
        info!("Created genesis block {}", genesis.hash);

        Blockchain {
            state: RwLock::new(ChainState {
                blocks: vec![genesis],
                mempool: Vec::new(),
                next_index: 1,
            }),
            crypto,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ChainState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ChainState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Provider used for hashing and signature checks
    pub fn crypto(&self) -> Arc<dyn CryptoProvider> {
        self.crypto.clone()
    }

    /// Number of blocks, genesis included
    pub fn len(&self) -> usize {
        self.read().blocks.len()
    }

    /// A chain always holds its genesis block
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn get_last_block(&self) -> Block {
        self.read().tip().clone()
    }

    pub fn get_chain(&self) -> Vec<Block> {
        self.read().blocks.clone()
    }

    pub fn get_pending_transactions(&self) -> Vec<Transaction> {
        self.read().mempool.clone()
    }

    /// Difficulty the next block must meet
    pub fn get_difficulty(&self) -> u32 {
        self.read().difficulty()
    }

    pub fn get_fee_per_tx(&self) -> u64 {
        FEE_PER_TX
    }

    /// Validates `transaction` and queues it in the mempool
    ///
    /// On success the message carries the transaction hash.
    pub fn add_transaction(&self, transaction: Transaction) -> Validation {
        let mut state = self.write();

        let validation = self.check_transaction(&state, &transaction);
        if !validation.success {
            warn!("Rejected tx {}: {}", transaction.hash, validation.message);
            return validation;
        }

        info!("Accepted tx {} into mempool", transaction.hash);
        let hash = transaction.hash.clone();
        state.mempool.push(transaction);

        Validation::ok_with(hash)
    }

    fn check_transaction(&self, state: &ChainState, transaction: &Transaction) -> Validation {
        if transaction.is_fee() {
            return Validation::fail(FailureKind::Content, "Fee tx cannot be submitted to the mempool.");
        }

        if let Some(input) = transaction
            .tx_inputs
            .iter()
            .find(|input| state.pending_sender(&input.from_address))
        {
            return Validation::fail(
                FailureKind::Consistency,
                format!("Wallet {} has a pending tx. Try again later.", input.from_address),
            );
        }

        let validation = transaction.is_valid_with(self.crypto.as_ref(), state.difficulty(), FEE_PER_TX);
        if !validation.success {
            return validation.context("Invalid tx");
        }

        if state.contains_transaction(&transaction.hash) {
            return Validation::fail(FailureKind::Consistency, "Duplicated tx in blockchain.");
        }

        Validation::ok()
    }

    /// Validates `block` against the tip and appends it
    ///
    /// The block's FEE transaction must be new to the chain. Its non-FEE
    /// transactions must all be pending, each exactly once; they leave the
    /// mempool when the block is appended. On success the message carries
    /// the block hash.
    pub fn add_block(&self, block: Block) -> Validation {
        let mut state = self.write();

        let (tip_hash, tip_index) = {
            let tip = state.tip();
            (tip.hash.clone(), tip.index)
        };

        let validation = block
            .is_valid_with(self.crypto.as_ref(), &tip_hash, tip_index, state.difficulty(), FEE_PER_TX)
            .context("Invalid block");
        if !validation.success {
            warn!("Rejected block #{}: {}", block.index, validation.message);
            return validation;
        }

        if let Some(reward) = block.fee_transaction() {
            if state.contains_transaction(&reward.hash) {
                warn!("Rejected block #{}: fee tx {} already recorded", block.index, reward.hash);
                return Validation::fail(FailureKind::Consistency, "Duplicated fee tx in blockchain.");
            }
        }

        let consumed: Vec<&str> = block
            .transactions
            .iter()
            .filter(|tx| !tx.is_fee())
            .map(|tx| tx.hash.as_str())
            .collect();

        let remaining: Vec<Transaction> = state
            .mempool
            .iter()
            .filter(|tx| !consumed.contains(&tx.hash.as_str()))
            .cloned()
            .collect();

        if remaining.len() + consumed.len() != state.mempool.len() {
            warn!("Rejected block #{}: transactions do not match the mempool", block.index);
            return Validation::fail(FailureKind::Consistency, "Invalid tx in block: mempool mismatch.");
        }

        debug!("Block #{} consumed {} pending tx", block.index, consumed.len());
        state.mempool = remaining;
        state.next_index += 1;

        let hash = block.hash.clone();
        info!("Appended block #{} {}", block.index, hash);
        state.blocks.push(block);

        Validation::ok_with(hash)
    }

    pub fn get_block(&self, hash: &str) -> Option<Block> {
        self.read().blocks.iter().find(|block| block.hash == hash).cloned()
    }

    pub fn get_block_by_index(&self, index: u64) -> Option<Block> {
        let state = self.read();
        usize::try_from(index)
            .ok()
            .and_then(|i| state.blocks.get(i))
            .cloned()
    }

    /// Looks a transaction up in the mempool first, then block by block
    pub fn get_transaction(&self, hash: &str) -> TransactionSearch {
        let state = self.read();

        if let Some(position) = state.mempool.iter().position(|tx| tx.hash == hash) {
            return TransactionSearch {
                mempool_index: position as i64,
                block_index: -1,
                transaction: Some(state.mempool[position].clone()),
            };
        }

        for (position, block) in state.blocks.iter().enumerate() {
            if let Some(tx) = block.transactions.iter().find(|tx| tx.hash == hash) {
                return TransactionSearch {
                    mempool_index: -1,
                    block_index: position as i64,
                    transaction: Some(tx.clone()),
                };
            }
        }

        TransactionSearch::not_found()
    }

    /// Validates every block against its predecessor, tip first
    ///
    /// Each block is checked at the difficulty that applied when it was
    /// appended. The first failure is returned, prefixed with the block's
    /// position.
    pub fn is_valid(&self) -> Validation {
        let state = self.read();

        for i in (1..state.blocks.len()).rev() {
            let current = &state.blocks[i];
            let previous = &state.blocks[i - 1];

            let validation = current.is_valid_with(
                self.crypto.as_ref(),
                &previous.hash,
                previous.index,
                difficulty_for_length(i),
                FEE_PER_TX,
            );
            if !validation.success {
                return validation.context(format!("Invalid block #{}", i));
            }
        }

        Validation::ok()
    }

    /// Mining template for the next block, or `None` when nothing is pending
    pub fn get_next_block(&self) -> Option<BlockInfo> {
        let state = self.read();

        if state.mempool.is_empty() {
            return None;
        }

        Some(BlockInfo {
            index: state.next_index,
            previous_hash: state.tip().hash.clone(),
            difficulty: state.difficulty(),
            max_difficulty: MAX_DIFFICULTY,
            fee_per_tx: FEE_PER_TX,
            transactions: state.mempool.iter().take(TX_PER_BLOCK).cloned().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::crypto::tests::TrustingCrypto;
    use crate::blockchain::crypto::{DigitalSignature, Wallet};
    use crate::blockchain::transaction_input::TransactionInput;

    fn transfer(from: &Wallet, to: &Wallet, amount: u64) -> Transaction {
        let mut input = TransactionInput::new(from.address().clone(), amount, "abc");
        input.sign(from);
        Transaction::new(vec![input], vec![TransactionOutput::new(to.address().clone(), amount - 1)])
    }

    /// A reward whose timestamp is offset by the chain length, so rewards for
    /// successive blocks never share a hash with each other or with genesis
    fn reward(blockchain: &Blockchain, miner: &Wallet) -> Transaction {
        let amount = policy::block_reward(blockchain.get_difficulty());
        Transaction::build(
            TransactionType::Fee,
            chrono::Utc::now().timestamp_millis() + blockchain.len() as i64,
            Vec::new(),
            vec![TransactionOutput::new(miner.address().clone(), amount)],
        )
    }

    /// Mines a block on the tip holding `transactions` plus a reward
    fn mine_on_tip(blockchain: &Blockchain, miner: &Wallet, mut transactions: Vec<Transaction>) -> Block {
        let tip = blockchain.get_last_block();
        transactions.push(reward(blockchain, miner));

        let mut block = Block::new(tip.index + 1, tip.hash, transactions);
        block.mine(blockchain.get_difficulty(), miner.address());
        block
    }

    #[test]
    fn test_new_blockchain() {
        let miner = Wallet::new();
        let blockchain = Blockchain::new(miner.address());
        let chain = blockchain.get_chain();

        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].index, 0);
        assert!(chain[0].previous_hash.is_empty());
        assert_eq!(chain[0].transactions.len(), 1);
        assert!(chain[0].transactions[0].is_fee());
        assert!(blockchain.is_valid().success);
    }

    #[test]
    fn test_two_sequential_blocks() {
        let miner = Wallet::new();
        let blockchain = Blockchain::new(miner.address());

        for _ in 0..2 {
            let block = mine_on_tip(&blockchain, &miner, vec![]);
            let validation = blockchain.add_block(block);
            assert!(validation.success, "{}", validation);
        }

        assert_eq!(blockchain.len(), 3);
        assert!(blockchain.is_valid().success);

        let chain = blockchain.get_chain();
        for i in 1..chain.len() {
            assert_eq!(chain[i].previous_hash, chain[i - 1].hash);
            assert_eq!(chain[i].index, chain[i - 1].index + 1);
        }
    }

    #[test]
    fn test_tampered_index_invalidates_chain() {
        let miner = Wallet::new();
        let blockchain = Blockchain::new(miner.address());
        blockchain.add_block(mine_on_tip(&blockchain, &miner, vec![]));

        blockchain.write().blocks[1].index = u64::MAX;

        let validation = blockchain.is_valid();
        assert!(!validation.success);
        assert!(validation.message.starts_with("Invalid block #1"));
        assert_eq!(validation.kind, Some(FailureKind::Structural));
    }

    #[test]
    fn test_add_block_rejects_stale_block() {
        let miner = Wallet::new();
        let blockchain = Blockchain::new(miner.address());
        let first = mine_on_tip(&blockchain, &miner, vec![]);
        let competing = mine_on_tip(&blockchain, &miner, vec![]);

        assert!(blockchain.add_block(first).success);
        let validation = blockchain.add_block(competing);
        assert!(!validation.success);
        assert!(validation.message.starts_with("Invalid block"));
        assert_eq!(blockchain.len(), 2);
    }

    #[test]
    fn test_add_transaction() {
        let miner = Wallet::new();
        let alice = Wallet::new();
        let bob = Wallet::new();
        let blockchain = Blockchain::new(miner.address());

        let tx = transfer(&alice, &bob, 10);
        let validation = blockchain.add_transaction(tx.clone());

        assert!(validation.success, "{}", validation);
        assert_eq!(validation.message, tx.hash);
        assert_eq!(blockchain.get_pending_transactions(), vec![tx]);
    }

    #[test]
    fn test_add_transaction_rejects_overspend() {
        let miner = Wallet::new();
        let alice = Wallet::new();
        let bob = Wallet::new();
        let blockchain = Blockchain::new(miner.address());

        let mut input = TransactionInput::new(alice.address().clone(), 10, "abc");
        input.sign(&alice);
        let tx = Transaction::new(vec![input], vec![TransactionOutput::new(bob.address().clone(), 11)]);

        assert!(!tx.is_valid(blockchain.get_difficulty(), FEE_PER_TX).success);
        let validation = blockchain.add_transaction(tx);
        assert!(!validation.success);
        assert_eq!(validation.kind, Some(FailureKind::Content));
        assert!(blockchain.get_pending_transactions().is_empty());
    }

    #[test]
    fn test_add_transaction_rejects_second_pending_from_same_sender() {
        let miner = Wallet::new();
        let alice = Wallet::new();
        let bob = Wallet::new();
        let blockchain = Blockchain::new(miner.address());

        assert!(blockchain.add_transaction(transfer(&alice, &bob, 10)).success);

        let validation = blockchain.add_transaction(transfer(&alice, &bob, 20));
        assert!(!validation.success);
        assert_eq!(validation.kind, Some(FailureKind::Consistency));
        assert_eq!(blockchain.get_pending_transactions().len(), 1);
    }

    #[test]
    fn test_add_transaction_rejects_duplicate_hash_in_chain() {
        let miner = Wallet::new();
        let alice = Wallet::new();
        let bob = Wallet::new();
        let blockchain = Blockchain::new(miner.address());

        let tx = transfer(&alice, &bob, 10);
        assert!(blockchain.add_transaction(tx.clone()).success);
        assert!(blockchain.add_block(mine_on_tip(&blockchain, &miner, vec![tx.clone()])).success);

        let validation = blockchain.add_transaction(tx);
        assert!(!validation.success);
        assert_eq!(validation.kind, Some(FailureKind::Consistency));
    }

    #[test]
    fn test_add_transaction_rejects_fee_tx() {
        let miner = Wallet::new();
        let blockchain = Blockchain::new(miner.address());

        let validation = blockchain.add_transaction(reward(&blockchain, &miner));
        assert!(!validation.success);
    }

    #[test]
    fn test_add_block_consumes_pending_transactions() {
        let miner = Wallet::new();
        let bob = Wallet::new();
        let senders: Vec<Wallet> = (0..3).map(|_| Wallet::new()).collect();
        let blockchain = Blockchain::new(miner.address());

        let txs: Vec<Transaction> = senders.iter().map(|s| transfer(s, &bob, 10)).collect();
        for tx in &txs {
            assert!(blockchain.add_transaction(tx.clone()).success);
        }

        let info = blockchain.get_next_block().unwrap();
        assert_eq!(info.transactions, txs[..TX_PER_BLOCK].to_vec());

        let mut block = Block::from_block_info(&info);
        block.transactions.push(reward(&blockchain, &miner));
        block.mine(info.difficulty, miner.address());

        let validation = blockchain.add_block(block.clone());
        assert!(validation.success, "{}", validation);
        assert_eq!(validation.message, block.hash);

        assert_eq!(blockchain.get_pending_transactions(), vec![txs[2].clone()]);

        let found = blockchain.get_transaction(&txs[0].hash);
        assert_eq!(found.mempool_index, -1);
        assert_eq!(found.block_index, 1);
        assert_eq!(found.transaction, Some(txs[0].clone()));

        let pending = blockchain.get_transaction(&txs[2].hash);
        assert_eq!(pending.mempool_index, 0);
        assert_eq!(pending.block_index, -1);
    }

    #[test]
    fn test_add_block_rejects_unknown_transaction() {
        let miner = Wallet::new();
        let alice = Wallet::new();
        let bob = Wallet::new();
        let blockchain = Blockchain::new(miner.address());

        let block = mine_on_tip(&blockchain, &miner, vec![transfer(&alice, &bob, 10)]);
        let validation = blockchain.add_block(block);

        assert!(!validation.success);
        assert_eq!(validation.kind, Some(FailureKind::Consistency));
        assert_eq!(blockchain.len(), 1);
    }

    #[test]
    fn test_add_block_rejects_repeated_transaction() {
        let miner = Wallet::new();
        let alice = Wallet::new();
        let bob = Wallet::new();
        let blockchain = Blockchain::new(miner.address());

        let tx = transfer(&alice, &bob, 10);
        assert!(blockchain.add_transaction(tx.clone()).success);

        let block = mine_on_tip(&blockchain, &miner, vec![tx.clone(), tx]);
        let validation = blockchain.add_block(block);

        assert!(!validation.success);
        assert_eq!(validation.kind, Some(FailureKind::Consistency));
        assert_eq!(blockchain.get_pending_transactions().len(), 1);
    }

    #[test]
    fn test_add_block_rejects_replayed_reward() {
        let miner = Wallet::new();
        let blockchain = Blockchain::new(miner.address());
        let replayed = reward(&blockchain, &miner);

        let tip = blockchain.get_last_block();
        let mut first = Block::new(tip.index + 1, tip.hash, vec![replayed.clone()]);
        first.mine(blockchain.get_difficulty(), miner.address());
        assert!(blockchain.add_block(first).success);

        let tip = blockchain.get_last_block();
        let mut second = Block::new(tip.index + 1, tip.hash, vec![replayed.clone()]);
        second.mine(blockchain.get_difficulty(), miner.address());

        let validation = blockchain.add_block(second);
        assert!(!validation.success);
        assert_eq!(validation.kind, Some(FailureKind::Consistency));
        assert_eq!(blockchain.len(), 2);
        assert_eq!(blockchain.get_transaction(&replayed.hash).block_index, 1);
        assert!(blockchain.is_valid().success);
    }

    #[test]
    fn test_add_block_rejects_genesis_reward() {
        let miner = Wallet::new();
        let blockchain = Blockchain::new(miner.address());
        let genesis_reward = blockchain.get_last_block().transactions[0].clone();

        let tip = blockchain.get_last_block();
        let mut block = Block::new(tip.index + 1, tip.hash, vec![genesis_reward]);
        block.mine(blockchain.get_difficulty(), miner.address());

        let validation = blockchain.add_block(block);
        assert!(!validation.success);
        assert_eq!(validation.kind, Some(FailureKind::Consistency));
        assert_eq!(blockchain.len(), 1);
    }

    #[test]
    fn test_custom_crypto_flows_through_chain() {
        let miner = Wallet::new();
        let alice = Wallet::new();
        let bob = Wallet::new();
        let blockchain = Blockchain::with_crypto(Arc::new(TrustingCrypto), miner.address());
        assert!(blockchain.is_valid().success);

        // Signed by nobody; only a trusting provider accepts it
        let mut input = TransactionInput::new(alice.address().clone(), 10, "abc");
        input.signature = Some(DigitalSignature("unchecked".to_string()));
        let tx = Transaction::new(vec![input], vec![TransactionOutput::new(bob.address().clone(), 9)]);

        assert!(!Blockchain::new(miner.address()).add_transaction(tx.clone()).success);

        let validation = blockchain.add_transaction(tx.clone());
        assert!(validation.success, "{}", validation);

        let block = mine_on_tip(&blockchain, &miner, vec![tx.clone()]);
        let validation = blockchain.add_block(block);
        assert!(validation.success, "{}", validation);

        assert_eq!(blockchain.get_transaction(&tx.hash).block_index, 1);
        assert!(blockchain.get_pending_transactions().is_empty());
        assert!(blockchain.is_valid().success);
    }

    #[test]
    fn test_get_block() {
        let miner = Wallet::new();
        let blockchain = Blockchain::new(miner.address());
        let genesis = blockchain.get_last_block();

        assert_eq!(blockchain.get_block(&genesis.hash), Some(genesis.clone()));
        assert_eq!(blockchain.get_block_by_index(0), Some(genesis));
        assert_eq!(blockchain.get_block("missing"), None);
        assert_eq!(blockchain.get_block_by_index(1), None);
    }

    #[test]
    fn test_get_unknown_transaction() {
        let miner = Wallet::new();
        let blockchain = Blockchain::new(miner.address());

        let search = blockchain.get_transaction("missing");
        assert_eq!(search.mempool_index, -1);
        assert_eq!(search.block_index, -1);
        assert!(!search.is_found());
    }

    #[test]
    fn test_next_block_template() {
        let miner = Wallet::new();
        let alice = Wallet::new();
        let bob = Wallet::new();
        let blockchain = Blockchain::new(miner.address());

        assert!(blockchain.get_next_block().is_none());

        assert!(blockchain.add_transaction(transfer(&alice, &bob, 10)).success);
        let info = blockchain.get_next_block().unwrap();

        assert_eq!(info.index, blockchain.len() as u64);
        assert_eq!(info.previous_hash, blockchain.get_last_block().hash);
        assert_eq!(info.difficulty, blockchain.get_difficulty());
        assert_eq!(info.max_difficulty, MAX_DIFFICULTY);
        assert_eq!(info.fee_per_tx, blockchain.get_fee_per_tx());
        assert_eq!(info.transactions.len(), 1);
    }

    #[test]
    fn test_difficulty_rises_with_length() {
        let miner = Wallet::new();
        let blockchain = Blockchain::new(miner.address());
        assert_eq!(blockchain.get_difficulty(), 1);

        while blockchain.len() < policy::DIFFICULTY_FACTOR as usize {
            assert!(blockchain.add_block(mine_on_tip(&blockchain, &miner, vec![])).success);
        }

        assert_eq!(blockchain.get_difficulty(), 2);
        let block = mine_on_tip(&blockchain, &miner, vec![]);
        assert!(block.hash.starts_with("00"));
        assert!(blockchain.add_block(block).success);
        assert!(blockchain.is_valid().success);
    }

    #[test]
    fn test_concurrent_submissions_are_serialized() {
        let miner = Wallet::new();
        let bob = Wallet::new();
        let blockchain = Arc::new(Blockchain::new(miner.address()));

        let alice = Wallet::new();
        let txs: Vec<Transaction> = (0..8)
            .map(|i| {
                let mut input = TransactionInput::new(alice.address().clone(), 10 + i, "abc");
                input.sign(&alice);
                Transaction::new(vec![input], vec![TransactionOutput::new(bob.address().clone(), 5)])
            })
            .collect();

        let accepted: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = txs
                .into_iter()
                .map(|tx| {
                    let blockchain = blockchain.clone();
                    scope.spawn(move || blockchain.add_transaction(tx).success)
                })
                .collect();

            handles.into_iter().map(|h| h.join().unwrap() as usize).sum()
        });

        // All share one sender, so exactly one can be pending
        assert_eq!(accepted, 1);
        assert_eq!(blockchain.get_pending_transactions().len(), 1);
    }
}
