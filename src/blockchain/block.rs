use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use std::sync::atomic::{AtomicBool, Ordering};

use super::crypto::{Address, CryptoProvider, Sha256Ed25519};
use super::policy::{pow_prefix, CANCEL_CHECK_INTERVAL};
use super::transaction::Transaction;
use super::validation::{FailureKind, Validation};

/// Template handed to a miner describing the next block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlockInfo {
    /// Index the mined block must carry
    pub index: u64,

    /// Hash of the current chain tip
    pub previous_hash: String,

    /// Difficulty the block must meet
    pub difficulty: u32,

    pub max_difficulty: u32,

    pub fee_per_tx: u64,

    /// Pending transactions to include, in mempool order
    pub transactions: Vec<Transaction>,
}

/// Represents a block in the blockchain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Index of the block in the chain
    pub index: u64,

    /// Creation time in milliseconds since the Unix epoch
    pub timestamp: i64,

    /// Hash of the previous block, empty for genesis
    #[serde(default)]
    pub previous_hash: String,

    /// Address of the miner, empty until mined
    #[serde(default)]
    pub miner: Address,

    /// Proof of work
    #[serde(default)]
    pub nonce: u64,

    pub hash: String,

    /// Transactions in the block, exactly one of them of type FEE
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Creates a new unmined block
    ///
    /// # Arguments
    ///
    /// * `index` - The index of the block in the chain
    /// * `previous_hash` - The hash of the previous block, empty for genesis
    /// * `transactions` - The transactions to include, exactly one of them of type FEE
    ///
    /// # Returns
    ///
    /// A block stamped now, with no miner and nonce 0
    pub fn new(index: u64, previous_hash: impl Into<String>, transactions: Vec<Transaction>) -> Self {
        let mut block = Block {
            index,
            timestamp: Utc::now().timestamp_millis(),
            previous_hash: previous_hash.into(),
            miner: Address::default(),
            nonce: 0,
            hash: String::new(),
            transactions,
        };

        block.hash = block.get_hash();
        block
    }

    /// Creates an unmined block from a mining template
    ///
    /// The template carries no FEE transaction; the miner adds its own
    /// before calling [`Block::mine`].
    pub fn from_block_info(info: &BlockInfo) -> Self {
        Self::new(info.index, info.previous_hash.clone(), info.transactions.clone())
    }

    pub fn get_hash(&self) -> String {
        self.hash_with(&Sha256Ed25519)
    }

    /// Hash over index, previous hash, timestamp, nonce, miner and the
    /// transaction hashes in order
    pub fn hash_with(&self, crypto: &dyn CryptoProvider) -> String {
        let transactions: String = self.transactions.iter().map(|tx| tx.hash.as_str()).collect();

        crypto.digest(&format!(
            "{}{}{}{}{}{}",
            self.index, self.previous_hash, self.timestamp, self.nonce, self.miner, transactions
        ))
    }

    /// Searches for a nonce whose hash meets `difficulty`
    ///
    /// Blocks the calling thread until a nonce is found. Run it off any
    /// latency-sensitive path, or use [`Block::mine_cancellable`].
    pub fn mine(&mut self, difficulty: u32, miner: &Address) {
        let never = AtomicBool::new(false);
        self.mine_cancellable(&Sha256Ed25519, difficulty, miner, &never);
    }

    /// Same search as [`Block::mine`], giving up once `cancel` is raised
    ///
    /// The flag is polled every [`CANCEL_CHECK_INTERVAL`] attempts. Returns
    /// false if the search was cancelled; the block is then left unmined.
    pub fn mine_cancellable(
        &mut self,
        crypto: &dyn CryptoProvider,
        difficulty: u32,
        miner: &Address,
        cancel: &AtomicBool,
    ) -> bool {
        let prefix = pow_prefix(difficulty);
        self.miner = miner.clone();
        self.nonce = 0;

        loop {
            self.nonce = self.nonce.wrapping_add(1);
            self.hash = self.hash_with(crypto);

            if self.hash.starts_with(&prefix) {
                return true;
            }

            if self.nonce % CANCEL_CHECK_INTERVAL == 0 && cancel.load(Ordering::Relaxed) {
                return false;
            }
        }
    }

    pub fn fee_transaction(&self) -> Option<&Transaction> {
        self.transactions.iter().find(|tx| tx.is_fee())
    }

    pub fn is_valid(&self, previous_hash: &str, previous_index: u64, difficulty: u32, fee_per_tx: u64) -> Validation {
        self.is_valid_with(&Sha256Ed25519, previous_hash, previous_index, difficulty, fee_per_tx)
    }

    /// Validates the block against its predecessor
    pub fn is_valid_with(
        &self,
        crypto: &dyn CryptoProvider,
        previous_hash: &str,
        previous_index: u64,
        difficulty: u32,
        fee_per_tx: u64,
    ) -> Validation {
        if previous_index.checked_add(1) != Some(self.index) {
            return Validation::fail(
                FailureKind::Structural,
                format!("Invalid index: expected {}, got {}.", previous_index.saturating_add(1), self.index),
            );
        }

        if self.previous_hash != previous_hash {
            return Validation::fail(FailureKind::Structural, "Invalid previous hash.");
        }

        if self.hash != self.hash_with(crypto) {
            return Validation::fail(FailureKind::Structural, "Invalid hash.");
        }

        if self.timestamp <= 0 {
            return Validation::fail(FailureKind::Temporal, "Invalid timestamp.");
        }

        let fees = self.transactions.iter().filter(|tx| tx.is_fee()).count();
        if fees != 1 {
            return Validation::fail(
                FailureKind::Content,
                format!("Block must have exactly one fee tx, found {}.", fees),
            );
        }

        if self.miner.is_empty() {
            return Validation::fail(FailureKind::ProofOfWork, "Block not mined.");
        }

        if !self.hash.starts_with(&pow_prefix(difficulty)) {
            return Validation::fail(FailureKind::ProofOfWork, "Invalid proof of work.");
        }

        for tx in &self.transactions {
            let validation = tx.is_valid_with(crypto, difficulty, fee_per_tx);
            if !validation.success {
                return validation.context(format!("Invalid tx in block {}", tx.hash));
            }
        }

        Validation::ok()
    }
}
