// Background miner
//
// Polls the ledger for a block template, mines it on a blocking thread and
// submits the result. A job is abandoned as soon as the chain grows past
// the template's height.

use log::{debug, error, info, warn};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::blockchain::policy;
use crate::blockchain::{Block, BlockInfo, Blockchain, Transaction, TransactionOutput, Validation, Wallet};

/// Result of one mining round
#[derive(Debug)]
pub enum MiningOutcome {
    /// Nothing pending, no template was offered
    NoTemplate,
    /// Another block took the template's height first
    Cancelled,
    /// The mined block was appended; carries its hash
    Accepted(String),
    /// The ledger refused the mined block
    Rejected(Validation),
    /// The mining thread died
    Failed(String),
}

/// Miner session: the rewarded wallet and running totals
pub struct Miner {
    blockchain: Arc<Blockchain>,
    wallet: Wallet,
    poll_interval: Duration,
    blocks_mined: u64,
}

impl Miner {
    pub fn new(blockchain: Arc<Blockchain>, wallet: Wallet, poll_interval: Duration) -> Self {
        Miner {
            blockchain,
            wallet,
            poll_interval,
            blocks_mined: 0,
        }
    }

    pub fn blocks_mined(&self) -> u64 {
        self.blocks_mined
    }

    /// Builds the unmined block for `info`, paying the reward to this miner
    pub fn prepare(&self, info: &BlockInfo) -> Block {
        let fees = info.fee_per_tx * info.transactions.len() as u64;
        let amount = (policy::block_reward(info.difficulty) + fees)
            .min(policy::max_reward(info.difficulty, info.fee_per_tx));

        let mut block = Block::from_block_info(info);
        let mut reward = Transaction::from_reward(TransactionOutput::new(self.wallet.address().clone(), amount));
        reward.finalize_with(self.blockchain.crypto().as_ref());
        block.transactions.push(reward);
        block
    }

    /// True once the chain already holds a block at the template's height
    pub fn is_stale(&self, info: &BlockInfo) -> bool {
        self.blockchain.len() as u64 > info.index
    }

    /// Runs one poll-mine-submit round
    pub async fn mine_once(&mut self) -> MiningOutcome {
        let info = match self.blockchain.get_next_block() {
            Some(info) => info,
            None => return MiningOutcome::NoTemplate,
        };

        info!(
            "Mining block #{} with {} tx at difficulty {}",
            info.index,
            info.transactions.len(),
            info.difficulty
        );

        let cancel = Arc::new(AtomicBool::new(false));
        let mut job = {
            let mut block = self.prepare(&info);
            let crypto = self.blockchain.crypto();
            let miner = self.wallet.address().clone();
            let difficulty = info.difficulty;
            let cancel = cancel.clone();

            tokio::task::spawn_blocking(move || {
                block
                    .mine_cancellable(crypto.as_ref(), difficulty, &miner, &cancel)
                    .then_some(block)
            })
        };

        let mut watch = tokio::time::interval(self.poll_interval);
        let mined = loop {
            tokio::select! {
                result = &mut job => break result,
                _ = watch.tick() => {
                    if self.is_stale(&info) && !cancel.swap(true, Ordering::Relaxed) {
                        debug!("Block #{} taken by another miner, cancelling", info.index);
                    }
                }
            }
        };

        let block = match mined {
            Ok(Some(block)) => block,
            Ok(None) => return MiningOutcome::Cancelled,
            Err(err) => return MiningOutcome::Failed(err.to_string()),
        };

        let validation = self.blockchain.add_block(block);
        if validation.success {
            self.blocks_mined += 1;
            info!("Block accepted, total mined: {}", self.blocks_mined);
            MiningOutcome::Accepted(validation.message)
        } else {
            MiningOutcome::Rejected(validation)
        }
    }

    /// Mines forever, pausing `poll_interval` between rounds
    pub async fn run(mut self) {
        info!("Miner started for {}", self.wallet.address());

        loop {
            match self.mine_once().await {
                MiningOutcome::NoTemplate => debug!("No tx to mine"),
                MiningOutcome::Cancelled => info!("Mining job cancelled"),
                MiningOutcome::Accepted(hash) => debug!("Accepted block {}", hash),
                MiningOutcome::Rejected(validation) => warn!("Mined block rejected: {}", validation),
                MiningOutcome::Failed(err) => error!("Mining thread failed: {}", err),
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
