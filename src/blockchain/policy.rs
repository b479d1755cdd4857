//! Chain-wide constants and the reward policy

/// Number of blocks per difficulty step
pub const DIFFICULTY_FACTOR: u64 = 5;

/// Ceiling for the proof-of-work difficulty (leading zero hex characters)
pub const MAX_DIFFICULTY: u32 = 62;

/// Fixed fee expected per transaction
pub const FEE_PER_TX: u64 = 1;

/// Maximum number of mempool transactions handed out in one template
pub const TX_PER_BLOCK: usize = 2;

/// Nonce attempts between two cancellation checks while mining
pub const CANCEL_CHECK_INTERVAL: u64 = 1024;

/// Difficulty a block must meet when appended to a chain of `chain_len` blocks
pub fn difficulty_for_length(chain_len: usize) -> u32 {
    let step = chain_len as u64 / DIFFICULTY_FACTOR + 1;
    step.min(MAX_DIFFICULTY as u64) as u32
}

/// Base reward for mining a block at `difficulty`
pub fn block_reward(difficulty: u32) -> u64 {
    (64u64.saturating_sub(difficulty as u64)) * 10
}

/// Upper bound for the amount of a block's FEE transaction
pub fn max_reward(difficulty: u32, fee_per_tx: u64) -> u64 {
    block_reward(difficulty) + fee_per_tx * TX_PER_BLOCK as u64
}

/// The zero-prefix a block hash needs at `difficulty`
pub fn pow_prefix(difficulty: u32) -> String {
    "0".repeat(difficulty as usize)
}
