// Blockchain module
//
// This module contains the ledger core:
// - Validation results
// - Wallets and the hashing/signature provider
// - Transaction inputs, outputs and transactions
// - Blocks and proof of work
// - The blockchain with its mempool

pub mod block;
pub mod chain;
pub mod crypto;
pub mod policy;
pub mod transaction;
pub mod transaction_input;
pub mod transaction_output;
pub mod validation;

// Re-export main components for easier access
pub use block::{Block, BlockInfo};
pub use chain::{Blockchain, TransactionSearch};
pub use crypto::{Address, CryptoProvider, DigitalSignature, Sha256Ed25519, Wallet};
pub use transaction::{Transaction, TransactionType};
pub use transaction_input::TransactionInput;
pub use transaction_output::TransactionOutput;
pub use validation::{FailureKind, Validation};
