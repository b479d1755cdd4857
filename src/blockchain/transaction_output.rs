use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::crypto::{Address, CryptoProvider, Sha256Ed25519};
use super::validation::{FailureKind, Validation};

/// A value claim on an address, created by a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionOutput {
    /// Recipient of the value
    pub to_address: Address,

    /// Amount claimed
    pub amount: u64,

    /// Hash of the transaction that produced this output
    ///
    /// Empty until the owning transaction binds it.
    #[serde(default)]
    pub tx: String,
}

impl TransactionOutput {
    /// Creates an output that is not yet bound to a transaction
    pub fn new(to_address: Address, amount: u64) -> Self {
        TransactionOutput {
            to_address,
            amount,
            tx: String::new(),
        }
    }

    pub fn is_valid(&self) -> Validation {
        if self.amount == 0 {
            return Validation::fail(FailureKind::Content, "Amount must be greater than zero.");
        }

        Validation::ok()
    }

    pub fn get_hash(&self) -> String {
        self.hash_with(&Sha256Ed25519)
    }

    /// Hash over recipient and amount
    ///
    /// The `tx` back-reference is left out: the owning transaction's hash is
    /// built from this one, so including it would make binding impossible.
    pub fn hash_with(&self, crypto: &dyn CryptoProvider) -> String {
        crypto.digest(&format!("{}{}", self.to_address, self.amount))
    }
}
