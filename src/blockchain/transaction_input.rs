use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::crypto::{Address, CryptoProvider, DigitalSignature, Sha256Ed25519, Wallet};
use super::transaction_output::TransactionOutput;
use super::validation::{FailureKind, Validation};

/// A claim against a prior output, signed by the claimed source address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInput {
    /// Address the value is taken from
    pub from_address: Address,

    /// Amount claimed
    pub amount: u64,

    /// Hash of the transaction whose output is being claimed
    #[serde(default)]
    pub previous_tx: String,

    /// Signature over [`TransactionInput::get_hash`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<DigitalSignature>,
}

impl TransactionInput {
    /// Creates an unsigned input
    pub fn new(from_address: Address, amount: u64, previous_tx: impl Into<String>) -> Self {
        TransactionInput {
            from_address,
            amount,
            previous_tx: previous_tx.into(),
            signature: None,
        }
    }

    /// Creates an unsigned input claiming `output`
    ///
    /// The output's recipient becomes the source address and its producing
    /// transaction becomes the reference.
    pub fn from_txo(output: &TransactionOutput) -> Self {
        Self::new(output.to_address.clone(), output.amount, output.tx.clone())
    }

    pub fn get_hash(&self) -> String {
        self.hash_with(&Sha256Ed25519)
    }

    /// Hash over reference, source and amount; the signature is excluded
    pub fn hash_with(&self, crypto: &dyn CryptoProvider) -> String {
        crypto.digest(&format!("{}{}{}", self.previous_tx, self.from_address, self.amount))
    }

    /// Signs the input's hash with `wallet`
    pub fn sign(&mut self, wallet: &Wallet) {
        self.signature = Some(wallet.sign(&self.get_hash()));
    }

    pub fn is_valid(&self) -> Validation {
        self.is_valid_with(&Sha256Ed25519)
    }

    pub fn is_valid_with(&self, crypto: &dyn CryptoProvider) -> Validation {
        if self.previous_tx.is_empty() {
            return Validation::fail(FailureKind::Content, "Previous tx is required.");
        }

        if self.amount == 0 {
            return Validation::fail(FailureKind::Content, "Amount must be greater than zero.");
        }

        let signature = match &self.signature {
            Some(signature) => signature,
            None => return Validation::fail(FailureKind::Signature, "Signature is required."),
        };

        if !crypto.verify(&self.hash_with(crypto), signature, &self.from_address) {
            return Validation::fail(FailureKind::Signature, "Invalid tx input signature.");
        }

        Validation::ok()
    }
}
