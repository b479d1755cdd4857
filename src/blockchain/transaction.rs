use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use std::fmt;

use super::crypto::{CryptoProvider, Sha256Ed25519};
use super::policy;
use super::transaction_input::TransactionInput;
use super::transaction_output::TransactionOutput;
use super::validation::{FailureKind, Validation};

/// Kind of transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Moves value from inputs to outputs
    Regular,
    /// Mining reward: no inputs, one output
    Fee,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionType::Regular => write!(f, "REGULAR"),
            TransactionType::Fee => write!(f, "FEE"),
        }
    }
}

/// Represents a transaction in the blockchain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(rename = "type")]
    pub tx_type: TransactionType,

    /// Creation time in milliseconds since the Unix epoch
    pub timestamp: i64,

    pub hash: String,

    /// Claimed outputs; always empty for FEE transactions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tx_inputs: Vec<TransactionInput>,

    pub tx_outputs: Vec<TransactionOutput>,
}

impl Transaction {
    /// Creates a REGULAR transaction stamped now, with its hash computed and
    /// its outputs bound to that hash
    ///
    /// Inputs must already be signed; their signatures are not part of the hash.
    pub fn new(tx_inputs: Vec<TransactionInput>, tx_outputs: Vec<TransactionOutput>) -> Self {
        Self::build(TransactionType::Regular, Utc::now().timestamp_millis(), tx_inputs, tx_outputs)
    }

    /// Creates a FEE transaction wrapping a single reward output
    ///
    /// # Arguments
    ///
    /// * `output` - The reward paid to the miner
    ///
    /// # Returns
    ///
    /// A finalized FEE transaction stamped now, with `output` bound to its hash
    pub fn from_reward(output: TransactionOutput) -> Self {
        Self::build(TransactionType::Fee, Utc::now().timestamp_millis(), Vec::new(), vec![output])
    }

    /// Creates a transaction from explicit fields and finalizes it
    pub fn build(
        tx_type: TransactionType,
        timestamp: i64,
        tx_inputs: Vec<TransactionInput>,
        tx_outputs: Vec<TransactionOutput>,
    ) -> Self {
        let mut transaction = Transaction {
            tx_type,
            timestamp,
            hash: String::new(),
            tx_inputs,
            tx_outputs,
        };

        transaction.finalize();
        transaction
    }

    /// Recomputes the hash and binds every output to it
    pub fn finalize(&mut self) {
        self.finalize_with(&Sha256Ed25519);
    }

    pub fn finalize_with(&mut self, crypto: &dyn CryptoProvider) {
        self.hash = self.hash_with(crypto);
        for output in &mut self.tx_outputs {
            output.tx = self.hash.clone();
        }
    }

    pub fn get_hash(&self) -> String {
        self.hash_with(&Sha256Ed25519)
    }

    /// Hash over type, input hashes, output hashes and timestamp, in order
    pub fn hash_with(&self, crypto: &dyn CryptoProvider) -> String {
        let inputs: String = self.tx_inputs.iter().map(|i| i.hash_with(crypto)).collect();
        let outputs: String = self.tx_outputs.iter().map(|o| o.hash_with(crypto)).collect();

        crypto.digest(&format!("{}{}{}{}", self.tx_type, inputs, outputs, self.timestamp))
    }

    pub fn total_input(&self) -> u64 {
        self.tx_inputs.iter().fold(0u64, |acc, i| acc.saturating_add(i.amount))
    }

    pub fn total_output(&self) -> u64 {
        self.tx_outputs.iter().fold(0u64, |acc, o| acc.saturating_add(o.amount))
    }

    /// Value left to the miner: inputs minus outputs, 0 without inputs
    pub fn get_fee(&self) -> u64 {
        if self.tx_inputs.is_empty() {
            return 0;
        }

        self.total_input().saturating_sub(self.total_output())
    }

    pub fn is_fee(&self) -> bool {
        self.tx_type == TransactionType::Fee
    }

    pub fn is_valid(&self, difficulty: u32, fee_per_tx: u64) -> Validation {
        self.is_valid_with(&Sha256Ed25519, difficulty, fee_per_tx)
    }

    pub fn is_valid_with(&self, crypto: &dyn CryptoProvider, difficulty: u32, fee_per_tx: u64) -> Validation {
        if self.hash != self.hash_with(crypto) {
            return Validation::fail(FailureKind::Structural, "Invalid hash.");
        }

        let validation = match self.tx_type {
            TransactionType::Regular => self.validate_regular(crypto),
            TransactionType::Fee => self.validate_reward(difficulty, fee_per_tx),
        };
        if !validation.success {
            return validation;
        }

        if self.tx_outputs.iter().any(|o| o.tx != self.hash) {
            return Validation::fail(FailureKind::Consistency, "Invalid TXO reference hash.");
        }

        Validation::ok()
    }

    fn validate_regular(&self, crypto: &dyn CryptoProvider) -> Validation {
        if self.tx_inputs.is_empty() || self.tx_outputs.is_empty() {
            return Validation::fail(FailureKind::Content, "Inputs and outputs are required.");
        }

        if self.total_output() > self.total_input() {
            return Validation::fail(
                FailureKind::Content,
                format!(
                    "Outputs ({}) exceed inputs ({}).",
                    self.total_output(),
                    self.total_input()
                ),
            );
        }

        for input in &self.tx_inputs {
            let validation = input.is_valid_with(crypto);
            if !validation.success {
                return validation.context("Invalid tx input");
            }
        }

        for output in &self.tx_outputs {
            let validation = output.is_valid();
            if !validation.success {
                return validation.context("Invalid tx output");
            }
        }

        Validation::ok()
    }

    fn validate_reward(&self, difficulty: u32, fee_per_tx: u64) -> Validation {
        if !self.tx_inputs.is_empty() {
            return Validation::fail(FailureKind::Content, "Fee tx must not have inputs.");
        }

        let output = match self.tx_outputs.as_slice() {
            [output] => output,
            _ => return Validation::fail(FailureKind::Content, "Fee tx must have exactly one output."),
        };

        let validation = output.is_valid();
        if !validation.success {
            return validation.context("Invalid tx output");
        }

        let cap = policy::max_reward(difficulty, fee_per_tx);
        if output.amount > cap {
            return Validation::fail(
                FailureKind::Content,
                format!("Invalid tx reward: {} exceeds {}.", output.amount, cap),
            );
        }

        Validation::ok()
    }
}
