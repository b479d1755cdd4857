use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use std::fmt;

/// Category of a failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    /// Hash, index or linkage mismatch
    Structural,
    /// Non-positive timestamp
    Temporal,
    /// Missing or non-positive amounts, wrong FEE transaction count, empty fields
    Content,
    /// Absent or non-verifying signature
    Signature,
    /// Proof-of-work target not met
    ProofOfWork,
    /// Mempool/chain mismatch, duplicate hash or duplicate pending sender
    Consistency,
}

/// Result of every fallible ledger operation
///
/// Failures travel as values, each layer prefixing its own context with
/// [`Validation::context`] before handing the result up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Validation {
    pub success: bool,

    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
}

impl Validation {
    pub fn ok() -> Self {
        Self::ok_with("")
    }

    /// Success carrying a payload message, e.g. the hash of what was accepted
    pub fn ok_with(message: impl Into<String>) -> Self {
        Validation {
            success: true,
            message: message.into(),
            kind: None,
        }
    }

    pub fn fail(kind: FailureKind, message: impl Into<String>) -> Self {
        Validation {
            success: false,
            message: message.into(),
            kind: Some(kind),
        }
    }

    /// Prefixes a failure's message, keeping its kind. Successes pass through.
    pub fn context(self, prefix: impl fmt::Display) -> Self {
        if self.success {
            return self;
        }

        Validation {
            message: format!("{}: {}", prefix, self.message),
            ..self
        }
    }

    pub fn is_ok(&self) -> bool {
        self.success
    }
}

impl Default for Validation {
    fn default() -> Self {
        Self::ok()
    }
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            Some(kind) => write!(f, "{:?}: {}", kind, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_prefixes_failures_only() {
        let failure = Validation::fail(FailureKind::Content, "Negative amount.")
            .context("Invalid tx output")
            .context("Invalid block #2");

        assert!(!failure.success);
        assert_eq!(failure.kind, Some(FailureKind::Content));
        assert_eq!(failure.message, "Invalid block #2: Invalid tx output: Negative amount.");

        let success = Validation::ok_with("abc").context("ignored");
        assert!(success.is_ok());
        assert_eq!(success.message, "abc");
    }

    #[test]
    fn test_serializes_without_kind_on_success() {
        let json = serde_json::to_value(Validation::ok()).unwrap();
        assert_eq!(json, serde_json::json!({ "success": true, "message": "" }));

        let json = serde_json::to_value(Validation::fail(FailureKind::ProofOfWork, "x")).unwrap();
        assert_eq!(json["kind"], "proofOfWork");
    }
}
