//! Error taxonomy for the privacy pipeline.
//!
//! Retry policy is encoded here rather than at call sites: only a stale
//! root (one rebuild) and transient ledger transport failures are ever
//! retried. Reverts are terminal per attempt.

use thiserror::Error;

use unizwap_prover::{ProveError, VerifyError};

use crate::pipeline::PipelineState;

/// Reasons the on-ledger verifier rejects a submission.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Revert {
    #[error("nullifier already used")]
    NullifierAlreadyUsed,
    #[error("unknown merkle root")]
    UnknownRoot,
    #[error("invalid proof")]
    InvalidProof,
    #[error("calldata does not match the verifier ABI: {0}")]
    AbiMismatch(String),
    #[error("merkle tree is full")]
    TreeFull,
}

/// Errors reported by a [`crate::Ledger`] implementation.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Network or node failure; the request may be repeated.
    #[error("ledger transport error: {0}")]
    Transport(String),
    #[error("transaction reverted: {0}")]
    Reverted(Revert),
    #[error("malformed ledger response: {0}")]
    Malformed(String),
}

impl LedgerError {
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::Transport(_))
    }
}

#[derive(Debug, Error)]
pub enum PrivacyError {
    /// Malformed secret, nonce, address or parameter. Never retried.
    #[error("invalid input: {0}")]
    Input(String),

    /// Wrong secret material, or the originating operation is not yet
    /// visible in the observed leaves.
    #[error("commitment {commitment} not found among {observed} observed leaves")]
    NotFound { commitment: String, observed: usize },

    /// The root the proof was built against left the acceptance window.
    #[error("merkle root {root} is no longer accepted by the ledger")]
    StaleRoot { root: String },

    /// Unsatisfiable witness, usually a layout mismatch.
    #[error("proof generation failed: {0}")]
    ProofGeneration(String),

    /// A freshly generated proof did not verify locally. Indicates a
    /// derivation or assembly bug; nothing was sent.
    #[error("proof failed off-chain verification")]
    OffChainVerification,

    #[error("on-chain revert: {0}")]
    OnChainRevert(Revert),

    /// Ledger unreachable after the configured retries.
    #[error("ledger unavailable: {0}")]
    Ledger(LedgerError),

    #[error("proving task cancelled")]
    Cancelled,

    #[error("pipeline cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        from: PipelineState,
        to: PipelineState,
    },
}

impl PrivacyError {
    pub fn input(msg: impl Into<String>) -> Self {
        PrivacyError::Input(msg.into())
    }

    /// Whether the orchestrator may retry automatically after this error.
    pub fn is_retryable(&self) -> bool {
        match self {
            PrivacyError::StaleRoot { .. } => true,
            PrivacyError::Ledger(e) => e.is_transient(),
            _ => false,
        }
    }
}

impl From<LedgerError> for PrivacyError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::Reverted(revert) => PrivacyError::OnChainRevert(revert),
            other => PrivacyError::Ledger(other),
        }
    }
}

impl From<ProveError> for PrivacyError {
    fn from(e: ProveError) -> Self {
        PrivacyError::ProofGeneration(e.to_string())
    }
}

impl From<VerifyError> for PrivacyError {
    fn from(e: VerifyError) -> Self {
        match e {
            VerifyError::InvalidInputs { .. } => PrivacyError::ProofGeneration(e.to_string()),
            VerifyError::Verification(_) => PrivacyError::OffChainVerification,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverts_surface_as_on_chain_errors() {
        let err: PrivacyError = LedgerError::Reverted(Revert::NullifierAlreadyUsed).into();
        assert!(matches!(err, PrivacyError::OnChainRevert(Revert::NullifierAlreadyUsed)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_retry_policy() {
        assert!(PrivacyError::StaleRoot { root: "0x01".into() }.is_retryable());
        assert!(PrivacyError::from(LedgerError::Transport("timeout".into())).is_retryable());
        assert!(!PrivacyError::from(LedgerError::Malformed("bad".into())).is_retryable());
        assert!(!PrivacyError::input("bad nonce").is_retryable());
        assert!(!PrivacyError::OffChainVerification.is_retryable());
    }
}
