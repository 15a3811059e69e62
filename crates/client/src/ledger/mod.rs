//! Ledger port: the reads and writes the privacy layer needs from the chain.

mod memory;

pub use memory::MemoryLedger;

use std::future::Future;

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

use crate::calldata::Submission;
use crate::error::LedgerError;
use crate::hook::HookPayload;

/// One "leaf inserted" notification from a hook.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafInsertion {
    pub commitment: B256,
    pub leaf_index: u64,
    /// Tree root right after this insertion.
    pub new_root: B256,
    /// Ledger height of the inserting transaction.
    pub height: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub height: u64,
    pub nullifier: B256,
}

/// Access to the hooks' on-chain state.
///
/// Writes are single atomic transactions: they either apply completely or
/// revert with [`LedgerError::Reverted`].
pub trait Ledger: Send + Sync {
    fn tip_height(&self) -> impl Future<Output = Result<u64, LedgerError>> + Send;

    /// Insertions with `from <= height <= to`, in emission order.
    fn leaf_insertions(
        &self,
        from: u64,
        to: u64,
    ) -> impl Future<Output = Result<Vec<LeafInsertion>, LedgerError>> + Send;

    fn is_known_root(&self, root: B256) -> impl Future<Output = Result<bool, LedgerError>> + Send;

    fn is_nullifier_spent(
        &self,
        nullifier: B256,
    ) -> impl Future<Output = Result<bool, LedgerError>> + Send;

    /// Run an originating hook call; returns the insertion it emitted.
    fn execute(
        &self,
        payload: &HookPayload,
    ) -> impl Future<Output = Result<LeafInsertion, LedgerError>> + Send;

    fn submit(
        &self,
        submission: &Submission,
    ) -> impl Future<Output = Result<SubmitReceipt, LedgerError>> + Send;
}
