//! Root-freshness check run right before submission.

use ark_bn254::Fr;
use tracing::warn;

use unizwap_circuits::field::fr_to_decimal;

use crate::error::PrivacyError;
use crate::field::field_to_b256;
use crate::ledger::Ledger;

/// Confirm `root` is still inside the ledger's accepted-root window.
///
/// Insertions by other parties between rebuild and submission rotate old
/// roots out; a proof against such a root would only burn a transaction.
pub async fn ensure_fresh<L: Ledger>(ledger: &L, root: &Fr) -> Result<(), PrivacyError> {
    if ledger.is_known_root(field_to_b256(root)).await? {
        return Ok(());
    }
    let root = fr_to_decimal(root);
    warn!(%root, "merkle root left the acceptance window");
    Err(PrivacyError::StaleRoot { root })
}
