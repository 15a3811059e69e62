//! Commitment and nullifier derivation per operation kind.

use ark_bn254::Fr;

use unizwap_circuits::{position_commitment, position_nullifier, token_commitment, token_nullifier};

use crate::error::PrivacyError;
use crate::operation::{Derivation, OperationKind, OperationParams, SecretMaterial};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Derived {
    pub commitment: Fr,
    pub nullifier: Fr,
}

/// Derive the leaf and the spend tag for `kind`. Pure and deterministic.
pub fn derive(
    kind: OperationKind,
    material: &SecretMaterial,
    params: &OperationParams,
) -> Result<Derived, PrivacyError> {
    params.check_kind(kind)?;

    let derived = match kind.descriptor().derivation {
        Derivation::TokenAmount => {
            let (token, amount) = params.token_fields()?;
            Derived {
                commitment: token_commitment(token, amount, material.secret, material.nonce),
                nullifier: token_nullifier(material.nonce),
            }
        }
        Derivation::Position => {
            let position_id = params.position_id()?;
            Derived {
                commitment: position_commitment(material.secret, material.nonce, position_id),
                nullifier: position_nullifier(material.secret, position_id),
            }
        }
    };
    Ok(derived)
}
