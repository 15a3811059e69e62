//! Operation-kind descriptors.
//!
//! The four hook flows differ only in which derivation they use, which
//! constraint program proves the spend and how the public signals are
//! named. Everything downstream is driven from [`OperationDescriptor`]
//! instead of per-kind code paths.

use std::fmt;

use alloy_primitives::{Address, U256};
use ark_bn254::Fr;
use ark_std::rand::{CryptoRng, RngCore};
use ark_std::UniformRand;
use serde::{Deserialize, Serialize};

pub use unizwap_prover::CircuitId;

use crate::calldata::PoolKey;
use crate::error::PrivacyError;
use crate::field::{address_to_field, parse_field, u256_to_field};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    /// Vault deposit plus swap; output held under a commitment.
    Vault,
    /// Router swap with the output held under a commitment.
    Router,
    /// Private LP position mint.
    LpAdd,
    /// Private LP position removal.
    LpRemove,
}

impl OperationKind {
    pub const ALL: [OperationKind; 4] = [
        OperationKind::Vault,
        OperationKind::Router,
        OperationKind::LpAdd,
        OperationKind::LpRemove,
    ];

    pub fn descriptor(self) -> &'static OperationDescriptor {
        match self {
            OperationKind::Vault => &VAULT,
            OperationKind::Router => &ROUTER,
            OperationKind::LpAdd => &LP_ADD,
            OperationKind::LpRemove => &LP_REMOVE,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OperationKind::Vault => "vault",
            OperationKind::Router => "router",
            OperationKind::LpAdd => "lp-add",
            OperationKind::LpRemove => "lp-remove",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Commitment family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Derivation {
    /// `H3(token, amount, H2(secret, nonce))`, nullifier `nonce`.
    TokenAmount,
    /// `H3(secret, nonce, positionId)`, nullifier `H2(secret, positionId)`.
    Position,
}

#[derive(Debug)]
pub struct OperationDescriptor {
    pub kind: OperationKind,
    /// Constraint program proving a spend; `None` for commitment-only kinds.
    pub circuit: Option<CircuitId>,
    /// Public signal names, in verifier order.
    pub public_layout: &'static [&'static str],
    pub derivation: Derivation,
    /// Whether this kind inserts a leaf through a hook call.
    pub originates: bool,
}

/// Private witness fields shared by both constraint programs.
pub const PRIVATE_LAYOUT: [&str; 4] = ["secret", "nonce", "merkle_pathIndices", "merkle_path"];

const SWAP_LAYOUT: &[&str] = &["merkle_root", "nullifier", "token_address", "deposit_amount"];

const REMOVE_LAYOUT: &[&str] = &[
    "merkle_root",
    "nullifier",
    "tokenAAddress",
    "tokenBAddress",
    "tokenId",
    "liquidityAmount",
];

static VAULT: OperationDescriptor = OperationDescriptor {
    kind: OperationKind::Vault,
    circuit: Some(CircuitId::SwapWithdraw),
    public_layout: SWAP_LAYOUT,
    derivation: Derivation::TokenAmount,
    originates: true,
};

static ROUTER: OperationDescriptor = OperationDescriptor {
    kind: OperationKind::Router,
    circuit: Some(CircuitId::SwapWithdraw),
    public_layout: SWAP_LAYOUT,
    derivation: Derivation::TokenAmount,
    originates: true,
};

static LP_ADD: OperationDescriptor = OperationDescriptor {
    kind: OperationKind::LpAdd,
    circuit: None,
    public_layout: &[],
    derivation: Derivation::Position,
    originates: true,
};

static LP_REMOVE: OperationDescriptor = OperationDescriptor {
    kind: OperationKind::LpRemove,
    circuit: Some(CircuitId::RemoveLiquidity),
    public_layout: REMOVE_LAYOUT,
    derivation: Derivation::Position,
    originates: false,
};

impl OperationDescriptor {
    pub fn is_spendable(&self) -> bool {
        self.circuit.is_some()
    }

    /// The constraint program, or an input error for commitment-only kinds.
    pub fn require_circuit(&self) -> Result<CircuitId, PrivacyError> {
        self.circuit.ok_or_else(|| {
            PrivacyError::input(format!("{} has no spend proof", self.kind))
        })
    }
}

/// The `(secret, nonce)` pair. Never logged.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SecretMaterial {
    pub secret: Fr,
    pub nonce: Fr,
}

impl fmt::Debug for SecretMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretMaterial { .. }")
    }
}

impl SecretMaterial {
    pub fn new(secret: Fr, nonce: Fr) -> Self {
        Self { secret, nonce }
    }

    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self {
            secret: Fr::rand(rng),
            nonce: Fr::rand(rng),
        }
    }

    pub fn parse(secret: &str, nonce: &str) -> Result<Self, PrivacyError> {
        Ok(Self {
            secret: parse_field("secret", secret)?,
            nonce: parse_field("nonce", nonce)?,
        })
    }
}

/// Public parameters bound into a commitment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OperationParams {
    /// Vault and router: the output token and amount.
    Token { token: Address, amount: U256 },
    /// LP add: the position NFT id.
    Position { position_id: U256 },
    /// LP remove: the position plus what the verifier needs to release it.
    RemovePosition {
        pool: PoolKey,
        position_id: U256,
        liquidity: u128,
        recipient: Address,
    },
}

impl OperationParams {
    /// Reject parameter shapes that do not belong to `kind`.
    pub fn check_kind(&self, kind: OperationKind) -> Result<(), PrivacyError> {
        let ok = matches!(
            (kind, self),
            (OperationKind::Vault, OperationParams::Token { .. })
                | (OperationKind::Router, OperationParams::Token { .. })
                | (OperationKind::LpAdd, OperationParams::Position { .. })
                | (OperationKind::LpRemove, OperationParams::RemovePosition { .. })
        );
        if ok {
            Ok(())
        } else {
            Err(PrivacyError::input(format!(
                "parameters do not match operation kind {}",
                kind
            )))
        }
    }

    /// `(token, amount)` as field elements.
    pub fn token_fields(&self) -> Result<(Fr, Fr), PrivacyError> {
        match self {
            OperationParams::Token { token, amount } => {
                Ok((address_to_field(*token), u256_to_field("amount", *amount)?))
            }
            _ => Err(PrivacyError::input("expected token parameters")),
        }
    }

    pub fn position_id(&self) -> Result<Fr, PrivacyError> {
        match self {
            OperationParams::Position { position_id }
            | OperationParams::RemovePosition { position_id, .. } => {
                u256_to_field("position_id", *position_id)
            }
            OperationParams::Token { .. } => Err(PrivacyError::input("expected position parameters")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_std::rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_descriptor_table() {
        for kind in OperationKind::ALL {
            let descriptor = kind.descriptor();
            assert_eq!(descriptor.kind, kind);
            match descriptor.circuit {
                Some(circuit) => assert_eq!(descriptor.public_layout.len(), circuit.public_input_count()),
                None => assert!(descriptor.public_layout.is_empty()),
            }
        }
        assert_eq!(OperationKind::Vault.descriptor().public_layout, OperationKind::Router.descriptor().public_layout);
        assert!(OperationKind::LpAdd.descriptor().require_circuit().is_err());
    }

    #[test]
    fn test_kind_serde_names() {
        assert_eq!(serde_json::to_string(&OperationKind::LpRemove).unwrap(), "\"lp-remove\"");
        let kind: OperationKind = serde_json::from_str("\"router\"").unwrap();
        assert_eq!(kind, OperationKind::Router);
    }

    #[test]
    fn test_params_must_match_kind() {
        let params = OperationParams::Position { position_id: U256::from(7u64) };
        assert!(params.check_kind(OperationKind::LpAdd).is_ok());
        assert!(params.check_kind(OperationKind::Vault).is_err());
        assert!(params.token_fields().is_err());
    }

    #[test]
    fn test_params_json_shape() {
        let params: OperationParams = serde_json::from_str(
            r#"{"type":"token","token":"0xf335a9b58f2aa6a2f884d2da4e308f7378a4cf7e","amount":"0x3e8"}"#,
        )
        .unwrap();
        let (_, amount) = params.token_fields().unwrap();
        assert_eq!(amount, Fr::from(1000u64));
    }

    #[test]
    fn test_secret_material_debug_is_redacted() {
        let mut rng = StdRng::seed_from_u64(1);
        let material = SecretMaterial::random(&mut rng);
        assert_eq!(format!("{:?}", material), "SecretMaterial { .. }");
        assert_ne!(material.secret, material.nonce);
    }
}
