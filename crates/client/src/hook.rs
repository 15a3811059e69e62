//! Typed hook-data payloads for originating operations.
//!
//! The hooks decode `hookData` positionally, so each originating kind gets
//! one fixed shape that is validated before it is ABI-encoded.

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::{sol_data, SolType};
use ark_bn254::Fr;
use serde::{Deserialize, Serialize};

use crate::error::PrivacyError;
use crate::field::field_to_b256;
use crate::operation::OperationKind;

/// Longest referral tag the swap hooks store.
pub const MAX_REFERRAL_BYTES: usize = 32;

type SwapHookData = (
    sol_data::Address,
    sol_data::Uint<256>,
    sol_data::String,
    sol_data::Bool,
    sol_data::String,
    sol_data::FixedBytes<32>,
);

type LiquidityHookData = (sol_data::FixedBytes<32>,);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwapPattern {
    Vault,
    Router,
}

impl SwapPattern {
    pub fn as_str(self) -> &'static str {
        match self {
            SwapPattern::Vault => "vault",
            SwapPattern::Router => "router",
        }
    }

    fn from_wire(value: &str) -> Option<Self> {
        match value {
            "vault" => Some(SwapPattern::Vault),
            "router" => Some(SwapPattern::Router),
            _ => None,
        }
    }
}

/// Caller-chosen fields that are not derived from the commitment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HookContext {
    Swap {
        user: Address,
        min_output: U256,
        #[serde(default)]
        referral: String,
    },
    Liquidity,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HookPayload {
    Swap {
        pattern: SwapPattern,
        user: Address,
        min_output: U256,
        referral: String,
        active: bool,
        commitment: B256,
    },
    LiquidityAdd {
        commitment: B256,
    },
}

impl HookPayload {
    /// Pair an originating kind with its context. The swap pattern string
    /// follows from the kind, never from the caller.
    pub fn build(
        kind: OperationKind,
        commitment: Fr,
        context: HookContext,
    ) -> Result<Self, PrivacyError> {
        let commitment = field_to_b256(&commitment);
        let payload = match (kind, context) {
            (OperationKind::Vault | OperationKind::Router, HookContext::Swap { user, min_output, referral }) => {
                let pattern = if kind == OperationKind::Vault {
                    SwapPattern::Vault
                } else {
                    SwapPattern::Router
                };
                HookPayload::Swap {
                    pattern,
                    user,
                    min_output,
                    referral,
                    active: true,
                    commitment,
                }
            }
            (OperationKind::LpAdd, HookContext::Liquidity) => HookPayload::LiquidityAdd { commitment },
            (kind, _) => {
                return Err(PrivacyError::input(format!(
                    "no hook payload shape for {} with the given context",
                    kind
                )))
            }
        };
        payload.validate()?;
        Ok(payload)
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            HookPayload::Swap { pattern: SwapPattern::Vault, .. } => OperationKind::Vault,
            HookPayload::Swap { pattern: SwapPattern::Router, .. } => OperationKind::Router,
            HookPayload::LiquidityAdd { .. } => OperationKind::LpAdd,
        }
    }

    pub fn commitment(&self) -> B256 {
        match self {
            HookPayload::Swap { commitment, .. } | HookPayload::LiquidityAdd { commitment } => *commitment,
        }
    }

    pub fn validate(&self) -> Result<(), PrivacyError> {
        if self.commitment() == B256::ZERO {
            return Err(PrivacyError::input("commitment must be non-zero"));
        }
        if let HookPayload::Swap { referral, .. } = self {
            if referral.len() > MAX_REFERRAL_BYTES {
                return Err(PrivacyError::input(format!(
                    "referral is {} bytes, at most {} allowed",
                    referral.len(),
                    MAX_REFERRAL_BYTES
                )));
            }
        }
        Ok(())
    }

    /// ABI-encode as the hook's `hookData` argument.
    pub fn encode(&self) -> Result<Vec<u8>, PrivacyError> {
        self.validate()?;
        let bytes = match self {
            HookPayload::Swap {
                pattern,
                user,
                min_output,
                referral,
                active,
                commitment,
            } => SwapHookData::abi_encode_params(&(
                *user,
                *min_output,
                referral.clone(),
                *active,
                pattern.as_str().to_string(),
                *commitment,
            )),
            HookPayload::LiquidityAdd { commitment } => {
                LiquidityHookData::abi_encode_params(&(*commitment,))
            }
        };
        Ok(bytes)
    }

    /// Decode `hookData` as the hook for `kind` would.
    pub fn decode(kind: OperationKind, data: &[u8]) -> Result<Self, PrivacyError> {
        let malformed = |e: alloy_sol_types::Error| PrivacyError::input(format!("malformed hook data: {}", e));
        let payload = match kind {
            OperationKind::Vault | OperationKind::Router => {
                let (user, min_output, referral, active, pattern, commitment) =
                    SwapHookData::abi_decode_params(data, true).map_err(malformed)?;
                let pattern = SwapPattern::from_wire(&pattern)
                    .ok_or_else(|| PrivacyError::input(format!("unknown swap pattern {:?}", pattern)))?;
                HookPayload::Swap {
                    pattern,
                    user,
                    min_output,
                    referral,
                    active,
                    commitment,
                }
            }
            OperationKind::LpAdd => {
                let (commitment,) = LiquidityHookData::abi_decode_params(data, true).map_err(malformed)?;
                HookPayload::LiquidityAdd { commitment }
            }
            OperationKind::LpRemove => {
                return Err(PrivacyError::input("lp-remove carries no hook payload"))
            }
        };
        if payload.kind() != kind {
            return Err(PrivacyError::input(format!(
                "hook data pattern belongs to {}, expected {}",
                payload.kind(),
                kind
            )));
        }
        payload.validate()?;
        Ok(payload)
    }
}
