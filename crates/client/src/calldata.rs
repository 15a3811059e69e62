//! Positional calldata for the verifier entry points.
//!
//! The hooks take snarkjs-shaped arrays. The only non-obvious part is `B`:
//! each G2 coordinate is an `Fq2` element and the precompile expects the
//! imaginary part first, so `b.x = (c0, c1)` is written as `[c1, c0]`.

use alloy_primitives::aliases::{I24, U24};
use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::SolCall;
use ark_bn254::{Bn254, Fq2, Fr, G1Affine, G2Affine};
use ark_groth16::Proof;
use serde::{Deserialize, Serialize};

use unizwap_prover::ProofWithInputs;

use crate::error::{PrivacyError, Revert};
use crate::field::{field_to_b256, field_to_u256, fq_to_u256, u256_to_fq};
use crate::operation::{CircuitId, OperationKind, OperationParams};

pub const DEFAULT_FEE: u32 = 3000;
pub const DEFAULT_TICK_SPACING: i32 = 60;

mod abi {
    alloy_sol_types::sol! {
        struct PoolKey {
            address currency0;
            address currency1;
            uint24 fee;
            int24 tickSpacing;
            address hooks;
        }

        function withdrawPrivate(
            bytes32 commitment,
            uint256[2] _pA,
            uint256[2][2] _pB,
            uint256[2] _pC,
            uint256[4] _pubSignals
        ) external;

        function removeLiquidityWithProof(
            PoolKey key,
            uint256 tokenId,
            uint128 liquidity,
            address recipient,
            uint256[2] _pA,
            uint256[2][2] _pB,
            uint256[2] _pC,
            uint256[6] _pubSignals
        ) external;
    }
}

/// Pool identifier as the pool manager hashes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolKey {
    pub currency0: Address,
    pub currency1: Address,
    pub fee: u32,
    pub tick_spacing: i32,
    pub hooks: Address,
}

impl PoolKey {
    /// Pool for a token pair with the hooks' default fee tier. Currencies
    /// are sorted the way the pool manager requires.
    pub fn new(token_a: Address, token_b: Address, hooks: Address) -> Self {
        let (currency0, currency1) = if token_a <= token_b {
            (token_a, token_b)
        } else {
            (token_b, token_a)
        };
        Self {
            currency0,
            currency1,
            fee: DEFAULT_FEE,
            tick_spacing: DEFAULT_TICK_SPACING,
            hooks,
        }
    }

    fn to_abi(self) -> Result<abi::PoolKey, PrivacyError> {
        let fee = U24::try_from(self.fee)
            .map_err(|_| PrivacyError::input(format!("fee {} does not fit uint24", self.fee)))?;
        let tick_spacing = I24::try_from(self.tick_spacing).map_err(|_| {
            PrivacyError::input(format!("tick spacing {} does not fit int24", self.tick_spacing))
        })?;
        Ok(abi::PoolKey {
            currency0: self.currency0,
            currency1: self.currency1,
            fee,
            tickSpacing: tick_spacing,
            hooks: self.hooks,
        })
    }

    fn from_abi(key: abi::PoolKey) -> Self {
        Self {
            currency0: key.currency0,
            currency1: key.currency1,
            fee: key.fee.to::<u32>(),
            tick_spacing: key.tickSpacing.as_i32(),
            hooks: key.hooks,
        }
    }
}

/// An address as the verifier reads it from a public signal.
fn address_word(address: Address) -> U256 {
    U256::from_be_slice(address.as_slice())
}

/// Groth16 proof in verifier coordinates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolidityProof {
    pub a: [U256; 2],
    pub b: [[U256; 2]; 2],
    pub c: [U256; 2],
}

impl SolidityProof {
    pub fn from_proof(proof: &Proof<Bn254>) -> Self {
        Self {
            a: [fq_to_u256(&proof.a.x), fq_to_u256(&proof.a.y)],
            b: [
                [fq_to_u256(&proof.b.x.c1), fq_to_u256(&proof.b.x.c0)],
                [fq_to_u256(&proof.b.y.c1), fq_to_u256(&proof.b.y.c0)],
            ],
            c: [fq_to_u256(&proof.c.x), fq_to_u256(&proof.c.y)],
        }
    }

    /// Undo the coordinate swap and check that every point is a valid
    /// group element.
    pub fn to_proof(&self) -> Result<Proof<Bn254>, Revert> {
        let fq = |word: U256| {
            u256_to_fq(word).ok_or_else(|| Revert::AbiMismatch("coordinate exceeds base field".into()))
        };
        let g1 = |coords: &[U256; 2]| -> Result<G1Affine, Revert> {
            let point = G1Affine::new_unchecked(fq(coords[0])?, fq(coords[1])?);
            if point.is_on_curve() && point.is_in_correct_subgroup_assuming_on_curve() {
                Ok(point)
            } else {
                Err(Revert::InvalidProof)
            }
        };

        let b = G2Affine::new_unchecked(
            Fq2::new(fq(self.b[0][1])?, fq(self.b[0][0])?),
            Fq2::new(fq(self.b[1][1])?, fq(self.b[1][0])?),
        );
        if !b.is_on_curve() || !b.is_in_correct_subgroup_assuming_on_curve() {
            return Err(Revert::InvalidProof);
        }

        Ok(Proof {
            a: g1(&self.a)?,
            b,
            c: g1(&self.c)?,
        })
    }
}

/// A spend call ready for the verifier entry point of its kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Submission {
    /// `withdrawPrivate`, shared by the vault and router hooks.
    Withdraw {
        commitment: B256,
        proof: SolidityProof,
        signals: [U256; 4],
    },
    /// `removeLiquidityWithProof`.
    RemoveLiquidity {
        pool: PoolKey,
        token_id: U256,
        liquidity: u128,
        recipient: Address,
        proof: SolidityProof,
        signals: [U256; 6],
    },
}

impl Submission {
    pub fn encode(&self) -> Result<Vec<u8>, PrivacyError> {
        let data = match self {
            Submission::Withdraw {
                commitment,
                proof,
                signals,
            } => abi::withdrawPrivateCall {
                commitment: *commitment,
                _pA: proof.a,
                _pB: proof.b,
                _pC: proof.c,
                _pubSignals: *signals,
            }
            .abi_encode(),
            Submission::RemoveLiquidity {
                pool,
                token_id,
                liquidity,
                recipient,
                proof,
                signals,
            } => abi::removeLiquidityWithProofCall {
                key: pool.to_abi()?,
                tokenId: *token_id,
                liquidity: *liquidity,
                recipient: *recipient,
                _pA: proof.a,
                _pB: proof.b,
                _pC: proof.c,
                _pubSignals: *signals,
            }
            .abi_encode(),
        };
        Ok(data)
    }

    /// Parse calldata the way the verifier contract does.
    pub fn decode(data: &[u8]) -> Result<Self, Revert> {
        let selector = data
            .get(..4)
            .ok_or_else(|| Revert::AbiMismatch("calldata shorter than a selector".into()))?;
        let mismatch = |e: alloy_sol_types::Error| Revert::AbiMismatch(e.to_string());

        if selector == abi::withdrawPrivateCall::SELECTOR {
            let call = abi::withdrawPrivateCall::abi_decode(data, true).map_err(mismatch)?;
            Ok(Submission::Withdraw {
                commitment: call.commitment,
                proof: SolidityProof {
                    a: call._pA,
                    b: call._pB,
                    c: call._pC,
                },
                signals: call._pubSignals,
            })
        } else if selector == abi::removeLiquidityWithProofCall::SELECTOR {
            let call = abi::removeLiquidityWithProofCall::abi_decode(data, true).map_err(mismatch)?;
            Ok(Submission::RemoveLiquidity {
                pool: PoolKey::from_abi(call.key),
                token_id: call.tokenId,
                liquidity: call.liquidity,
                recipient: call.recipient,
                proof: SolidityProof {
                    a: call._pA,
                    b: call._pB,
                    c: call._pC,
                },
                signals: call._pubSignals,
            })
        } else {
            Err(Revert::AbiMismatch(format!(
                "unknown selector 0x{}",
                hex::encode(selector)
            )))
        }
    }

    pub fn circuit(&self) -> CircuitId {
        match self {
            Submission::Withdraw { .. } => CircuitId::SwapWithdraw,
            Submission::RemoveLiquidity { .. } => CircuitId::RemoveLiquidity,
        }
    }

    pub fn signals(&self) -> &[U256] {
        match self {
            Submission::Withdraw { signals, .. } => signals,
            Submission::RemoveLiquidity { signals, .. } => signals,
        }
    }

    pub fn proof(&self) -> &SolidityProof {
        match self {
            Submission::Withdraw { proof, .. } | Submission::RemoveLiquidity { proof, .. } => proof,
        }
    }

    pub fn root(&self) -> B256 {
        B256::from(self.signals()[0])
    }

    pub fn nullifier(&self) -> B256 {
        B256::from(self.signals()[1])
    }

    /// Call arguments read outside the proof must equal the public signals
    /// that bind them, or the proof could be replayed against another
    /// position or amount.
    pub fn check_bindings(&self) -> Result<(), Revert> {
        match self {
            Submission::Withdraw { commitment, .. } => {
                if commitment.is_zero() {
                    return Err(Revert::AbiMismatch("zero commitment".into()));
                }
                Ok(())
            }
            Submission::RemoveLiquidity {
                pool,
                token_id,
                liquidity,
                signals,
                ..
            } => {
                let bound = [
                    ("currency0", address_word(pool.currency0), signals[2]),
                    ("currency1", address_word(pool.currency1), signals[3]),
                    ("tokenId", *token_id, signals[4]),
                    ("liquidity", U256::from(*liquidity), signals[5]),
                ];
                for (name, argument, signal) in bound {
                    if argument != signal {
                        return Err(Revert::AbiMismatch(format!(
                            "{} does not match its public signal",
                            name
                        )));
                    }
                }
                Ok(())
            }
        }
    }

    /// Public signals as field elements; the verifier rejects words `>= p`.
    pub fn public_inputs(&self) -> Result<Vec<Fr>, Revert> {
        self.signals()
            .iter()
            .map(|word| {
                crate::field::b256_to_field(&B256::from(*word)).ok_or(Revert::InvalidProof)
            })
            .collect()
    }
}

/// Lay out a verified proof as the calldata for `kind`.
pub fn format_submission(
    kind: OperationKind,
    params: &OperationParams,
    commitment: Fr,
    proof: &ProofWithInputs,
) -> Result<Submission, PrivacyError> {
    params.check_kind(kind)?;
    let circuit = kind.descriptor().require_circuit()?;
    if proof.public_inputs.len() != circuit.public_input_count() {
        return Err(PrivacyError::ProofGeneration(format!(
            "{} expects {} public signals, proof carries {}",
            circuit,
            circuit.public_input_count(),
            proof.public_inputs.len()
        )));
    }

    let words: Vec<U256> = proof.public_inputs.iter().map(field_to_u256).collect();
    if let OperationParams::Token { token, amount } = params {
        if words[2] != address_word(*token) || words[3] != *amount {
            return Err(PrivacyError::ProofGeneration(
                "proof signals do not commit to the token and amount".into(),
            ));
        }
    }
    let solidity = SolidityProof::from_proof(&proof.proof);
    let shape = |_| PrivacyError::ProofGeneration("public signal count".into());

    let submission = match params {
        OperationParams::Token { .. } => Submission::Withdraw {
            commitment: field_to_b256(&commitment),
            proof: solidity,
            signals: words.try_into().map_err(shape)?,
        },
        OperationParams::RemovePosition {
            pool,
            position_id,
            liquidity,
            recipient,
        } => Submission::RemoveLiquidity {
            pool: *pool,
            token_id: *position_id,
            liquidity: *liquidity,
            recipient: *recipient,
            proof: solidity,
            signals: words.try_into().map_err(shape)?,
        },
        OperationParams::Position { .. } => {
            return Err(PrivacyError::input("position parameters cannot be submitted"))
        }
    };
    submission
        .check_bindings()
        .map_err(|e| PrivacyError::ProofGeneration(e.to_string()))?;
    Ok(submission)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ec::AffineRepr;
    use ark_ff::UniformRand;
    use ark_std::rand::{rngs::StdRng, SeedableRng};

    fn random_proof() -> Proof<Bn254> {
        let mut rng = StdRng::seed_from_u64(7);
        let g1 = G1Affine::generator();
        let g2 = G2Affine::generator();
        Proof {
            a: (g1 * Fr::rand(&mut rng)).into(),
            b: (g2 * Fr::rand(&mut rng)).into(),
            c: (g1 * Fr::rand(&mut rng)).into(),
        }
    }

    fn signals(n: u64) -> Vec<Fr> {
        (1..=n).map(Fr::from).collect()
    }

    fn token_signals(params: &OperationParams) -> Vec<Fr> {
        let (token, amount) = params.token_fields().unwrap();
        vec![Fr::from(1u64), Fr::from(2u64), token, amount]
    }

    fn removal_signals(params: &OperationParams) -> Vec<Fr> {
        match params {
            OperationParams::RemovePosition {
                pool,
                position_id,
                liquidity,
                ..
            } => vec![
                Fr::from(1u64),
                Fr::from(2u64),
                crate::field::address_to_field(pool.currency0),
                crate::field::address_to_field(pool.currency1),
                crate::field::u256_to_field("position_id", *position_id).unwrap(),
                Fr::from(*liquidity),
            ],
            _ => unreachable!(),
        }
    }

    fn removal_params() -> OperationParams {
        OperationParams::RemovePosition {
            pool: PoolKey::new(Address::repeat_byte(2), Address::repeat_byte(1), Address::repeat_byte(3)),
            position_id: U256::from(23014u64),
            liquidity: 1_000_000,
            recipient: Address::repeat_byte(4),
        }
    }

    #[test]
    fn test_b_coordinates_are_swapped() {
        let proof = random_proof();
        let solidity = SolidityProof::from_proof(&proof);
        assert_eq!(solidity.b[0][0], fq_to_u256(&proof.b.x.c1));
        assert_eq!(solidity.b[0][1], fq_to_u256(&proof.b.x.c0));
        assert_eq!(solidity.b[1][0], fq_to_u256(&proof.b.y.c1));
        assert_eq!(solidity.to_proof().unwrap(), proof);
    }

    #[test]
    fn test_unswapped_b_is_rejected() {
        let mut solidity = SolidityProof::from_proof(&random_proof());
        solidity.b[0].swap(0, 1);
        solidity.b[1].swap(0, 1);
        assert_eq!(solidity.to_proof(), Err(Revert::InvalidProof));
    }

    #[test]
    fn test_withdraw_calldata() {
        let params = OperationParams::Token {
            token: Address::repeat_byte(1),
            amount: U256::from(4u64),
        };
        let proof = ProofWithInputs {
            proof: random_proof(),
            public_inputs: token_signals(&params),
        };
        let submission = format_submission(OperationKind::Vault, &params, Fr::from(9u64), &proof).unwrap();
        let data = submission.encode().unwrap();

        // selector + bytes32 + 2 + 4 + 2 + 4 words
        assert_eq!(data.len(), 4 + 32 * 13);
        assert_eq!(&data[..4], abi::withdrawPrivateCall::SELECTOR.as_slice());
        assert_eq!(Submission::decode(&data).unwrap(), submission);
        assert_eq!(submission.root(), B256::from(U256::from(1u64)));
        assert_eq!(submission.nullifier(), B256::from(U256::from(2u64)));
    }

    #[test]
    fn test_remove_liquidity_calldata() {
        let params = removal_params();
        let proof = ProofWithInputs {
            proof: random_proof(),
            public_inputs: removal_signals(&params),
        };
        let submission = format_submission(OperationKind::LpRemove, &params, Fr::from(9u64), &proof).unwrap();
        let data = submission.encode().unwrap();

        // selector + 5 key words + 3 + 2 + 4 + 2 + 6 words
        assert_eq!(data.len(), 4 + 32 * 22);
        let decoded = Submission::decode(&data).unwrap();
        assert_eq!(decoded, submission);
        assert_eq!(decoded.circuit(), CircuitId::RemoveLiquidity);
        assert_eq!(decoded.public_inputs().unwrap(), removal_signals(&params));
    }

    #[test]
    fn test_removal_arguments_must_match_signals() {
        let params = removal_params();
        let proof = ProofWithInputs {
            proof: random_proof(),
            public_inputs: removal_signals(&params),
        };
        let submission = format_submission(OperationKind::LpRemove, &params, Fr::from(9u64), &proof).unwrap();
        assert!(submission.check_bindings().is_ok());

        let mut raised = submission.clone();
        if let Submission::RemoveLiquidity { liquidity, .. } = &mut raised {
            *liquidity = 999_999_999_999;
        }
        assert!(matches!(raised.check_bindings(), Err(Revert::AbiMismatch(_))));

        let mut other_position = submission;
        if let Submission::RemoveLiquidity { token_id, .. } = &mut other_position {
            *token_id = U256::from(1u64);
        }
        assert!(matches!(other_position.check_bindings(), Err(Revert::AbiMismatch(_))));

        let larger = OperationParams::RemovePosition {
            pool: PoolKey::new(Address::repeat_byte(2), Address::repeat_byte(1), Address::repeat_byte(3)),
            position_id: U256::from(23014u64),
            liquidity: 2_000_000,
            recipient: Address::repeat_byte(4),
        };
        let err = format_submission(OperationKind::LpRemove, &larger, Fr::from(9u64), &proof).unwrap_err();
        assert!(matches!(err, PrivacyError::ProofGeneration(_)));
    }

    #[test]
    fn test_withdraw_signals_must_match_token_and_amount() {
        let params = OperationParams::Token {
            token: Address::repeat_byte(1),
            amount: U256::from(4u64),
        };
        let proof = ProofWithInputs {
            proof: random_proof(),
            public_inputs: token_signals(&params),
        };
        let other = OperationParams::Token {
            token: Address::repeat_byte(1),
            amount: U256::from(5u64),
        };
        let err = format_submission(OperationKind::Vault, &other, Fr::from(9u64), &proof).unwrap_err();
        assert!(matches!(err, PrivacyError::ProofGeneration(_)));
    }

    #[test]
    fn test_signal_count_must_match_kind() {
        let proof = ProofWithInputs {
            proof: random_proof(),
            public_inputs: signals(6),
        };
        let params = OperationParams::Token {
            token: Address::repeat_byte(1),
            amount: U256::from(4u64),
        };
        let err = format_submission(OperationKind::Router, &params, Fr::from(9u64), &proof).unwrap_err();
        assert!(matches!(err, PrivacyError::ProofGeneration(_)));
    }

    #[test]
    fn test_garbage_calldata_is_abi_mismatch() {
        assert!(matches!(Submission::decode(&[0xde, 0xad]), Err(Revert::AbiMismatch(_))));
        assert!(matches!(Submission::decode(&[0u8; 100]), Err(Revert::AbiMismatch(_))));
        let mut truncated = abi::withdrawPrivateCall::SELECTOR.to_vec();
        truncated.extend_from_slice(&[0u8; 64]);
        assert!(matches!(Submission::decode(&truncated), Err(Revert::AbiMismatch(_))));
    }

    #[test]
    fn test_pool_key_sorts_currencies() {
        let key = PoolKey::new(Address::repeat_byte(9), Address::repeat_byte(1), Address::ZERO);
        assert_eq!(key.currency0, Address::repeat_byte(1));
        assert_eq!(key.fee, DEFAULT_FEE);
        assert_eq!(key.tick_spacing, DEFAULT_TICK_SPACING);
    }
}
