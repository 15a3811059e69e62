//! Witness assembly and layout validation.
//!
//! A witness is kept as named fields matching the deployed circuits' input
//! names so it can be checked against the operation's layout, rendered as
//! a snarkjs input file, and only then turned into a constraint program.

use std::collections::BTreeMap;

use ark_bn254::Fr;
use ark_ff::{One, Zero};
use serde_json::{Map, Value};

use unizwap_circuits::field::fr_to_decimal;
use unizwap_circuits::{MerklePath, RemoveLiquidityCircuit, SwapWithdrawCircuit};

use crate::deriver::derive;
use crate::error::PrivacyError;
use crate::field::address_to_field;
use crate::operation::{CircuitId, OperationKind, OperationParams, SecretMaterial, PRIVATE_LAYOUT};
use crate::tree_builder::Inclusion;

const PATH_ELEMENTS: &str = "merkle_path";
const PATH_INDICES: &str = "merkle_pathIndices";

#[derive(Clone, Debug, PartialEq)]
pub enum WitnessValue {
    Scalar(Fr),
    Array(Vec<Fr>),
}

impl WitnessValue {
    fn to_json(&self) -> Value {
        match self {
            WitnessValue::Scalar(v) => Value::String(fr_to_decimal(v)),
            WitnessValue::Array(vs) => {
                Value::Array(vs.iter().map(|v| Value::String(fr_to_decimal(v))).collect())
            }
        }
    }
}

/// A constraint program instance ready for the prover.
#[derive(Clone)]
pub enum CircuitInstance {
    SwapWithdraw(SwapWithdrawCircuit),
    RemoveLiquidity(RemoveLiquidityCircuit),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Witness {
    pub kind: OperationKind,
    pub circuit: CircuitId,
    pub depth: usize,
    pub fields: BTreeMap<String, WitnessValue>,
}

impl Witness {
    /// Check the fields against the kind's layout: every field present,
    /// nothing extra, paths of the tree depth, direction bits 0 or 1.
    pub fn validate(&self) -> Result<(), PrivacyError> {
        let layout = layout_error;
        let descriptor = self.kind.descriptor();
        if descriptor.circuit != Some(self.circuit) {
            return Err(layout(format!("{} is not proven by {}", self.kind, self.circuit)));
        }

        let expected: Vec<&str> = descriptor
            .public_layout
            .iter()
            .chain(PRIVATE_LAYOUT.iter())
            .copied()
            .collect();
        for name in &expected {
            let value = self
                .fields
                .get(*name)
                .ok_or_else(|| layout(format!("missing field {}", name)))?;
            let is_array = *name == PATH_ELEMENTS || *name == PATH_INDICES;
            match (is_array, value) {
                (false, WitnessValue::Scalar(_)) => {}
                (true, WitnessValue::Array(values)) if values.len() == self.depth => {}
                (true, WitnessValue::Array(values)) => {
                    return Err(layout(format!(
                        "{} has {} entries, tree depth is {}",
                        name,
                        values.len(),
                        self.depth
                    )))
                }
                _ => return Err(layout(format!("{} has the wrong shape", name))),
            }
        }
        if let Some(extra) = self.fields.keys().find(|k| !expected.contains(&k.as_str())) {
            return Err(layout(format!("unexpected field {}", extra)));
        }

        let bits = self.array(PATH_INDICES)?;
        if bits.iter().any(|b| !b.is_zero() && !b.is_one()) {
            return Err(layout(format!("{} must hold only 0 or 1", PATH_INDICES)));
        }
        Ok(())
    }

    /// Public signals in verifier order.
    pub fn public_signals(&self) -> Result<Vec<Fr>, PrivacyError> {
        self.kind
            .descriptor()
            .public_layout
            .iter()
            .map(|name| self.scalar(name))
            .collect()
    }

    pub fn root(&self) -> Result<Fr, PrivacyError> {
        self.scalar("merkle_root")
    }

    pub fn nullifier(&self) -> Result<Fr, PrivacyError> {
        self.scalar("nullifier")
    }

    /// snarkjs-style `input.json` object, values as decimal strings.
    pub fn to_input_json(&self) -> Value {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();
        Value::Object(map)
    }

    /// Build the constraint program from the named fields. The public
    /// values are taken as given, so a witness that disagrees with itself
    /// fails constraint satisfaction rather than being silently repaired.
    pub fn to_circuit(&self) -> Result<CircuitInstance, PrivacyError> {
        self.validate()?;
        let path = MerklePath::new(
            self.array(PATH_ELEMENTS)?.to_vec(),
            self.array(PATH_INDICES)?.iter().map(|b| b.is_one()).collect(),
        );

        let instance = match self.circuit {
            CircuitId::SwapWithdraw => CircuitInstance::SwapWithdraw(SwapWithdrawCircuit {
                merkle_root: Some(self.scalar("merkle_root")?),
                nullifier: Some(self.scalar("nullifier")?),
                token_address: Some(self.scalar("token_address")?),
                deposit_amount: Some(self.scalar("deposit_amount")?),
                secret: Some(self.scalar("secret")?),
                nonce: Some(self.scalar("nonce")?),
                path: Some(path),
            }),
            CircuitId::RemoveLiquidity => CircuitInstance::RemoveLiquidity(RemoveLiquidityCircuit {
                merkle_root: Some(self.scalar("merkle_root")?),
                nullifier: Some(self.scalar("nullifier")?),
                token_a: Some(self.scalar("tokenAAddress")?),
                token_b: Some(self.scalar("tokenBAddress")?),
                token_id: Some(self.scalar("tokenId")?),
                liquidity: Some(self.scalar("liquidityAmount")?),
                secret: Some(self.scalar("secret")?),
                nonce: Some(self.scalar("nonce")?),
                path: Some(path),
            }),
        };
        Ok(instance)
    }

    fn scalar(&self, name: &str) -> Result<Fr, PrivacyError> {
        match self.fields.get(name) {
            Some(WitnessValue::Scalar(v)) => Ok(*v),
            _ => Err(layout_error(format!("missing scalar {}", name))),
        }
    }

    fn array(&self, name: &str) -> Result<&[Fr], PrivacyError> {
        match self.fields.get(name) {
            Some(WitnessValue::Array(vs)) => Ok(vs),
            _ => Err(layout_error(format!("missing array {}", name))),
        }
    }
}

fn layout_error(msg: String) -> PrivacyError {
    PrivacyError::ProofGeneration(format!("witness layout: {}", msg))
}

/// Packs secret material, public parameters and an inclusion path into the
/// layout of the kind's constraint program.
#[derive(Clone, Copy, Debug)]
pub struct WitnessAssembler {
    depth: usize,
}

impl WitnessAssembler {
    pub fn new(depth: usize) -> Self {
        Self { depth }
    }

    pub fn assemble(
        &self,
        kind: OperationKind,
        material: &SecretMaterial,
        params: &OperationParams,
        inclusion: &Inclusion,
    ) -> Result<Witness, PrivacyError> {
        let circuit = kind.descriptor().require_circuit()?;
        let derived = derive(kind, material, params)?;
        if derived.commitment != inclusion.commitment {
            return Err(PrivacyError::input(
                "inclusion path belongs to a different commitment",
            ));
        }

        let mut fields = BTreeMap::new();
        let mut put = |name: &str, value: Fr| {
            fields.insert(name.to_string(), WitnessValue::Scalar(value));
        };
        put("merkle_root", inclusion.root);
        put("nullifier", derived.nullifier);
        put("secret", material.secret);
        put("nonce", material.nonce);

        match params {
            OperationParams::Token { .. } => {
                let (token, amount) = params.token_fields()?;
                put("token_address", token);
                put("deposit_amount", amount);
            }
            OperationParams::RemovePosition { pool, liquidity, .. } => {
                put("tokenAAddress", address_to_field(pool.currency0));
                put("tokenBAddress", address_to_field(pool.currency1));
                put("tokenId", params.position_id()?);
                put("liquidityAmount", Fr::from(*liquidity));
            }
            OperationParams::Position { .. } => {
                return Err(PrivacyError::input("position parameters carry no spend fields"))
            }
        }

        fields.insert(
            PATH_ELEMENTS.to_string(),
            WitnessValue::Array(inclusion.path.elements().to_vec()),
        );
        fields.insert(
            PATH_INDICES.to_string(),
            WitnessValue::Array(
                inclusion
                    .path
                    .indices()
                    .iter()
                    .map(|&b| Fr::from(b as u64))
                    .collect(),
            ),
        );

        let witness = Witness {
            kind,
            circuit,
            depth: self.depth,
            fields,
        };
        witness.validate()?;
        Ok(witness)
    }
}
