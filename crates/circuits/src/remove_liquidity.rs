//! Liquidity-removal circuit for position commitments.
//!
//! Proves knowledge of `(secret, nonce)` such that
//! `H3(secret, nonce, tokenId)` is a leaf under `merkle_root` and the
//! nullifier equals `H2(secret, tokenId)`. The pool tokens and liquidity
//! amount are public inputs so the proof cannot be replayed against a
//! different pool or a larger withdrawal.
//!
//! Public inputs, in order: merkle_root, nullifier, tokenAAddress,
//! tokenBAddress, tokenId, liquidityAmount.

use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use crate::commitment::{
    position_commitment, position_commitment_var, position_nullifier, position_nullifier_var,
};
use crate::merkle::{compute_root_from_path, MerklePath, MerklePathVar, TREE_DEPTH};

/// Number of public signals exposed to the verifier contract.
pub const REMOVE_LIQUIDITY_PUBLIC_INPUTS: usize = 6;

/// Width of the `uint128 liquidity` call argument.
pub const LIQUIDITY_BITS: usize = 128;
/// Width of an address.
pub const ADDRESS_BITS: usize = 160;

/// Public pool data bound into the removal proof.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PositionRemoval {
    pub token_a: Fr,
    pub token_b: Fr,
    pub token_id: Fr,
    pub liquidity: Fr,
}

#[derive(Clone)]
pub struct RemoveLiquidityCircuit {
    // Public inputs
    pub merkle_root: Option<Fr>,
    pub nullifier: Option<Fr>,
    pub token_a: Option<Fr>,
    pub token_b: Option<Fr>,
    pub token_id: Option<Fr>,
    pub liquidity: Option<Fr>,

    // Witnesses
    pub secret: Option<Fr>,
    pub nonce: Option<Fr>,
    pub path: Option<MerklePath>,
}

impl RemoveLiquidityCircuit {
    /// Create an empty circuit for setup at the deployed tree depth.
    pub fn empty() -> Self {
        Self::empty_with_depth(TREE_DEPTH)
    }

    pub fn empty_with_depth(depth: usize) -> Self {
        Self {
            merkle_root: Some(Fr::from(0u64)),
            nullifier: Some(Fr::from(0u64)),
            token_a: Some(Fr::from(0u64)),
            token_b: Some(Fr::from(0u64)),
            token_id: Some(Fr::from(0u64)),
            liquidity: Some(Fr::from(0u64)),
            secret: Some(Fr::from(0u64)),
            nonce: Some(Fr::from(0u64)),
            path: Some(MerklePath::empty(depth)),
        }
    }

    /// Create a circuit with witnesses; root and nullifier are derived.
    pub fn new(removal: PositionRemoval, secret: Fr, nonce: Fr, path: MerklePath) -> Self {
        let commitment = position_commitment(secret, nonce, removal.token_id);
        let merkle_root = path.compute_root(commitment);

        Self {
            merkle_root: Some(merkle_root),
            nullifier: Some(position_nullifier(secret, removal.token_id)),
            token_a: Some(removal.token_a),
            token_b: Some(removal.token_b),
            token_id: Some(removal.token_id),
            liquidity: Some(removal.liquidity),
            secret: Some(secret),
            nonce: Some(nonce),
            path: Some(path),
        }
    }

    /// Public inputs in verifier order, if all are assigned.
    pub fn public_inputs(&self) -> Option<Vec<Fr>> {
        Some(vec![
            self.merkle_root?,
            self.nullifier?,
            self.token_a?,
            self.token_b?,
            self.token_id?,
            self.liquidity?,
        ])
    }
}

impl ConstraintSynthesizer<Fr> for RemoveLiquidityCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        // === Allocate public inputs ===
        let root_var = FpVar::new_input(cs.clone(), || {
            self.merkle_root.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let nullifier_var = FpVar::new_input(cs.clone(), || {
            self.nullifier.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let token_a_var = FpVar::new_input(cs.clone(), || {
            self.token_a.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let token_b_var = FpVar::new_input(cs.clone(), || {
            self.token_b.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let token_id_var = FpVar::new_input(cs.clone(), || {
            self.token_id.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let liquidity_var = FpVar::new_input(cs.clone(), || {
            self.liquidity.ok_or(SynthesisError::AssignmentMissing)
        })?;

        // === Allocate witnesses ===
        let secret_var = FpVar::new_witness(cs.clone(), || {
            self.secret.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let nonce_var = FpVar::new_witness(cs.clone(), || {
            self.nonce.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let path = self.path.as_ref().ok_or(SynthesisError::AssignmentMissing)?;
        let path_var = MerklePathVar::new_witness(cs.clone(), path)?;

        // === Constraint 1: nullifier = H2(secret, tokenId) ===
        let computed_nullifier = position_nullifier_var(&secret_var, &token_id_var)?;
        computed_nullifier.enforce_equal(&nullifier_var)?;

        // === Constraint 2: commitment is a leaf under merkle_root ===
        let commitment_var = position_commitment_var(&secret_var, &nonce_var, &token_id_var)?;
        let computed_root = compute_root_from_path(&commitment_var, &path_var)?;
        computed_root.enforce_equal(&root_var)?;

        // === Constraint 3: public call arguments fit their ABI types ===
        enforce_bits(&token_a_var, ADDRESS_BITS)?;
        enforce_bits(&token_b_var, ADDRESS_BITS)?;
        enforce_bits(&liquidity_var, LIQUIDITY_BITS)?;

        Ok(())
    }
}

/// All bits of `value` at or above `num_bits` are zero.
fn enforce_bits(value: &FpVar<Fr>, num_bits: usize) -> Result<(), SynthesisError> {
    for bit in value.to_bits_le()?.iter().skip(num_bits) {
        bit.enforce_equal(&Boolean::FALSE)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merkle::MerkleTree;
    use ark_relations::r1cs::ConstraintSystem;

    fn removal() -> PositionRemoval {
        PositionRemoval {
            token_a: Fr::from(0xaaaau64),
            token_b: Fr::from(0xbbbbu64),
            token_id: Fr::from(23014u64),
            liquidity: Fr::from(5_000_000u64),
        }
    }

    #[test]
    fn test_valid_witness_satisfies() {
        let secret = Fr::from(987654u64);
        let nonce = Fr::from(321098u64);
        let commitment = position_commitment(secret, nonce, removal().token_id);
        let tree = MerkleTree::from_leaves(TREE_DEPTH, vec![commitment]);

        let circuit = RemoveLiquidityCircuit::new(removal(), secret, nonce, tree.path(0));
        assert_eq!(circuit.merkle_root, Some(tree.root()));
        assert_eq!(circuit.public_inputs().unwrap().len(), REMOVE_LIQUIDITY_PUBLIC_INPUTS);

        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_liquidity_above_u128_unsatisfied() {
        let secret = Fr::from(987654u64);
        let nonce = Fr::from(321098u64);
        let commitment = position_commitment(secret, nonce, removal().token_id);
        let tree = MerkleTree::from_leaves(TREE_DEPTH, vec![commitment]);

        let mut at_max = removal();
        at_max.liquidity = Fr::from(u128::MAX);
        let cs = ConstraintSystem::<Fr>::new_ref();
        RemoveLiquidityCircuit::new(at_max, secret, nonce, tree.path(0))
            .generate_constraints(cs.clone())
            .unwrap();
        assert!(cs.is_satisfied().unwrap());

        let mut over = removal();
        over.liquidity = Fr::from(u128::MAX) + Fr::from(1u64);
        let cs = ConstraintSystem::<Fr>::new_ref();
        RemoveLiquidityCircuit::new(over, secret, nonce, tree.path(0))
            .generate_constraints(cs.clone())
            .unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_foreign_position_unsatisfied() {
        let secret = Fr::from(987654u64);
        let nonce = Fr::from(321098u64);
        let commitment = position_commitment(secret, nonce, removal().token_id);
        let tree = MerkleTree::from_leaves(TREE_DEPTH, vec![commitment]);

        let mut circuit = RemoveLiquidityCircuit::new(removal(), secret, nonce, tree.path(0));
        circuit.token_id = Some(Fr::from(23015u64));

        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }
}
