//! Withdrawal circuit for token/amount commitments.
//!
//! Shared by the vault and router hooks. Proves knowledge of `(secret, nonce)`
//! such that `H3(token, amount, H2(secret, nonce))` is a leaf of the tree with
//! root `merkle_root`, and that the revealed nullifier equals the nonce.
//!
//! Public inputs, in order: merkle_root, nullifier, token_address, deposit_amount.

use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use crate::commitment::{token_commitment, token_commitment_var, token_nullifier};
use crate::merkle::{compute_root_from_path, MerklePath, MerklePathVar, TREE_DEPTH};

/// Number of public signals exposed to the verifier contract.
pub const SWAP_WITHDRAW_PUBLIC_INPUTS: usize = 4;

#[derive(Clone)]
pub struct SwapWithdrawCircuit {
    // Public inputs
    pub merkle_root: Option<Fr>,
    pub nullifier: Option<Fr>,
    pub token_address: Option<Fr>,
    pub deposit_amount: Option<Fr>,

    // Witnesses
    pub secret: Option<Fr>,
    pub nonce: Option<Fr>,
    pub path: Option<MerklePath>,
}

impl SwapWithdrawCircuit {
    /// Create an empty circuit for setup at the deployed tree depth.
    pub fn empty() -> Self {
        Self::empty_with_depth(TREE_DEPTH)
    }

    /// Create an empty circuit for setup. Uses dummy values that produce
    /// the correct constraint structure.
    pub fn empty_with_depth(depth: usize) -> Self {
        Self {
            merkle_root: Some(Fr::from(0u64)),
            nullifier: Some(Fr::from(0u64)),
            token_address: Some(Fr::from(0u64)),
            deposit_amount: Some(Fr::from(0u64)),
            secret: Some(Fr::from(0u64)),
            nonce: Some(Fr::from(0u64)),
            path: Some(MerklePath::empty(depth)),
        }
    }

    /// Create a circuit with witnesses; the root is recomputed from the path.
    pub fn new(token: Fr, amount: Fr, secret: Fr, nonce: Fr, path: MerklePath) -> Self {
        let commitment = token_commitment(token, amount, secret, nonce);
        let merkle_root = path.compute_root(commitment);

        Self {
            merkle_root: Some(merkle_root),
            nullifier: Some(token_nullifier(nonce)),
            token_address: Some(token),
            deposit_amount: Some(amount),
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
            self.token_address?,
            self.deposit_amount?,
        ])
    }
}

impl ConstraintSynthesizer<Fr> for SwapWithdrawCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        // === Allocate public inputs ===
        let root_var = FpVar::new_input(cs.clone(), || {
            self.merkle_root.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let nullifier_var = FpVar::new_input(cs.clone(), || {
            self.nullifier.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let token_var = FpVar::new_input(cs.clone(), || {
            self.token_address.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let amount_var = FpVar::new_input(cs.clone(), || {
            self.deposit_amount.ok_or(SynthesisError::AssignmentMissing)
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

        // === Constraint 1: nullifier reveals the nonce ===
        nullifier_var.enforce_equal(&nonce_var)?;

        // === Constraint 2: commitment is a leaf under merkle_root ===
        let commitment_var = token_commitment_var(&token_var, &amount_var, &secret_var, &nonce_var)?;
        let computed_root = compute_root_from_path(&commitment_var, &path_var)?;
        computed_root.enforce_equal(&root_var)?;

        Ok(())
    }
}
