//! In-circuit Merkle path verification.

use ark_bn254::Fr;
use ark_r1cs_std::{boolean::Boolean, fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use super::path::MerklePath;
use crate::poseidon::poseidon_hash_two_var;

/// Circuit variable representation of a Merkle path.
#[derive(Clone)]
pub struct MerklePathVar {
    elements: Vec<FpVar<Fr>>,
    indices: Vec<Boolean<Fr>>,
}

impl MerklePathVar {
    /// Allocate a path as witness variables.
    pub fn new_witness(
        cs: ConstraintSystemRef<Fr>,
        path: &MerklePath,
    ) -> Result<Self, SynthesisError> {
        let elements = path
            .elements()
            .iter()
            .map(|h| FpVar::new_witness(cs.clone(), || Ok(*h)))
            .collect::<Result<Vec<_>, _>>()?;

        let indices = path
            .indices()
            .iter()
            .map(|&b| Boolean::new_witness(cs.clone(), || Ok(b)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { elements, indices })
    }

    pub fn elements(&self) -> &[FpVar<Fr>] {
        &self.elements
    }

    pub fn indices(&self) -> &[Boolean<Fr>] {
        &self.indices
    }

    pub fn depth(&self) -> usize {
        self.elements.len()
    }
}

/// Compute the root from a leaf and its path in-circuit.
pub fn compute_root_from_path(
    leaf: &FpVar<Fr>,
    path: &MerklePathVar,
) -> Result<FpVar<Fr>, SynthesisError> {
    let mut current = leaf.clone();

    for (sibling, is_right) in path.elements.iter().zip(path.indices.iter()) {
        // If is_right: H(sibling, current), else H(current, sibling)
        let left = is_right.select(sibling, &current)?;
        let right = is_right.select(&current, sibling)?;

        current = poseidon_hash_two_var(&left, &right)?;
    }

    Ok(current)
}

#[cfg(test)]
mod gadget_tests {
    use super::*;
    use crate::merkle::MerkleTree;
    use ark_relations::r1cs::ConstraintSystem;

    #[test]
    fn test_gadget_root_matches_native() {
        let leaves: Vec<Fr> = (1..=5u64).map(Fr::from).collect();
        let tree = MerkleTree::from_leaves(4, leaves.clone());
        let path = tree.path(3);

        let cs = ConstraintSystem::<Fr>::new_ref();
        let leaf = FpVar::new_witness(cs.clone(), || Ok(leaves[3])).unwrap();
        let path_var = MerklePathVar::new_witness(cs.clone(), &path).unwrap();
        let root = compute_root_from_path(&leaf, &path_var).unwrap();

        let expected = FpVar::new_input(cs.clone(), || Ok(tree.root())).unwrap();
        root.enforce_equal(&expected).unwrap();

        assert_eq!(path_var.depth(), 4);
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_gadget_wrong_leaf_unsatisfied() {
        let leaves: Vec<Fr> = (1..=5u64).map(Fr::from).collect();
        let tree = MerkleTree::from_leaves(4, leaves);
        let path = tree.path(3);

        let cs = ConstraintSystem::<Fr>::new_ref();
        let leaf = FpVar::new_witness(cs.clone(), || Ok(Fr::from(99u64))).unwrap();
        let path_var = MerklePathVar::new_witness(cs.clone(), &path).unwrap();
        let root = compute_root_from_path(&leaf, &path_var).unwrap();

        let expected = FpVar::new_input(cs.clone(), || Ok(tree.root())).unwrap();
        root.enforce_equal(&expected).unwrap();

        assert!(!cs.is_satisfied().unwrap());
    }
}
