//! Inclusion path for a single leaf.

use ark_bn254::Fr;

use crate::poseidon::poseidon_hash_two;

/// Sibling hashes from the leaf level up to the child of the root, together
/// with the direction bit at each level (`true` = current node is the right
/// child, i.e. bit `i` of the leaf index is set).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerklePath {
    elements: Vec<Fr>,
    indices: Vec<bool>,
}

impl MerklePath {
    pub fn new(elements: Vec<Fr>, indices: Vec<bool>) -> Self {
        assert_eq!(
            elements.len(),
            indices.len(),
            "Path elements and indices must have same length"
        );
        Self { elements, indices }
    }

    /// Path with all-zero siblings for the leftmost leaf. Used to shape
    /// circuits during setup.
    pub fn empty(depth: usize) -> Self {
        Self {
            elements: vec![Fr::from(0u64); depth],
            indices: vec![false; depth],
        }
    }

    pub fn elements(&self) -> &[Fr] {
        &self.elements
    }

    pub fn indices(&self) -> &[bool] {
        &self.indices
    }

    pub fn depth(&self) -> usize {
        self.elements.len()
    }

    /// Leaf index encoded by the direction bits.
    pub fn leaf_index(&self) -> u64 {
        self.indices
            .iter()
            .enumerate()
            .fold(0u64, |acc, (level, &bit)| acc | ((bit as u64) << level))
    }

    /// Hash `leaf` upward through the path.
    pub fn compute_root(&self, leaf: Fr) -> Fr {
        let mut current = leaf;
        for (sibling, &is_right) in self.elements.iter().zip(self.indices.iter()) {
            current = if is_right {
                poseidon_hash_two(*sibling, current)
            } else {
                poseidon_hash_two(current, *sibling)
            };
        }
        current
    }
}
