//! Native fixed-depth Merkle tree.
//!
//! Level 0 holds the leaves, level `depth` the root. Each level stores only
//! its occupied prefix; every slot past it is the all-zero subtree hash for
//! that level, so an almost-empty tree of depth 10 hashes a handful of nodes
//! instead of 1023.

use ark_bn254::Fr;
use ark_ff::MontFp;
use rayon::prelude::*;

use super::path::MerklePath;
use crate::poseidon::poseidon_hash_two;

/// Depth of the deployed anonymity-set trees (1024 leaves).
pub const TREE_DEPTH: usize = 10;

/// Value of an unfilled leaf slot.
pub const ZERO_LEAF: Fr = MontFp!("0");

/// Levels below which hashing stays on the current thread.
const PARALLEL_THRESHOLD: usize = 64;

/// `zeros[0] = ZERO_LEAF`, `zeros[i + 1] = H2(zeros[i], zeros[i])`.
pub fn zero_hashes(depth: usize) -> Vec<Fr> {
    let mut zeros = Vec::with_capacity(depth + 1);
    let mut current = ZERO_LEAF;
    zeros.push(current);
    for _ in 0..depth {
        current = poseidon_hash_two(current, current);
        zeros.push(current);
    }
    zeros
}

#[derive(Clone, Debug)]
pub struct MerkleTree {
    depth: usize,
    levels: Vec<Vec<Fr>>,
    zeros: Vec<Fr>,
}

impl MerkleTree {
    /// An empty tree of the given depth.
    pub fn new(depth: usize) -> Self {
        Self::from_leaves(depth, Vec::new())
    }

    /// Build the tree bottom-up from the leaf array. Slots past the end of
    /// `leaves` hold [`ZERO_LEAF`].
    pub fn from_leaves(depth: usize, leaves: Vec<Fr>) -> Self {
        assert!(depth < 64, "tree depth {} not supported", depth);
        assert!(
            leaves.len() as u64 <= 1u64 << depth,
            "{} leaves exceed tree capacity {}",
            leaves.len(),
            1u64 << depth
        );

        let zeros = zero_hashes(depth);
        let mut levels = Vec::with_capacity(depth + 1);
        levels.push(leaves);

        for level in 0..depth {
            let zero = zeros[level];
            let current = &levels[level];
            let parents: Vec<Fr> = if current.len() >= PARALLEL_THRESHOLD {
                current
                    .par_chunks(2)
                    .map(|pair| hash_pair(pair, zero))
                    .collect()
            } else {
                current.chunks(2).map(|pair| hash_pair(pair, zero)).collect()
            };
            levels.push(parents);
        }

        Self {
            depth,
            levels,
            zeros,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of leaf slots (`2^depth`).
    pub fn capacity(&self) -> u64 {
        1u64 << self.depth
    }

    /// Length of the occupied leaf prefix.
    pub fn len(&self) -> usize {
        self.levels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels[0].is_empty()
    }

    pub fn root(&self) -> Fr {
        self.node(self.depth, 0)
    }

    /// Leaf value at `index`, zero for unfilled slots.
    pub fn leaf(&self, index: u64) -> Fr {
        self.node(0, index)
    }

    /// Index of the first leaf equal to `commitment`.
    pub fn position(&self, commitment: &Fr) -> Option<u64> {
        self.levels[0]
            .iter()
            .position(|leaf| leaf == commitment)
            .map(|i| i as u64)
    }

    /// Inclusion path for the leaf at `index`.
    pub fn path(&self, index: u64) -> MerklePath {
        assert!(index < self.capacity(), "leaf index exceeds tree capacity");

        let mut elements = Vec::with_capacity(self.depth);
        let mut indices = Vec::with_capacity(self.depth);

        let mut current = index;
        for level in 0..self.depth {
            elements.push(self.node(level, current ^ 1));
            indices.push(current & 1 == 1);
            current >>= 1;
        }

        MerklePath::new(elements, indices)
    }

    /// Hash of the all-zero subtree rooted at `level`.
    pub fn zero_at_level(&self, level: usize) -> Fr {
        self.zeros[level]
    }

    fn node(&self, level: usize, index: u64) -> Fr {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.levels[level].get(i).copied())
            .unwrap_or(self.zeros[level])
    }
}

fn hash_pair(pair: &[Fr], zero: Fr) -> Fr {
    let right = pair.get(1).copied().unwrap_or(zero);
    poseidon_hash_two(pair[0], right)
}
