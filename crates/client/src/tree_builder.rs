//! Rebuild the anonymity-set tree from the ledger's insertion log.
//!
//! The hooks only expose the tree through `LeafInserted` events, so every
//! spend replays the log from deployment. [`rebuild`] is a pure function of
//! that log; nothing here holds a mutable "current tree".

use std::collections::{BTreeMap, HashMap};

use ark_bn254::Fr;
use tracing::{debug, warn};

use unizwap_circuits::field::fr_to_decimal;
use unizwap_circuits::{MerklePath, MerkleTree};

use crate::error::PrivacyError;
use crate::field::{b256_to_field, field_to_b256};
use crate::ledger::LeafInsertion;

/// A located leaf with everything a witness needs from the tree.
#[derive(Clone, Debug, PartialEq)]
pub struct Inclusion {
    pub commitment: Fr,
    pub leaf_index: u64,
    pub path: MerklePath,
    pub root: Fr,
}

#[derive(Clone, Debug)]
pub struct RebuiltTree {
    tree: MerkleTree,
    positions: HashMap<Fr, u64>,
    observed: usize,
    consistent: bool,
}

/// Replay `events` into a tree of the given depth.
///
/// Indices never seen hold the zero leaf. An index outside the tree, or one
/// index reported with two different commitments, means the log itself is
/// corrupt and is rejected.
pub fn rebuild(depth: usize, events: &[LeafInsertion]) -> Result<RebuiltTree, PrivacyError> {
    if depth == 0 || depth > 32 {
        return Err(PrivacyError::input(format!("tree depth {} outside 1..=32", depth)));
    }
    let capacity = 1u64 << depth;
    let mut slots: BTreeMap<u64, Fr> = BTreeMap::new();
    let mut latest: Option<&LeafInsertion> = None;

    for event in events {
        if event.leaf_index >= capacity {
            return Err(PrivacyError::input(format!(
                "leaf index {} outside tree of {} leaves",
                event.leaf_index, capacity
            )));
        }
        let commitment = b256_to_field(&event.commitment).ok_or_else(|| {
            PrivacyError::input(format!("commitment {} is not a field element", event.commitment))
        })?;

        if let Some(existing) = slots.insert(event.leaf_index, commitment) {
            if existing != commitment {
                return Err(PrivacyError::input(format!(
                    "leaf index {} reported with two different commitments",
                    event.leaf_index
                )));
            }
        }
        if latest.map_or(true, |l| event.leaf_index >= l.leaf_index) {
            latest = Some(event);
        }
    }

    let len = slots.keys().next_back().map_or(0, |max| max + 1);
    if len as usize != slots.len() {
        warn!(
            missing = len as usize - slots.len(),
            "insertion log has gaps; missing slots hold the zero leaf"
        );
    }

    let mut leaves = vec![Fr::from(0u64); len as usize];
    let mut positions = HashMap::with_capacity(slots.len());
    for (&index, &commitment) in &slots {
        leaves[index as usize] = commitment;
        positions.entry(commitment).or_insert(index);
    }

    let tree = MerkleTree::from_leaves(depth, leaves);
    let consistent = latest.map_or(true, |l| field_to_b256(&tree.root()) == l.new_root);
    if let Some(latest) = latest {
        if !consistent {
            warn!(
                computed = %fr_to_decimal(&tree.root()),
                reported = %latest.new_root,
                "rebuilt root differs from the last reported root; log range may be incomplete"
            );
        }
    }
    debug!(leaves = slots.len(), depth, "tree rebuilt from insertion log");

    Ok(RebuiltTree {
        tree,
        positions,
        observed: slots.len(),
        consistent,
    })
}

impl RebuiltTree {
    pub fn root(&self) -> Fr {
        self.tree.root()
    }

    pub fn depth(&self) -> usize {
        self.tree.depth()
    }

    /// Number of distinct leaves seen in the log.
    pub fn leaf_count(&self) -> usize {
        self.observed
    }

    /// Whether the root matches the one reported by the highest-index event.
    pub fn matches_reported_root(&self) -> bool {
        self.consistent
    }

    pub fn tree(&self) -> &MerkleTree {
        &self.tree
    }

    /// Find `commitment`. With `expected` the slot is checked directly;
    /// without it the replayed log is searched.
    pub fn locate(&self, commitment: &Fr, expected: Option<u64>) -> Result<u64, PrivacyError> {
        let found = match expected {
            Some(index) if index < self.tree.capacity() && self.tree.leaf(index) == *commitment => {
                Some(index)
            }
            Some(_) => None,
            None => self.positions.get(commitment).copied(),
        };
        found.ok_or_else(|| PrivacyError::NotFound {
            commitment: fr_to_decimal(commitment),
            observed: self.observed,
        })
    }

    pub fn inclusion(&self, commitment: &Fr, expected: Option<u64>) -> Result<Inclusion, PrivacyError> {
        let leaf_index = self.locate(commitment, expected)?;
        Ok(Inclusion {
            commitment: *commitment,
            leaf_index,
            path: self.tree.path(leaf_index),
            root: self.tree.root(),
        })
    }
}
