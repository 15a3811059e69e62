//! Fixed-depth append-only Merkle tree over commitments.
//!
//! This module provides:
//! - Native tree construction from a full leaf array with cached zero subtrees
//! - Inclusion paths (sibling hashes plus left/right bits)
//! - In-circuit root recomputation from a path

mod tree;
mod path;
mod gadgets;


pub use tree::{zero_hashes, MerkleTree, TREE_DEPTH, ZERO_LEAF};
pub use path::MerklePath;
pub use gadgets::{compute_root_from_path, MerklePathVar};
