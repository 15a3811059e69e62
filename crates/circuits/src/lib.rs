//! ZK circuits for the private swap and liquidity hooks.
//!
//! This crate provides:
//! - Circom-compatible Poseidon (`H2`, `H3`) natively and as R1CS gadgets
//! - Commitment and nullifier derivations for both commitment families
//! - A fixed-depth Merkle tree with inclusion paths
//! - `SwapWithdrawCircuit`: withdraw a vault or router commitment (4 public inputs)
//! - `RemoveLiquidityCircuit`: remove a private LP position (6 public inputs)

pub mod commitment;
pub mod field;
pub mod merkle;
pub mod poseidon;
pub mod remove_liquidity;
pub mod swap_withdraw;


pub use commitment::{
    position_commitment, position_nullifier, secret_hash, token_commitment, token_nullifier,
};
pub use merkle::{zero_hashes, MerklePath, MerkleTree, TREE_DEPTH, ZERO_LEAF};
pub use poseidon::{poseidon_hash_three, poseidon_hash_two};
pub use remove_liquidity::{PositionRemoval, RemoveLiquidityCircuit, REMOVE_LIQUIDITY_PUBLIC_INPUTS};
pub use swap_withdraw::{SwapWithdrawCircuit, SWAP_WITHDRAW_PUBLIC_INPUTS};

use ark_bn254::Fr;

/// Common type aliases
pub type ConstraintF = Fr;
