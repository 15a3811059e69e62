//! Proof generation library for the private hook circuits.
//!
//! This crate provides utilities for:
//! - Trusted setup (generating proving and verifying keys)
//! - Key persistence to and from a directory
//! - Proof generation with a satisfiability pre-check
//! - Local proof verification

pub mod prove;
pub mod setup;
pub mod verify;

pub use prove::{
    check_satisfied, prove_remove_liquidity, prove_swap_withdraw, ProofWithInputs, ProveError,
};
pub use setup::{
    load_or_setup, setup_all_circuits, setup_all_circuits_with_depth, setup_circuit, CircuitId,
    CircuitKeyPair, CircuitKeys, SetupError,
};
pub use verify::{verify_proof, VerifyError};

use ark_bn254::Fr;

/// Common field type for all operations
pub type ConstraintF = Fr;
