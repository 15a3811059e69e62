//! Circom-compatible Poseidon hash over the BN254 scalar field.
//!
//! Commitments and Merkle nodes are hashed with the same permutation the
//! deployed verifier circuits use (x^5 S-box, 8 full rounds, state
//! `[0, inputs..]`, output `state[0]`). Native hashing goes through
//! `light-poseidon`; the R1CS gadget replays the identical rounds over
//! `FpVar` using the same constants.

mod params;
mod native;
mod gadgets;

#[cfg(test)]
mod tests;

pub use native::{poseidon_hash_three, poseidon_hash_two};
pub use gadgets::{poseidon_hash_three_var, poseidon_hash_two_var};
pub use params::circom_parameters;
