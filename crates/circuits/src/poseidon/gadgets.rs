//! Poseidon R1CS gadgets for in-circuit hashing.
//!
//! Round-for-round replica of the native permutation. Constants enter the
//! constraint system as coefficients, so only the S-boxes cost constraints:
//! three per S-box, giving roughly 240 constraints for `H2`.

use ark_bn254::Fr;
use ark_ff::Zero;
use ark_r1cs_std::fields::{fp::FpVar, FieldVar};
use ark_relations::r1cs::SynthesisError;
use light_poseidon::PoseidonParameters;

use super::params::circom_parameters;

/// Hash two field elements in-circuit.
pub fn poseidon_hash_two_var(a: &FpVar<Fr>, b: &FpVar<Fr>) -> Result<FpVar<Fr>, SynthesisError> {
    permute(circom_parameters(2), &[a.clone(), b.clone()])
}

/// Hash three field elements in-circuit.
pub fn poseidon_hash_three_var(
    a: &FpVar<Fr>,
    b: &FpVar<Fr>,
    c: &FpVar<Fr>,
) -> Result<FpVar<Fr>, SynthesisError> {
    permute(circom_parameters(3), &[a.clone(), b.clone(), c.clone()])
}

fn permute(
    params: &PoseidonParameters<Fr>,
    inputs: &[FpVar<Fr>],
) -> Result<FpVar<Fr>, SynthesisError> {
    let width = params.width;
    if inputs.len() + 1 != width {
        return Err(SynthesisError::Unsatisfiable);
    }

    let mut state = Vec::with_capacity(width);
    state.push(FpVar::Constant(Fr::zero()));
    state.extend(inputs.iter().cloned());

    let half_full = params.full_rounds / 2;
    let partial_end = half_full + params.partial_rounds;
    let all_rounds = params.full_rounds + params.partial_rounds;

    for round in 0..all_rounds {
        for (i, cell) in state.iter_mut().enumerate() {
            *cell += params.ark[round * width + i];
        }

        if round < half_full || round >= partial_end {
            for cell in state.iter_mut() {
                *cell = sbox(cell)?;
            }
        } else {
            state[0] = sbox(&state[0])?;
        }

        state = params
            .mds
            .iter()
            .map(|row| {
                state
                    .iter()
                    .zip(row.iter())
                    .fold(FpVar::zero(), |acc, (cell, m)| acc + cell * *m)
            })
            .collect();
    }

    Ok(state.swap_remove(0))
}

/// x^5
fn sbox(x: &FpVar<Fr>) -> Result<FpVar<Fr>, SynthesisError> {
    let x2 = x.square()?;
    let x4 = x2.square()?;
    Ok(x4 * x)
}
