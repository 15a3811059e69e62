//! Round constants and MDS matrices for the circom parameter set.

use std::sync::OnceLock;

use ark_bn254::Fr;
use light_poseidon::parameters::bn254_x5::get_poseidon_parameters;
use light_poseidon::PoseidonParameters;

static WIDTH_3: OnceLock<PoseidonParameters<Fr>> = OnceLock::new();
static WIDTH_4: OnceLock<PoseidonParameters<Fr>> = OnceLock::new();

/// Parameters for a Poseidon instance hashing `arity` inputs.
///
/// Only the two arities used by the circuits are cached: 2 (Merkle nodes,
/// secret hash, LP nullifier) and 3 (commitments).
pub fn circom_parameters(arity: usize) -> &'static PoseidonParameters<Fr> {
    let (cell, width) = match arity {
        2 => (&WIDTH_3, 3u8),
        3 => (&WIDTH_4, 4u8),
        other => panic!("no cached circom parameters for arity {}", other),
    };
    cell.get_or_init(|| {
        get_poseidon_parameters::<Fr>(width)
            .expect("light-poseidon ships circom parameters for widths 3 and 4")
    })
}
