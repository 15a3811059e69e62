//! Native Poseidon hash functions (outside circuits).

use ark_bn254::Fr;
use light_poseidon::{Poseidon, PoseidonHasher};

/// `H2(a, b)`: circomlib `Poseidon(2)`.
pub fn poseidon_hash_two(a: Fr, b: Fr) -> Fr {
    hash_fixed(&[a, b])
}

/// `H3(a, b, c)`: circomlib `Poseidon(3)`.
pub fn poseidon_hash_three(a: Fr, b: Fr, c: Fr) -> Fr {
    hash_fixed(&[a, b, c])
}

fn hash_fixed(inputs: &[Fr]) -> Fr {
    // Arity is fixed by the two public wrappers above, both supported widths.
    let mut hasher = Poseidon::<Fr>::new_circom(inputs.len())
        .expect("circom Poseidon supports up to 12 inputs");
    hasher
        .hash(inputs)
        .expect("input count matches the hasher width")
}
