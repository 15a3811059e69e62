//! Commitment and nullifier derivations.
//!
//! Two families exist. Token/amount commitments (vault deposit, router swap
//! output) hide `H2(secret, nonce)` under the token and amount; the nonce
//! itself is the nullifier. Position commitments (liquidity positions) bind
//! the position id directly and use a hashed nullifier.

use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::r1cs::SynthesisError;

use crate::poseidon::{
    poseidon_hash_three, poseidon_hash_three_var, poseidon_hash_two, poseidon_hash_two_var,
};

/// `H2(secret, nonce)`
pub fn secret_hash(secret: Fr, nonce: Fr) -> Fr {
    poseidon_hash_two(secret, nonce)
}

/// `H3(token, amount, H2(secret, nonce))`
pub fn token_commitment(token: Fr, amount: Fr, secret: Fr, nonce: Fr) -> Fr {
    poseidon_hash_three(token, amount, secret_hash(secret, nonce))
}

/// The token/amount family reveals the nonce directly.
pub fn token_nullifier(nonce: Fr) -> Fr {
    nonce
}

/// `H3(secret, nonce, position_id)`
pub fn position_commitment(secret: Fr, nonce: Fr, position_id: Fr) -> Fr {
    poseidon_hash_three(secret, nonce, position_id)
}

/// `H2(secret, position_id)`
pub fn position_nullifier(secret: Fr, position_id: Fr) -> Fr {
    poseidon_hash_two(secret, position_id)
}

pub fn token_commitment_var(
    token: &FpVar<Fr>,
    amount: &FpVar<Fr>,
    secret: &FpVar<Fr>,
    nonce: &FpVar<Fr>,
) -> Result<FpVar<Fr>, SynthesisError> {
    let inner = poseidon_hash_two_var(secret, nonce)?;
    poseidon_hash_three_var(token, amount, &inner)
}

pub fn position_commitment_var(
    secret: &FpVar<Fr>,
    nonce: &FpVar<Fr>,
    position_id: &FpVar<Fr>,
) -> Result<FpVar<Fr>, SynthesisError> {
    poseidon_hash_three_var(secret, nonce, position_id)
}

pub fn position_nullifier_var(
    secret: &FpVar<Fr>,
    position_id: &FpVar<Fr>,
) -> Result<FpVar<Fr>, SynthesisError> {
    poseidon_hash_two_var(secret, position_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_r1cs_std::alloc::AllocVar;
    use ark_r1cs_std::R1CSVar;
    use ark_relations::r1cs::ConstraintSystem;
    use std::str::FromStr;

    fn fr(s: &str) -> Fr {
        Fr::from_str(s).unwrap()
    }

    #[test]
    fn test_vault_commitment_vector() {
        let token = fr("1388481480563447067243871344124803744406475951998");
        let commitment = token_commitment(
            token,
            Fr::from(1000u64),
            Fr::from(111111u64),
            Fr::from(222222u64),
        );
        assert_eq!(
            commitment,
            fr("2840720916161317404421904847614166435586297948067539087024511644995353601505")
        );
    }

    #[test]
    fn test_position_vectors() {
        let secret = Fr::from(987654u64);
        let nonce = Fr::from(321098u64);
        let position = Fr::from(23014u64);

        assert_eq!(
            position_commitment(secret, nonce, position),
            fr("4879737083394229377189384071160052584602963015974602669038152871562647954392")
        );
        assert_eq!(
            position_nullifier(secret, position),
            fr("17285248248221342331707169051778187601017173204117915793496600338979109651993")
        );
    }

    #[test]
    fn test_token_nullifier_is_nonce() {
        assert_eq!(token_nullifier(Fr::from(7u64)), Fr::from(7u64));
    }

    #[test]
    fn test_commitment_binds_amount() {
        let token = Fr::from(5u64);
        let a = token_commitment(token, Fr::from(100u64), Fr::from(1u64), Fr::from(2u64));
        let b = token_commitment(token, Fr::from(101u64), Fr::from(1u64), Fr::from(2u64));
        assert_ne!(a, b);
    }

    #[test]
    fn test_gadgets_match_native() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let values = [Fr::from(9u64), Fr::from(1000u64), Fr::from(3u64), Fr::from(4u64)];
        let vars: Vec<FpVar<Fr>> = values
            .iter()
            .map(|v| FpVar::new_witness(cs.clone(), || Ok(*v)).unwrap())
            .collect();

        let token = token_commitment_var(&vars[0], &vars[1], &vars[2], &vars[3]).unwrap();
        assert_eq!(
            token.value().unwrap(),
            token_commitment(values[0], values[1], values[2], values[3])
        );

        let position = position_commitment_var(&vars[2], &vars[3], &vars[0]).unwrap();
        assert_eq!(
            position.value().unwrap(),
            position_commitment(values[2], values[3], values[0])
        );

        let nullifier = position_nullifier_var(&vars[2], &vars[0]).unwrap();
        assert_eq!(nullifier.value().unwrap(), position_nullifier(values[2], values[0]));
        assert!(cs.is_satisfied().unwrap());
    }
}
