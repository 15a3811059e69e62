//! Integration tests for Poseidon hash functions.

use super::*;
use ark_bn254::Fr;
use ark_r1cs_std::alloc::AllocVar;
use ark_r1cs_std::eq::EqGadget;
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::r1cs::ConstraintSystem;
use std::str::FromStr;

#[test]
fn test_hash_two_consistency() {
    let cs = ConstraintSystem::<Fr>::new_ref();

    let a = Fr::from(123u64);
    let b = Fr::from(456u64);
    let native_result = poseidon_hash_two(a, b);

    let a_var = FpVar::new_witness(cs.clone(), || Ok(a)).unwrap();
    let b_var = FpVar::new_witness(cs.clone(), || Ok(b)).unwrap();
    let gadget_result = poseidon_hash_two_var(&a_var, &b_var).unwrap();
    let expected_var = FpVar::new_input(cs.clone(), || Ok(native_result)).unwrap();
    gadget_result.enforce_equal(&expected_var).unwrap();

    assert!(cs.is_satisfied().unwrap());
}

#[test]
fn test_gadget_rejects_wrong_digest() {
    let cs = ConstraintSystem::<Fr>::new_ref();

    let a = Fr::from(123u64);
    let b = Fr::from(456u64);
    let wrong = poseidon_hash_two(b, a);

    let a_var = FpVar::new_witness(cs.clone(), || Ok(a)).unwrap();
    let b_var = FpVar::new_witness(cs.clone(), || Ok(b)).unwrap();
    let gadget_result = poseidon_hash_two_var(&a_var, &b_var).unwrap();
    let expected_var = FpVar::new_input(cs.clone(), || Ok(wrong)).unwrap();
    gadget_result.enforce_equal(&expected_var).unwrap();

    assert!(!cs.is_satisfied().unwrap());
}

#[test]
fn test_nested_commitment_vector() {
    // H3(tokenB, 1000, H2(333333, 444444)) with tokenB = 0xF335a9B58f2AA6A2f884d2dA4E308F7378A4CF7e
    let token = Fr::from_str("1388481480563447067243871344124803744406475951998").unwrap();
    let inner = poseidon_hash_two(Fr::from(333333u64), Fr::from(444444u64));

    assert_eq!(
        inner,
        Fr::from_str(
            "17033463566182943925750461012165289798644226264627013284809700362372275991587"
        )
        .unwrap()
    );
    assert_eq!(
        poseidon_hash_three(token, Fr::from(1000u64), inner),
        Fr::from_str(
            "17492826790431399524686151264950167792745422925166917129100330167091641222185"
        )
        .unwrap()
    );
}
