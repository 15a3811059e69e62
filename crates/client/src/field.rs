//! Conversions between caller input, EVM words and BN254 field elements.

use alloy_primitives::{Address, B256, U256};
use ark_bn254::{Fq, Fr};
use ark_ff::{BigInt, PrimeField};

use unizwap_circuits::field::{fr_from_be_bytes, fr_from_str_checked, fr_to_be_bytes};

use crate::error::PrivacyError;

/// Parse a decimal or `0x` hex string, naming the field in the error.
pub fn parse_field(name: &str, value: &str) -> Result<Fr, PrivacyError> {
    fr_from_str_checked(value).ok_or_else(|| {
        PrivacyError::input(format!(
            "{} must be a decimal or 0x-hex integer below the field modulus",
            name
        ))
    })
}

pub fn parse_address(name: &str, value: &str) -> Result<Address, PrivacyError> {
    value
        .trim()
        .parse::<Address>()
        .map_err(|e| PrivacyError::input(format!("{} is not an address: {}", name, e)))
}

/// Addresses are 160 bits, so they always fit.
pub fn address_to_field(address: Address) -> Fr {
    Fr::from_be_bytes_mod_order(address.as_slice())
}

pub fn u256_to_field(name: &str, value: U256) -> Result<Fr, PrivacyError> {
    fr_from_be_bytes(&value.to_be_bytes::<32>())
        .ok_or_else(|| PrivacyError::input(format!("{} exceeds the field modulus", name)))
}

pub fn field_to_u256(value: &Fr) -> U256 {
    U256::from_be_bytes(fr_to_be_bytes(value))
}

pub fn field_to_b256(value: &Fr) -> B256 {
    B256::from(fr_to_be_bytes(value))
}

/// `None` when the word is not a canonical field element.
pub fn b256_to_field(value: &B256) -> Option<Fr> {
    fr_from_be_bytes(&value.0)
}

pub fn fq_to_u256(value: &Fq) -> U256 {
    U256::from_limbs(value.into_bigint().0)
}

pub fn u256_to_fq(value: U256) -> Option<Fq> {
    Fq::from_bigint(BigInt::new(value.into_limbs()))
}
