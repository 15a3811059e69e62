//! Conversions between field elements and big integers.

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use num_bigint::BigUint;
use num_traits::Num;

/// Canonical decimal rendering, as snarkjs prints signals.
pub fn fr_to_decimal(value: &Fr) -> String {
    BigUint::from(value.into_bigint()).to_string()
}

/// Interpret a big integer as a field element, rejecting values `>= p`.
pub fn fr_from_biguint(value: &BigUint) -> Option<Fr> {
    if *value >= BigUint::from(Fr::MODULUS) {
        return None;
    }
    Some(Fr::from(value.clone()))
}

/// Parse a decimal or `0x`-prefixed hex string into a field element.
///
/// Out-of-range values are rejected rather than reduced: a secret that
/// silently wraps would produce a commitment nobody can reproduce.
pub fn fr_from_str_checked(value: &str) -> Option<Fr> {
    let trimmed = value.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) if !hex.is_empty() => BigUint::from_str_radix(hex, 16).ok()?,
        Some(_) => return None,
        None if !trimmed.is_empty() => BigUint::from_str_radix(trimmed, 10).ok()?,
        None => return None,
    };
    fr_from_biguint(&parsed)
}

/// Big-endian 32-byte encoding (the EVM `uint256` / `bytes32` layout).
pub fn fr_to_be_bytes(value: &Fr) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&value.into_bigint().to_bytes_be());
    out
}

/// Inverse of [`fr_to_be_bytes`]; `None` for non-canonical encodings.
pub fn fr_from_be_bytes(bytes: &[u8; 32]) -> Option<Fr> {
    fr_from_biguint(&BigUint::from_bytes_be(bytes))
}
