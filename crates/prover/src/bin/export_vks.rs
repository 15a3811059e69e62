//! Export verifying keys for verifier-contract deployment.
//!
//! Loads (or generates) the circuit keys and writes each verifying key both
//! as compressed arkworks bytes and as a snarkjs-style `verification_key.json`
//! with decimal coordinates, which is what Solidity verifier generators read.

use std::path::PathBuf;

use ark_bn254::{Bn254, Fq, G1Affine, G2Affine};
use ark_ff::PrimeField;
use ark_groth16::VerifyingKey;
use num_bigint::BigUint;
use serde_json::{json, Value};

use unizwap_prover::setup::{load_or_setup, CircuitId};

fn main() {
    let keys_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("keys"));

    println!("Loading or generating circuit keys in {:?}...", keys_dir);
    let keys = load_or_setup(&keys_dir).expect("Failed to load or generate keys");

    println!("\n=== Verifying Keys ===\n");

    let mut bundle = serde_json::Map::new();
    for id in CircuitId::ALL {
        let pair = keys.get(id);
        let vk_bytes = pair.serialize_vk().expect("Failed to serialize verifying key");

        println!("{} VK ({} bytes, {} public inputs):", id, vk_bytes.len(), id.public_input_count());
        println!("0x{}\n", hex::encode(&vk_bytes));

        let snarkjs = snarkjs_verification_key(&pair.verifying_key);
        let path = keys_dir.join(format!("{}_verification_key.json", id.name()));
        std::fs::write(&path, serde_json::to_string_pretty(&snarkjs).expect("valid JSON"))
            .expect("Failed to write verification key JSON");
        println!("snarkjs verification key written to {:?}", path);

        bundle.insert(format!("{}_vk", id.name()), json!(format!("0x{}", hex::encode(&vk_bytes))));
    }

    let json_path = keys_dir.join("verifying_keys.json");
    std::fs::write(&json_path, serde_json::to_string_pretty(&Value::Object(bundle)).expect("valid JSON"))
        .expect("Failed to write JSON");
    println!("\nJSON exported to {:?}", json_path);
}

fn fq(value: &Fq) -> String {
    BigUint::from(value.into_bigint()).to_string()
}

fn g1(point: &G1Affine) -> Value {
    json!([fq(&point.x), fq(&point.y), "1"])
}

fn g2(point: &G2Affine) -> Value {
    json!([
        [fq(&point.x.c0), fq(&point.x.c1)],
        [fq(&point.y.c0), fq(&point.y.c1)],
        ["1", "0"]
    ])
}

fn snarkjs_verification_key(vk: &VerifyingKey<Bn254>) -> Value {
    json!({
        "protocol": "groth16",
        "curve": "bn128",
        "nPublic": vk.gamma_abc_g1.len() - 1,
        "vk_alpha_1": g1(&vk.alpha_g1),
        "vk_beta_2": g2(&vk.beta_g2),
        "vk_gamma_2": g2(&vk.gamma_g2),
        "vk_delta_2": g2(&vk.delta_g2),
        "IC": vk.gamma_abc_g1.iter().map(g1).collect::<Vec<_>>(),
    })
}
