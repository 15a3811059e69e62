//! Local proof verification, run before anything is sent on-chain.

use ark_bn254::{Bn254, Fr};
use ark_groth16::{Groth16, Proof, VerifyingKey};
use ark_snark::SNARK;
use thiserror::Error;

/// Errors during verification
#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("Verification failed: {0}")]
    Verification(String),
    #[error("Invalid public inputs: expected {expected}, got {actual}")]
    InvalidInputs { expected: usize, actual: usize },
}

/// Verify a proof against its public inputs.
///
/// A length mismatch is reported as an error rather than `false`: it means
/// the caller paired the proof with the wrong circuit's key.
pub fn verify_proof(
    vk: &VerifyingKey<Bn254>,
    proof: &Proof<Bn254>,
    public_inputs: &[Fr],
) -> Result<bool, VerifyError> {
    let expected = vk.gamma_abc_g1.len().saturating_sub(1);
    if public_inputs.len() != expected {
        return Err(VerifyError::InvalidInputs {
            expected,
            actual: public_inputs.len(),
        });
    }

    Groth16::<Bn254>::verify(vk, public_inputs, proof)
        .map_err(|e| VerifyError::Verification(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prove::prove_remove_liquidity;
    use crate::setup::{setup_circuit, CircuitId};
    use ark_std::rand::{rngs::StdRng, SeedableRng};
    use unizwap_circuits::{position_commitment, MerkleTree, PositionRemoval, RemoveLiquidityCircuit};

    fn removal_proof() -> (VerifyingKey<Bn254>, crate::ProofWithInputs) {
        let mut rng = StdRng::seed_from_u64(42);
        let keys = setup_circuit(CircuitId::RemoveLiquidity, 4, &mut rng).unwrap();

        let removal = PositionRemoval {
            token_a: Fr::from(10u64),
            token_b: Fr::from(20u64),
            token_id: Fr::from(30u64),
            liquidity: Fr::from(40u64),
        };
        let secret = Fr::from(12345u64);
        let nonce = Fr::from(678u64);
        let commitment = position_commitment(secret, nonce, removal.token_id);
        let tree = MerkleTree::from_leaves(4, vec![Fr::from(1u64), Fr::from(2u64), commitment]);

        let circuit = RemoveLiquidityCircuit::new(removal, secret, nonce, tree.path(2));
        let proof = prove_remove_liquidity(&keys.proving_key, circuit).unwrap();
        (keys.verifying_key, proof)
    }

    #[test]
    fn test_verify_remove_liquidity() {
        let (vk, result) = removal_proof();
        assert!(verify_proof(&vk, &result.proof, &result.public_inputs).unwrap());
    }

    #[test]
    fn test_verify_wrong_nullifier_fails() {
        let (vk, result) = removal_proof();

        let mut inputs = result.public_inputs.clone();
        inputs[1] = Fr::from(99999u64);
        assert!(!verify_proof(&vk, &result.proof, &inputs).unwrap());
    }

    #[test]
    fn test_verify_wrong_input_count_errors() {
        let (vk, result) = removal_proof();

        let err = verify_proof(&vk, &result.proof, &result.public_inputs[..4]).unwrap_err();
        assert!(matches!(err, VerifyError::InvalidInputs { expected: 6, actual: 4 }));
    }
}
