//! Proof generation for the hook circuits.

use ark_bn254::{Bn254, Fr};
use ark_groth16::{Groth16, Proof, ProvingKey};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystem, SynthesisError};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;
use ark_std::rand::{rngs::StdRng, SeedableRng};
use thiserror::Error;
use tracing::debug;

use unizwap_circuits::{RemoveLiquidityCircuit, SwapWithdrawCircuit};

/// Errors during proof generation
#[derive(Error, Debug)]
pub enum ProveError {
    #[error("Proof generation failed: {0}")]
    ProofGeneration(String),
    #[error("Witness does not satisfy constraint {0}")]
    Unsatisfied(String),
    #[error("Witness is missing public inputs")]
    MissingInputs,
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl From<SynthesisError> for ProveError {
    fn from(e: SynthesisError) -> Self {
        ProveError::ProofGeneration(e.to_string())
    }
}

/// A proof with its public inputs
#[derive(Clone, Debug, PartialEq)]
pub struct ProofWithInputs {
    pub proof: Proof<Bn254>,
    pub public_inputs: Vec<Fr>,
}

impl ProofWithInputs {
    /// Serialize proof to bytes
    pub fn serialize_proof(&self) -> Result<Vec<u8>, ProveError> {
        let mut bytes = Vec::new();
        self.proof
            .serialize_compressed(&mut bytes)
            .map_err(|e| ProveError::Serialization(e.to_string()))?;
        Ok(bytes)
    }

    /// Deserialize proof from bytes
    pub fn deserialize_proof(bytes: &[u8]) -> Result<Proof<Bn254>, ProveError> {
        Proof::deserialize_compressed(bytes).map_err(|e| ProveError::Serialization(e.to_string()))
    }
}

/// Run the circuit against a fresh constraint system and report the first
/// unsatisfied constraint. Groth16 proving does not check satisfiability
/// itself; without this a bad witness yields a proof that merely fails to
/// verify.
pub fn check_satisfied<C: ConstraintSynthesizer<Fr>>(circuit: C) -> Result<(), ProveError> {
    let cs = ConstraintSystem::<Fr>::new_ref();
    circuit.generate_constraints(cs.clone())?;

    if cs.is_satisfied()? {
        return Ok(());
    }
    let which = cs
        .which_is_unsatisfied()?
        .unwrap_or_else(|| "<unknown>".to_string());
    Err(ProveError::Unsatisfied(which))
}

/// Generate proof for SwapWithdrawCircuit (vault and router withdrawals)
pub fn prove_swap_withdraw(
    pk: &ProvingKey<Bn254>,
    circuit: SwapWithdrawCircuit,
) -> Result<ProofWithInputs, ProveError> {
    let public_inputs = circuit.public_inputs().ok_or(ProveError::MissingInputs)?;
    prove_circuit(pk, circuit, public_inputs)
}

/// Generate proof for RemoveLiquidityCircuit
pub fn prove_remove_liquidity(
    pk: &ProvingKey<Bn254>,
    circuit: RemoveLiquidityCircuit,
) -> Result<ProofWithInputs, ProveError> {
    let public_inputs = circuit.public_inputs().ok_or(ProveError::MissingInputs)?;
    prove_circuit(pk, circuit, public_inputs)
}

fn prove_circuit<C>(
    pk: &ProvingKey<Bn254>,
    circuit: C,
    public_inputs: Vec<Fr>,
) -> Result<ProofWithInputs, ProveError>
where
    C: ConstraintSynthesizer<Fr> + Clone,
{
    check_satisfied(circuit.clone())?;

    let mut rng = StdRng::from_entropy();
    let proof = Groth16::<Bn254>::prove(pk, circuit, &mut rng)
        .map_err(|e| ProveError::ProofGeneration(e.to_string()))?;
    debug!(inputs = public_inputs.len(), "groth16 proof generated");

    Ok(ProofWithInputs {
        proof,
        public_inputs,
    })
}
