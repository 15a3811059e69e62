//! Trusted setup utilities for generating proving and verifying keys.

use std::fmt;
use std::path::Path;

use ark_bn254::Bn254;
use ark_groth16::{Groth16, ProvingKey, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;
use ark_std::rand::{rngs::StdRng, SeedableRng};
use thiserror::Error;
use tracing::info;

use unizwap_circuits::{
    RemoveLiquidityCircuit, SwapWithdrawCircuit, REMOVE_LIQUIDITY_PUBLIC_INPUTS,
    SWAP_WITHDRAW_PUBLIC_INPUTS, TREE_DEPTH,
};

/// Errors that can occur during setup
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Circuit setup failed: {0}")]
    CircuitSetup(String),
    #[error("Serialization failed: {0}")]
    Serialization(String),
    #[error("Deserialization failed: {0}")]
    Deserialization(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The two constraint programs the verifier contracts accept.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CircuitId {
    /// Vault and router withdrawals.
    SwapWithdraw,
    /// Private LP position removal.
    RemoveLiquidity,
}

impl CircuitId {
    pub const ALL: [CircuitId; 2] = [CircuitId::SwapWithdraw, CircuitId::RemoveLiquidity];

    /// File stem used for the key files.
    pub fn name(&self) -> &'static str {
        match self {
            CircuitId::SwapWithdraw => "swap_withdraw",
            CircuitId::RemoveLiquidity => "remove_liquidity",
        }
    }

    pub fn public_input_count(&self) -> usize {
        match self {
            CircuitId::SwapWithdraw => SWAP_WITHDRAW_PUBLIC_INPUTS,
            CircuitId::RemoveLiquidity => REMOVE_LIQUIDITY_PUBLIC_INPUTS,
        }
    }
}

impl fmt::Display for CircuitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Keys for a single circuit
#[derive(Clone)]
pub struct CircuitKeyPair {
    pub proving_key: ProvingKey<Bn254>,
    pub verifying_key: VerifyingKey<Bn254>,
}

impl CircuitKeyPair {
    /// Serialize proving key to bytes
    pub fn serialize_pk(&self) -> Result<Vec<u8>, SetupError> {
        let mut bytes = Vec::new();
        self.proving_key
            .serialize_compressed(&mut bytes)
            .map_err(|e| SetupError::Serialization(e.to_string()))?;
        Ok(bytes)
    }

    /// Serialize verifying key to bytes
    pub fn serialize_vk(&self) -> Result<Vec<u8>, SetupError> {
        let mut bytes = Vec::new();
        self.verifying_key
            .serialize_compressed(&mut bytes)
            .map_err(|e| SetupError::Serialization(e.to_string()))?;
        Ok(bytes)
    }

    /// Deserialize proving key from bytes
    pub fn deserialize_pk(bytes: &[u8]) -> Result<ProvingKey<Bn254>, SetupError> {
        ProvingKey::deserialize_compressed(bytes)
            .map_err(|e| SetupError::Deserialization(e.to_string()))
    }

    /// Deserialize verifying key from bytes
    pub fn deserialize_vk(bytes: &[u8]) -> Result<VerifyingKey<Bn254>, SetupError> {
        VerifyingKey::deserialize_compressed(bytes)
            .map_err(|e| SetupError::Deserialization(e.to_string()))
    }
}

/// All circuit keys
#[derive(Clone)]
pub struct CircuitKeys {
    pub swap_withdraw: CircuitKeyPair,
    pub remove_liquidity: CircuitKeyPair,
}

impl CircuitKeys {
    pub fn get(&self, id: CircuitId) -> &CircuitKeyPair {
        match id {
            CircuitId::SwapWithdraw => &self.swap_withdraw,
            CircuitId::RemoveLiquidity => &self.remove_liquidity,
        }
    }

    /// Save all keys to a directory as `<circuit>.pk` / `<circuit>.vk`
    pub fn save_to_directory(&self, dir: &Path) -> Result<(), SetupError> {
        std::fs::create_dir_all(dir)?;

        for id in CircuitId::ALL {
            let pair = self.get(id);
            std::fs::write(dir.join(format!("{}.pk", id.name())), pair.serialize_pk()?)?;
            std::fs::write(dir.join(format!("{}.vk", id.name())), pair.serialize_vk()?)?;
        }

        Ok(())
    }

    /// Load all keys from a directory
    pub fn load_from_directory(dir: &Path) -> Result<Self, SetupError> {
        let load = |id: CircuitId| -> Result<CircuitKeyPair, SetupError> {
            Ok(CircuitKeyPair {
                proving_key: CircuitKeyPair::deserialize_pk(&std::fs::read(
                    dir.join(format!("{}.pk", id.name())),
                )?)?,
                verifying_key: CircuitKeyPair::deserialize_vk(&std::fs::read(
                    dir.join(format!("{}.vk", id.name())),
                )?)?,
            })
        };

        Ok(Self {
            swap_withdraw: load(CircuitId::SwapWithdraw)?,
            remove_liquidity: load(CircuitId::RemoveLiquidity)?,
        })
    }

    /// Whether every key file exists under `dir`.
    pub fn present_in(dir: &Path) -> bool {
        CircuitId::ALL.iter().all(|id| {
            dir.join(format!("{}.pk", id.name())).is_file()
                && dir.join(format!("{}.vk", id.name())).is_file()
        })
    }
}

/// Run trusted setup for both circuits at the deployed tree depth
pub fn setup_all_circuits() -> Result<CircuitKeys, SetupError> {
    setup_all_circuits_with_depth(TREE_DEPTH)
}

/// Run trusted setup for both circuits.
///
/// Each circuit gets its own fixed-seed RNG so the two setups can run in
/// parallel and still be reproducible (in production, use secure randomness).
pub fn setup_all_circuits_with_depth(depth: usize) -> Result<CircuitKeys, SetupError> {
    let (swap_withdraw, remove_liquidity) = rayon::join(
        || setup_circuit(CircuitId::SwapWithdraw, depth, &mut StdRng::seed_from_u64(42)),
        || setup_circuit(CircuitId::RemoveLiquidity, depth, &mut StdRng::seed_from_u64(43)),
    );

    Ok(CircuitKeys {
        swap_withdraw: swap_withdraw?,
        remove_liquidity: remove_liquidity?,
    })
}

/// Setup a single circuit
pub fn setup_circuit(
    id: CircuitId,
    depth: usize,
    rng: &mut StdRng,
) -> Result<CircuitKeyPair, SetupError> {
    info!(circuit = %id, depth, "running circuit-specific setup");

    let (pk, vk) = match id {
        CircuitId::SwapWithdraw => Groth16::<Bn254>::circuit_specific_setup(
            SwapWithdrawCircuit::empty_with_depth(depth),
            rng,
        ),
        CircuitId::RemoveLiquidity => Groth16::<Bn254>::circuit_specific_setup(
            RemoveLiquidityCircuit::empty_with_depth(depth),
            rng,
        ),
    }
    .map_err(|e| SetupError::CircuitSetup(e.to_string()))?;

    Ok(CircuitKeyPair {
        proving_key: pk,
        verifying_key: vk,
    })
}

/// Load keys from `dir`, or run setup and persist them there.
pub fn load_or_setup(dir: &Path) -> Result<CircuitKeys, SetupError> {
    if CircuitKeys::present_in(dir) {
        info!(dir = %dir.display(), "loading circuit keys");
        return CircuitKeys::load_from_directory(dir);
    }

    info!(dir = %dir.display(), "no circuit keys found, running trusted setup");
    let keys = setup_all_circuits()?;
    keys.save_to_directory(dir)?;
    Ok(keys)
}
