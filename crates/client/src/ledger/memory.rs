//! In-process ledger with the hooks' accumulator and verifier semantics.

use std::collections::{HashMap, HashSet};

use alloy_primitives::B256;
use ark_bn254::{Bn254, Fr};
use ark_groth16::VerifyingKey;
use tokio::sync::RwLock;
use tracing::{debug, info};

use unizwap_circuits::{poseidon_hash_two, zero_hashes};
use unizwap_prover::{verify_proof, CircuitKeys};

use super::{Ledger, LeafInsertion, SubmitReceipt};
use crate::calldata::Submission;
use crate::config::ClientConfig;
use crate::error::{LedgerError, Revert};
use crate::field::{b256_to_field, field_to_b256};
use crate::hook::HookPayload;
use crate::operation::CircuitId;

struct State {
    height: u64,
    next_index: u64,
    filled_subtrees: Vec<Fr>,
    roots: Vec<Fr>,
    current_root: usize,
    nullifiers: HashSet<B256>,
    commitments: HashSet<B256>,
    events: Vec<LeafInsertion>,
}

/// Incremental Merkle tree with a root-history ring, a spent-nullifier set
/// and Groth16 verification of decoded calldata. Every write is one
/// transaction at a new height and either applies fully or reverts.
pub struct MemoryLedger {
    depth: usize,
    zeros: Vec<Fr>,
    verifying_keys: HashMap<CircuitId, VerifyingKey<Bn254>>,
    state: RwLock<State>,
}

impl MemoryLedger {
    pub fn new(config: &ClientConfig) -> Self {
        let depth = config.tree_depth;
        let zeros = zero_hashes(depth);
        let mut roots = vec![Fr::from(0u64); config.root_history_size.max(1)];
        roots[0] = zeros[depth];

        Self {
            depth,
            verifying_keys: HashMap::new(),
            state: RwLock::new(State {
                height: 0,
                next_index: 0,
                filled_subtrees: zeros[..depth].to_vec(),
                roots,
                current_root: 0,
                nullifiers: HashSet::new(),
                commitments: HashSet::new(),
                events: Vec::new(),
            }),
            zeros,
        }
    }

    /// Install the published verifying keys. Without a key for a circuit,
    /// every submission for it reverts.
    pub fn with_verifying_keys(mut self, keys: &CircuitKeys) -> Self {
        for id in CircuitId::ALL {
            self.verifying_keys
                .insert(id, keys.get(id).verifying_key.clone());
        }
        self
    }

    pub async fn current_root(&self) -> B256 {
        let state = self.state.read().await;
        field_to_b256(&state.roots[state.current_root])
    }

    pub async fn leaf_count(&self) -> u64 {
        self.state.read().await.next_index
    }

    fn insert(&self, state: &mut State, leaf: Fr) -> Result<(u64, Fr), Revert> {
        let index = state.next_index;
        if index >= 1u64 << self.depth {
            return Err(Revert::TreeFull);
        }

        let mut current_index = index;
        let mut current = leaf;
        for level in 0..self.depth {
            let (left, right) = if current_index % 2 == 0 {
                state.filled_subtrees[level] = current;
                (current, self.zeros[level])
            } else {
                (state.filled_subtrees[level], current)
            };
            current = poseidon_hash_two(left, right);
            current_index /= 2;
        }

        state.current_root = (state.current_root + 1) % state.roots.len();
        state.roots[state.current_root] = current;
        state.next_index += 1;
        Ok((index, current))
    }

    fn known_root(state: &State, root: &B256) -> bool {
        match b256_to_field(root) {
            Some(root) if root != Fr::from(0u64) => state.roots.contains(&root),
            _ => false,
        }
    }

    fn check_proof(&self, submission: &Submission) -> Result<(), Revert> {
        let vk = self
            .verifying_keys
            .get(&submission.circuit())
            .ok_or(Revert::InvalidProof)?;
        let proof = submission.proof().to_proof()?;
        let inputs = submission.public_inputs()?;
        match verify_proof(vk, &proof, &inputs) {
            Ok(true) => Ok(()),
            _ => Err(Revert::InvalidProof),
        }
    }
}

impl Ledger for MemoryLedger {
    async fn tip_height(&self) -> Result<u64, LedgerError> {
        Ok(self.state.read().await.height)
    }

    async fn leaf_insertions(&self, from: u64, to: u64) -> Result<Vec<LeafInsertion>, LedgerError> {
        let state = self.state.read().await;
        Ok(state
            .events
            .iter()
            .filter(|e| e.height >= from && e.height <= to)
            .cloned()
            .collect())
    }

    async fn is_known_root(&self, root: B256) -> Result<bool, LedgerError> {
        let state = self.state.read().await;
        Ok(Self::known_root(&state, &root))
    }

    async fn is_nullifier_spent(&self, nullifier: B256) -> Result<bool, LedgerError> {
        Ok(self.state.read().await.nullifiers.contains(&nullifier))
    }

    async fn execute(&self, payload: &HookPayload) -> Result<LeafInsertion, LedgerError> {
        // The hook decodes what it is sent, not what the caller meant.
        let data = payload
            .encode()
            .map_err(|e| LedgerError::Reverted(Revert::AbiMismatch(e.to_string())))?;
        let decoded = HookPayload::decode(payload.kind(), &data)
            .map_err(|e| LedgerError::Reverted(Revert::AbiMismatch(e.to_string())))?;
        let leaf = b256_to_field(&decoded.commitment())
            .ok_or_else(|| LedgerError::Reverted(Revert::AbiMismatch("commitment outside field".into())))?;

        let mut state = self.state.write().await;
        let (leaf_index, root) = self.insert(&mut state, leaf).map_err(LedgerError::Reverted)?;
        state.height += 1;

        let event = LeafInsertion {
            commitment: decoded.commitment(),
            leaf_index,
            new_root: field_to_b256(&root),
            height: state.height,
        };
        state.commitments.insert(event.commitment);
        state.events.push(event.clone());
        debug!(kind = %payload.kind(), leaf_index, height = state.height, "leaf inserted");
        Ok(event)
    }

    async fn submit(&self, submission: &Submission) -> Result<SubmitReceipt, LedgerError> {
        let data = submission
            .encode()
            .map_err(|e| LedgerError::Reverted(Revert::AbiMismatch(e.to_string())))?;
        let call = Submission::decode(&data).map_err(LedgerError::Reverted)?;
        call.check_bindings().map_err(LedgerError::Reverted)?;

        let mut state = self.state.write().await;
        if let Submission::Withdraw { commitment, .. } = &call {
            if !state.commitments.contains(commitment) {
                return Err(LedgerError::Reverted(Revert::AbiMismatch(
                    "commitment was never inserted".into(),
                )));
            }
        }
        if !Self::known_root(&state, &call.root()) {
            return Err(LedgerError::Reverted(Revert::UnknownRoot));
        }
        let nullifier = call.nullifier();
        if state.nullifiers.contains(&nullifier) {
            return Err(LedgerError::Reverted(Revert::NullifierAlreadyUsed));
        }
        self.check_proof(&call).map_err(LedgerError::Reverted)?;

        state.nullifiers.insert(nullifier);
        state.height += 1;
        info!(circuit = %call.circuit(), height = state.height, "spend accepted");
        Ok(SubmitReceipt {
            height: state.height,
            nullifier,
        })
    }
}
