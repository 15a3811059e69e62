//! HTTP request handlers.

use std::sync::Arc;

use alloy_primitives::{Bytes, B256};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use unizwap_circuits::field::fr_to_decimal;
use unizwap_client::field::{field_to_b256, parse_field};
use unizwap_client::{
    derive, format_submission, rebuild, LeafInsertion, OperationKind, OperationParams, Prover,
    SecretMaterial, SolidityProof, WitnessAssembler,
};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// A field element in both renderings callers need: decimal for snarkjs,
/// `bytes32` hex for contract calls.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldValue {
    pub decimal: String,
    pub hex: B256,
}

impl FieldValue {
    fn new(value: &ark_bn254::Fr) -> Self {
        Self {
            decimal: fr_to_decimal(value),
            hex: field_to_b256(value),
        }
    }
}

// ============ Utilities ============

#[derive(Deserialize)]
pub struct CreateCommitmentRequest {
    pub kind: OperationKind,
    pub secret: String,
    pub nonce: String,
    pub params: OperationParams,
}

#[derive(Serialize, Deserialize)]
pub struct CreateCommitmentResponse {
    pub commitment: FieldValue,
    pub nullifier: FieldValue,
}

pub async fn create_commitment(
    Json(req): Json<CreateCommitmentRequest>,
) -> ApiResult<CreateCommitmentResponse> {
    let material = SecretMaterial::parse(&req.secret, &req.nonce)?;
    let derived = derive(req.kind, &material, &req.params)?;

    Ok(Json(CreateCommitmentResponse {
        commitment: FieldValue::new(&derived.commitment),
        nullifier: FieldValue::new(&derived.nullifier),
    }))
}

#[derive(Serialize, Deserialize)]
pub struct GenerateSecretResponse {
    pub secret: String,
    pub nonce: String,
}

pub async fn generate_secret() -> Json<GenerateSecretResponse> {
    let material = SecretMaterial::random(&mut ark_std::rand::thread_rng());

    Json(GenerateSecretResponse {
        secret: fr_to_decimal(&material.secret),
        nonce: fr_to_decimal(&material.nonce),
    })
}

// ============ Withdraw ============

/// One `LeafInserted` event as the caller observed it.
#[derive(Deserialize)]
pub struct LeafEntry {
    pub commitment: String,
    pub leaf_index: u64,
    #[serde(default)]
    pub root: Option<String>,
}

#[derive(Deserialize)]
pub struct ProveWithdrawRequest {
    pub kind: OperationKind,
    pub secret: String,
    pub nonce: String,
    pub params: OperationParams,
    pub leaves: Vec<LeafEntry>,
    #[serde(default)]
    pub leaf_index: Option<u64>,
}

#[derive(Serialize, Deserialize)]
pub struct ProveWithdrawResponse {
    pub root: FieldValue,
    pub nullifier: FieldValue,
    pub leaf_index: u64,
    pub public_signals: Vec<String>,
    pub proof: SolidityProof,
    pub calldata: Bytes,
}

fn parse_leaves(entries: &[LeafEntry]) -> Result<Vec<LeafInsertion>, ApiError> {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| -> Result<LeafInsertion, ApiError> {
            let commitment = parse_field(&format!("leaves[{}].commitment", i), &entry.commitment)?;
            let new_root = match &entry.root {
                Some(root) => field_to_b256(&parse_field(&format!("leaves[{}].root", i), root)?),
                None => B256::ZERO,
            };
            Ok(LeafInsertion {
                commitment: field_to_b256(&commitment),
                leaf_index: entry.leaf_index,
                new_root,
                height: 0,
            })
        })
        .collect()
}

/// Rebuild the tree from the supplied leaves, prove, verify locally and
/// lay out the calldata. Nothing is sent anywhere.
pub async fn prove_withdraw(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProveWithdrawRequest>,
) -> ApiResult<ProveWithdrawResponse> {
    let material = SecretMaterial::parse(&req.secret, &req.nonce)?;
    let events = parse_leaves(&req.leaves)?;
    let circuit = req.kind.descriptor().require_circuit()?;

    let state = state.clone();
    let response = tokio::task::spawn_blocking(move || -> Result<ProveWithdrawResponse, ApiError> {
        let derived = derive(req.kind, &material, &req.params)?;
        let tree = rebuild(state.tree_depth, &events)?;
        let inclusion = tree.inclusion(&derived.commitment, req.leaf_index)?;
        let witness = WitnessAssembler::new(state.tree_depth).assemble(
            req.kind,
            &material,
            &req.params,
            &inclusion,
        )?;

        let proof = state.prover.prove(&witness)?;
        if !state.prover.verify(circuit, &proof)? {
            return Err(unizwap_client::PrivacyError::OffChainVerification.into());
        }
        let submission = format_submission(req.kind, &req.params, derived.commitment, &proof)?;
        info!(kind = %req.kind, leaf_index = inclusion.leaf_index, "withdrawal proof generated");

        Ok(ProveWithdrawResponse {
            root: FieldValue::new(&inclusion.root),
            nullifier: FieldValue::new(&derived.nullifier),
            leaf_index: inclusion.leaf_index,
            public_signals: proof.public_inputs.iter().map(fr_to_decimal).collect(),
            proof: submission.proof().clone(),
            calldata: Bytes::from(submission.encode()?),
        })
    })
    .await
    .map_err(|e| ApiError::Internal(format!("proving task failed: {}", e)))??;

    Ok(Json(response))
}
