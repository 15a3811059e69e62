//! One orchestrator for every operation kind.
//!
//! Origination derives the commitment and runs the hook call. Withdrawal
//! replays the insertion log, proves, verifies locally, checks root
//! freshness and submits; a stale root gets exactly one fresh rebuild and
//! reprove before it is surfaced.

use std::future::Future;
use std::sync::Arc;

use alloy_primitives::B256;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::calldata::{format_submission, Submission};
use crate::config::ClientConfig;
use crate::deriver::{derive, Derived};
use crate::error::{PrivacyError, Revert};
use crate::field::field_to_b256;
use crate::freshness::ensure_fresh;
use crate::hook::{HookContext, HookPayload};
use crate::ledger::{Ledger, LeafInsertion};
use crate::operation::{OperationKind, OperationParams, SecretMaterial};
use crate::pipeline::{CancelToken, ProofPipeline, Prover};
use crate::tree_builder::{rebuild, Inclusion, RebuiltTree};
use crate::witness::WitnessAssembler;

/// Automatic rebuild-and-reprove cycles after a stale root.
const STALE_ROOT_RETRIES: u32 = 1;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OriginReceipt {
    pub kind: OperationKind,
    pub commitment: B256,
    /// Keep this: it lets the later withdrawal check its slot directly.
    pub leaf_index: u64,
    pub root: B256,
    pub height: u64,
}

#[derive(Clone, Debug)]
pub struct WithdrawRequest {
    pub kind: OperationKind,
    pub secret: SecretMaterial,
    pub params: OperationParams,
    /// Leaf index from the originating receipt, if the caller kept it.
    pub leaf_index: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WithdrawReceipt {
    pub kind: OperationKind,
    pub nullifier: B256,
    pub root: B256,
    pub leaf_index: u64,
    /// Proofs generated, including a stale-root retry.
    pub attempts: u32,
    pub height: u64,
}

struct CachedTree {
    through_height: u64,
    events: Vec<LeafInsertion>,
    tree: Arc<RebuiltTree>,
}

pub struct Orchestrator<L, P> {
    ledger: Arc<L>,
    prover: Arc<P>,
    config: ClientConfig,
    cache: Option<CachedTree>,
}

impl<L: Ledger, P: Prover> Orchestrator<L, P> {
    pub fn new(ledger: Arc<L>, prover: Arc<P>, config: ClientConfig) -> Self {
        Self {
            ledger,
            prover,
            config,
            cache: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    pub fn invalidate_cache(&mut self) {
        self.cache = None;
    }

    /// Derive the commitment for an originating kind and execute the hook
    /// call carrying it.
    pub async fn originate(
        &mut self,
        kind: OperationKind,
        secret: &SecretMaterial,
        params: &OperationParams,
        context: HookContext,
    ) -> Result<OriginReceipt, PrivacyError> {
        if !kind.descriptor().originates {
            return Err(PrivacyError::input(format!("{} does not insert a commitment", kind)));
        }
        let Derived { commitment, .. } = derive(kind, secret, params)?;
        let payload = HookPayload::build(kind, commitment, context)?;

        let event = self.ledger.execute(&payload).await?;
        info!(%kind, leaf_index = event.leaf_index, height = event.height, "commitment inserted");
        Ok(OriginReceipt {
            kind,
            commitment: event.commitment,
            leaf_index: event.leaf_index,
            root: event.new_root,
            height: event.height,
        })
    }

    /// Spend the commitment described by `request`.
    pub async fn withdraw(
        &mut self,
        request: &WithdrawRequest,
        cancel: &CancelToken,
    ) -> Result<WithdrawReceipt, PrivacyError> {
        let kind = request.kind;
        kind.descriptor().require_circuit()?;
        let derived = derive(kind, &request.secret, &request.params)?;
        let nullifier = field_to_b256(&derived.nullifier);

        let ledger = self.ledger.clone();
        let spent = retry_transient(&self.config, "nullifier lookup", || {
            let ledger = &*ledger;
            async move { Ok(ledger.is_nullifier_spent(nullifier).await?) }
        })
        .await?;
        if spent {
            return Err(PrivacyError::OnChainRevert(Revert::NullifierAlreadyUsed));
        }

        let mut pipeline = ProofPipeline::new(self.prover.clone());
        let mut attempts = 0;
        let (submission, inclusion) = loop {
            attempts += 1;
            match self.prepare(request, &derived, &mut pipeline, cancel).await {
                Ok(prepared) => break prepared,
                Err(PrivacyError::StaleRoot { root }) if attempts <= STALE_ROOT_RETRIES => {
                    warn!(%kind, %root, attempts, "stale root; rebuilding from a fresh log replay");
                    self.invalidate_cache();
                    pipeline.reset();
                }
                Err(e) => return Err(e),
            }
        };

        pipeline.mark_submitted()?;
        match self.ledger.submit(&submission).await {
            Ok(receipt) => {
                pipeline.confirm()?;
                info!(%kind, height = receipt.height, attempts, "withdrawal confirmed");
                Ok(WithdrawReceipt {
                    kind,
                    nullifier: receipt.nullifier,
                    root: field_to_b256(&inclusion.root),
                    leaf_index: inclusion.leaf_index,
                    attempts,
                    height: receipt.height,
                })
            }
            Err(e) => {
                pipeline.reject()?;
                Err(e.into())
            }
        }
    }

    /// One rebuild → prove → verify → freshness pass.
    async fn prepare(
        &mut self,
        request: &WithdrawRequest,
        derived: &Derived,
        pipeline: &mut ProofPipeline<P>,
        cancel: &CancelToken,
    ) -> Result<(Submission, Inclusion), PrivacyError> {
        let tree = self.load_tree().await?;
        let inclusion = tree.inclusion(&derived.commitment, request.leaf_index)?;
        debug!(leaf_index = inclusion.leaf_index, "commitment located");

        let witness = WitnessAssembler::new(self.config.tree_depth).assemble(
            request.kind,
            &request.secret,
            &request.params,
            &inclusion,
        )?;
        pipeline.load_witness(witness)?;
        pipeline.prove(cancel).await?;
        let proof = pipeline.verify()?;

        let ledger = self.ledger.clone();
        let root = inclusion.root;
        retry_transient(&self.config, "root check", || {
            let ledger = &*ledger;
            async move { ensure_fresh(ledger, &root).await }
        })
        .await?;

        let submission = format_submission(request.kind, &request.params, derived.commitment, &proof)?;
        Ok((submission, inclusion))
    }

    /// The tree as of the ledger tip. A cached tree is reused only while no
    /// insertion has been observed past its height.
    async fn load_tree(&mut self) -> Result<Arc<RebuiltTree>, PrivacyError> {
        let ledger = self.ledger.clone();
        let tip = retry_transient(&self.config, "tip height", || {
            let ledger = &*ledger;
            async move { Ok(ledger.tip_height().await?) }
        })
        .await?;

        let (from, mut events) = match &self.cache {
            Some(cache) if cache.through_height >= tip => return Ok(cache.tree.clone()),
            Some(cache) => (cache.through_height + 1, cache.events.clone()),
            None => (self.config.start_height, Vec::new()),
        };

        let fresh = retry_transient(&self.config, "leaf insertions", || {
            let ledger = &*ledger;
            async move { Ok(ledger.leaf_insertions(from, tip).await?) }
        })
        .await?;

        if let Some(cache) = self.cache.as_mut() {
            if fresh.is_empty() {
                cache.through_height = tip;
                return Ok(cache.tree.clone());
            }
            debug!(new = fresh.len(), "new insertions observed; cached tree invalidated");
        }

        events.extend(fresh);
        let tree = Arc::new(rebuild(self.config.tree_depth, &events)?);
        self.cache = Some(CachedTree {
            through_height: tip,
            events,
            tree: tree.clone(),
        });
        Ok(tree)
    }
}

/// Run a ledger read, repeating it on transient transport errors with a
/// linearly growing backoff.
async fn retry_transient<T, F, Fut>(
    config: &ClientConfig,
    what: &'static str,
    mut op: F,
) -> Result<T, PrivacyError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, PrivacyError>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Err(PrivacyError::Ledger(e)) if e.is_transient() && attempt < config.fetch_retries => {
                attempt += 1;
                warn!(what, attempt, error = %e, "transient ledger error; retrying");
                tokio::time::sleep(config.retry_backoff() * attempt).await;
            }
            other => return other,
        }
    }
}
