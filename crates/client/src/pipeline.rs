//! Proof pipeline: witness → background proof → local verification.
//!
//! ```text
//! Idle → WitnessReady → Proving → ProofReady → OffChainVerified → Submitted → Confirmed
//!                          │           │                              └────→ Rejected
//!                          └───────────┴──────────────────────────────────→ Rejected
//! ```
//!
//! Any state may be reset to `Idle`; cancelling a proof does so
//! implicitly. Nothing in the pipeline touches the ledger, so abandoning
//! it at any point before `Submitted` leaves no protocol state behind.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use unizwap_prover::{
    prove_remove_liquidity, prove_swap_withdraw, verify_proof, CircuitKeys, ProofWithInputs,
};

use crate::error::PrivacyError;
use crate::operation::CircuitId;
use crate::witness::{CircuitInstance, Witness};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum PipelineState {
    Idle,
    WitnessReady,
    Proving,
    ProofReady,
    OffChainVerified,
    Submitted,
    Confirmed,
    Rejected,
}

impl PipelineState {
    pub fn can_transition(self, to: PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, to),
            (_, Idle)
                | (Idle, WitnessReady)
                | (WitnessReady, Proving)
                | (Proving, ProofReady)
                | (Proving, Rejected)
                | (ProofReady, OffChainVerified)
                | (ProofReady, Rejected)
                | (OffChainVerified, Submitted)
                | (Submitted, Confirmed)
                | (Submitted, Rejected)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Confirmed | PipelineState::Rejected)
    }
}

/// Proof generation and verification behind a port, so the pipeline can
/// run against precomputed keys or an external prover.
pub trait Prover: Send + Sync + 'static {
    /// Blocking; called from the blocking thread pool.
    fn prove(&self, witness: &Witness) -> Result<ProofWithInputs, PrivacyError>;

    fn verify(&self, circuit: CircuitId, proof: &ProofWithInputs) -> Result<bool, PrivacyError>;
}

/// Groth16 over BN254 with keys from the trusted setup.
#[derive(Clone)]
pub struct Groth16Prover {
    keys: Arc<CircuitKeys>,
}

impl Groth16Prover {
    pub fn new(keys: Arc<CircuitKeys>) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &CircuitKeys {
        &self.keys
    }
}

impl Prover for Groth16Prover {
    fn prove(&self, witness: &Witness) -> Result<ProofWithInputs, PrivacyError> {
        let pk = &self.keys.get(witness.circuit).proving_key;
        let proof = match witness.to_circuit()? {
            CircuitInstance::SwapWithdraw(circuit) => prove_swap_withdraw(pk, circuit)?,
            CircuitInstance::RemoveLiquidity(circuit) => prove_remove_liquidity(pk, circuit)?,
        };
        Ok(proof)
    }

    fn verify(&self, circuit: CircuitId, proof: &ProofWithInputs) -> Result<bool, PrivacyError> {
        let vk = &self.keys.get(circuit).verifying_key;
        Ok(verify_proof(vk, &proof.proof, &proof.public_inputs)?)
    }
}

/// Cooperative cancellation shared between a caller and its proving task.
#[derive(Clone, Debug)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

/// A proof being generated on the blocking pool.
pub struct ProvingTask {
    handle: JoinHandle<Result<ProofWithInputs, PrivacyError>>,
    cancel: CancelToken,
}

impl ProvingTask {
    pub fn spawn<P: Prover>(prover: Arc<P>, witness: Witness, cancel: CancelToken) -> Self {
        let handle = tokio::task::spawn_blocking(move || prover.prove(&witness));
        Self { handle, cancel }
    }

    /// Wait for the proof. On cancellation the handle is dropped and the
    /// result discarded; a proof already running on the blocking pool cannot
    /// be interrupted and keeps its thread until it completes.
    pub async fn join(self) -> Result<ProofWithInputs, PrivacyError> {
        let ProvingTask { mut handle, cancel } = self;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PrivacyError::Cancelled),
            joined = &mut handle => match joined {
                Ok(result) => result,
                Err(e) => Err(PrivacyError::ProofGeneration(format!("proving task failed: {}", e))),
            },
        }
    }
}

/// One spend's way through proving and verification.
pub struct ProofPipeline<P> {
    prover: Arc<P>,
    state: PipelineState,
    witness: Option<Witness>,
    proof: Option<ProofWithInputs>,
}

impl<P: Prover> ProofPipeline<P> {
    pub fn new(prover: Arc<P>) -> Self {
        Self {
            prover,
            state: PipelineState::Idle,
            witness: None,
            proof: None,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn witness(&self) -> Option<&Witness> {
        self.witness.as_ref()
    }

    pub fn proof(&self) -> Option<&ProofWithInputs> {
        self.proof.as_ref()
    }

    /// Validate the layout before anything is handed to the prover.
    pub fn load_witness(&mut self, witness: Witness) -> Result<(), PrivacyError> {
        self.check(PipelineState::WitnessReady)?;
        witness.validate()?;
        self.witness = Some(witness);
        self.transition(PipelineState::WitnessReady)
    }

    pub async fn prove(&mut self, cancel: &CancelToken) -> Result<ProofWithInputs, PrivacyError> {
        self.check(PipelineState::Proving)?;
        let witness = self
            .witness
            .clone()
            .ok_or_else(|| PrivacyError::ProofGeneration("no witness loaded".into()))?;
        if cancel.is_cancelled() {
            self.reset();
            return Err(PrivacyError::Cancelled);
        }

        self.transition(PipelineState::Proving)?;
        debug!(kind = %witness.kind, circuit = %witness.circuit, "proving");
        let task = ProvingTask::spawn(self.prover.clone(), witness, cancel.clone());

        match task.join().await {
            Ok(proof) => {
                self.proof = Some(proof.clone());
                self.transition(PipelineState::ProofReady)?;
                Ok(proof)
            }
            Err(PrivacyError::Cancelled) => {
                info!("proving cancelled");
                self.reset();
                Err(PrivacyError::Cancelled)
            }
            Err(e) => {
                self.transition(PipelineState::Rejected)?;
                Err(e)
            }
        }
    }

    /// The free gate before any ledger cost: a proof that does not verify
    /// locally, or whose signals differ from the witness, is never sent.
    pub fn verify(&mut self) -> Result<ProofWithInputs, PrivacyError> {
        self.check(PipelineState::OffChainVerified)?;
        let (witness, proof) = match (&self.witness, &self.proof) {
            (Some(w), Some(p)) => (w, p.clone()),
            _ => return Err(PrivacyError::ProofGeneration("no proof to verify".into())),
        };

        let signals_match = witness.public_signals()? == proof.public_inputs;
        let verified = signals_match && self.prover.verify(witness.circuit, &proof)?;
        if !verified {
            warn!(kind = %witness.kind, "proof failed local verification");
            self.transition(PipelineState::Rejected)?;
            return Err(PrivacyError::OffChainVerification);
        }
        self.transition(PipelineState::OffChainVerified)?;
        Ok(proof)
    }

    pub fn mark_submitted(&mut self) -> Result<(), PrivacyError> {
        self.transition(PipelineState::Submitted)
    }

    pub fn confirm(&mut self) -> Result<(), PrivacyError> {
        self.transition(PipelineState::Confirmed)
    }

    pub fn reject(&mut self) -> Result<(), PrivacyError> {
        self.transition(PipelineState::Rejected)
    }

    /// Back to `Idle`, dropping witness and proof.
    pub fn reset(&mut self) {
        self.state = PipelineState::Idle;
        self.witness = None;
        self.proof = None;
    }

    fn check(&self, to: PipelineState) -> Result<(), PrivacyError> {
        if self.state.can_transition(to) {
            Ok(())
        } else {
            Err(PrivacyError::InvalidTransition {
                from: self.state,
                to,
            })
        }
    }

    fn transition(&mut self, to: PipelineState) -> Result<(), PrivacyError> {
        self.check(to)?;
        self.state = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{OperationKind, OperationParams, SecretMaterial};
    use crate::tree_builder::rebuild;
    use crate::witness::WitnessAssembler;
    use crate::{derive, field::field_to_b256, LeafInsertion};
    use alloy_primitives::{Address, B256, U256};
    use ark_bn254::Fr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const DEPTH: usize = 4;

    /// Returns the witness signals with a fixed proof; `valid` decides what
    /// verification reports.
    struct StubProver {
        valid: bool,
        delay: Duration,
        calls: AtomicUsize,
        finished: AtomicUsize,
    }

    impl StubProver {
        fn new(valid: bool, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                valid,
                delay,
                calls: AtomicUsize::new(0),
                finished: AtomicUsize::new(0),
            })
        }
    }

    impl Prover for StubProver {
        fn prove(&self, witness: &Witness) -> Result<ProofWithInputs, PrivacyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(ProofWithInputs {
                proof: Default::default(),
                public_inputs: witness.public_signals()?,
            })
        }

        fn verify(&self, _: CircuitId, _: &ProofWithInputs) -> Result<bool, PrivacyError> {
            Ok(self.valid)
        }
    }

    fn witness() -> Witness {
        let material = SecretMaterial::new(Fr::from(5u64), Fr::from(6u64));
        let params = OperationParams::Token {
            token: Address::repeat_byte(7),
            amount: U256::from(8u64),
        };
        let commitment = derive(OperationKind::Vault, &material, &params).unwrap().commitment;
        let events = [LeafInsertion {
            commitment: field_to_b256(&commitment),
            leaf_index: 0,
            new_root: B256::ZERO,
            height: 1,
        }];
        let inclusion = rebuild(DEPTH, &events).unwrap().inclusion(&commitment, None).unwrap();
        WitnessAssembler::new(DEPTH)
            .assemble(OperationKind::Vault, &material, &params, &inclusion)
            .unwrap()
    }

    #[test]
    fn test_transition_table() {
        use PipelineState::*;
        assert!(Idle.can_transition(WitnessReady));
        assert!(OffChainVerified.can_transition(Submitted));
        assert!(!ProofReady.can_transition(Submitted));
        assert!(!Idle.can_transition(Proving));
        assert!(!Confirmed.can_transition(Rejected));
        assert!(Confirmed.can_transition(Idle));
        assert!(Rejected.is_terminal());
    }

    #[tokio::test]
    async fn test_happy_path_reaches_confirmed() {
        let mut pipeline = ProofPipeline::new(StubProver::new(true, Duration::ZERO));
        pipeline.load_witness(witness()).unwrap();
        pipeline.prove(&CancelToken::new()).await.unwrap();
        assert_eq!(pipeline.state(), PipelineState::ProofReady);
        pipeline.verify().unwrap();
        pipeline.mark_submitted().unwrap();
        pipeline.confirm().unwrap();
        assert_eq!(pipeline.state(), PipelineState::Confirmed);
    }

    #[tokio::test]
    async fn test_cannot_submit_unverified_proof() {
        let mut pipeline = ProofPipeline::new(StubProver::new(true, Duration::ZERO));
        pipeline.load_witness(witness()).unwrap();
        pipeline.prove(&CancelToken::new()).await.unwrap();
        let err = pipeline.mark_submitted().unwrap_err();
        assert!(matches!(
            err,
            PrivacyError::InvalidTransition {
                from: PipelineState::ProofReady,
                to: PipelineState::Submitted
            }
        ));
    }

    #[tokio::test]
    async fn test_failed_verification_halts() {
        let mut pipeline = ProofPipeline::new(StubProver::new(false, Duration::ZERO));
        pipeline.load_witness(witness()).unwrap();
        pipeline.prove(&CancelToken::new()).await.unwrap();
        assert!(matches!(pipeline.verify(), Err(PrivacyError::OffChainVerification)));
        assert_eq!(pipeline.state(), PipelineState::Rejected);
        assert!(pipeline.mark_submitted().is_err());
    }

    #[tokio::test]
    async fn test_cancelled_task_runs_to_completion_unobserved() {
        let prover = StubProver::new(true, Duration::from_millis(200));
        let cancel = CancelToken::new();
        let task = ProvingTask::spawn(prover.clone(), witness(), cancel.clone());
        cancel.cancel();

        assert!(matches!(task.join().await, Err(PrivacyError::Cancelled)));
        assert_eq!(prover.finished.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(prover.finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_returns_to_idle() {
        let prover = StubProver::new(true, Duration::from_millis(500));
        let mut pipeline = ProofPipeline::new(prover.clone());
        pipeline.load_witness(witness()).unwrap();

        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = pipeline.prove(&cancel).await.unwrap_err();
        assert!(matches!(err, PrivacyError::Cancelled));
        assert_eq!(pipeline.state(), PipelineState::Idle);
        assert!(pipeline.witness().is_none());
    }

    #[tokio::test]
    async fn test_cancelled_before_start_never_proves() {
        let prover = StubProver::new(true, Duration::ZERO);
        let mut pipeline = ProofPipeline::new(prover.clone());
        pipeline.load_witness(witness()).unwrap();

        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(matches!(pipeline.prove(&cancel).await, Err(PrivacyError::Cancelled)));
        assert_eq!(prover.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_witness_never_reaches_prover() {
        let prover = StubProver::new(true, Duration::ZERO);
        let mut pipeline = ProofPipeline::new(prover.clone());
        let mut bad = witness();
        bad.fields.remove("nullifier");
        assert!(matches!(pipeline.load_witness(bad), Err(PrivacyError::ProofGeneration(_))));
        assert_eq!(pipeline.state(), PipelineState::Idle);
    }
}
