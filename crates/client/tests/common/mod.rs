#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use alloy_primitives::{Address, B256, U256};
use ark_bn254::Fr;

use unizwap_client::field::field_to_b256;
use unizwap_client::{
    ClientConfig, Groth16Prover, HookContext, HookPayload, Ledger, LeafInsertion, LedgerError,
    MemoryLedger, OperationParams, Orchestrator, SecretMaterial, Submission, SubmitReceipt,
};
use unizwap_prover::{setup_all_circuits, CircuitKeys};

pub fn keys() -> Arc<CircuitKeys> {
    static KEYS: OnceLock<Arc<CircuitKeys>> = OnceLock::new();
    KEYS.get_or_init(|| Arc::new(setup_all_circuits().expect("setup")))
        .clone()
}

pub fn config(history: usize) -> ClientConfig {
    ClientConfig {
        root_history_size: history,
        retry_backoff_ms: 1,
        ..ClientConfig::default()
    }
}

pub fn memory_ledger(config: &ClientConfig) -> MemoryLedger {
    MemoryLedger::new(config).with_verifying_keys(&keys())
}

pub fn orchestrator<L: Ledger>(ledger: Arc<L>, config: ClientConfig) -> Orchestrator<L, Groth16Prover> {
    Orchestrator::new(ledger, Arc::new(Groth16Prover::new(keys())), config)
}

pub fn material(secret: u64, nonce: u64) -> SecretMaterial {
    SecretMaterial::new(Fr::from(secret), Fr::from(nonce))
}

pub fn token_b() -> Address {
    "0xF335a9B58f2AA6A2f884d2dA4E308F7378A4CF7e".parse().unwrap()
}

pub fn token_params(amount: u64) -> OperationParams {
    OperationParams::Token {
        token: token_b(),
        amount: U256::from(amount),
    }
}

pub fn swap_context() -> HookContext {
    HookContext::Swap {
        user: Address::repeat_byte(0xaa),
        min_output: U256::from(1u64),
        referral: String::new(),
    }
}

/// Insert a leaf nobody in the test owns.
pub async fn foreign_leaf<L: Ledger>(ledger: &L, value: u64) {
    let payload = HookPayload::LiquidityAdd {
        commitment: field_to_b256(&Fr::from(value)),
    };
    ledger.execute(&payload).await.unwrap();
}

/// Lets another party insert leaves right after each log fetch, for the
/// first `races` fetches, so the root the client builds rotates out before
/// it can submit.
pub struct RacingLedger {
    pub inner: MemoryLedger,
    pub races: AtomicUsize,
    pub leaves_per_race: u64,
    pub fetches: AtomicUsize,
    next_foreign: AtomicUsize,
}

impl RacingLedger {
    pub fn new(inner: MemoryLedger, races: usize, leaves_per_race: u64) -> Self {
        Self {
            inner,
            races: AtomicUsize::new(races),
            leaves_per_race,
            fetches: AtomicUsize::new(0),
            next_foreign: AtomicUsize::new(1_000_000),
        }
    }
}

impl Ledger for RacingLedger {
    async fn tip_height(&self) -> Result<u64, LedgerError> {
        self.inner.tip_height().await
    }

    async fn leaf_insertions(&self, from: u64, to: u64) -> Result<Vec<LeafInsertion>, LedgerError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let events = self.inner.leaf_insertions(from, to).await?;
        let race = self
            .races
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if race {
            for _ in 0..self.leaves_per_race {
                let value = self.next_foreign.fetch_add(1, Ordering::SeqCst) as u64;
                foreign_leaf(&self.inner, value).await;
            }
        }
        Ok(events)
    }

    async fn is_known_root(&self, root: B256) -> Result<bool, LedgerError> {
        self.inner.is_known_root(root).await
    }

    async fn is_nullifier_spent(&self, nullifier: B256) -> Result<bool, LedgerError> {
        self.inner.is_nullifier_spent(nullifier).await
    }

    async fn execute(&self, payload: &HookPayload) -> Result<LeafInsertion, LedgerError> {
        self.inner.execute(payload).await
    }

    async fn submit(&self, submission: &Submission) -> Result<SubmitReceipt, LedgerError> {
        self.inner.submit(submission).await
    }
}

/// Fails the first `failures` tip queries with a transport error.
pub struct FlakyLedger {
    pub inner: MemoryLedger,
    pub failures: AtomicUsize,
}

impl Ledger for FlakyLedger {
    async fn tip_height(&self) -> Result<u64, LedgerError> {
        let failed = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(LedgerError::Transport("connection reset".into()));
        }
        self.inner.tip_height().await
    }

    async fn leaf_insertions(&self, from: u64, to: u64) -> Result<Vec<LeafInsertion>, LedgerError> {
        self.inner.leaf_insertions(from, to).await
    }

    async fn is_known_root(&self, root: B256) -> Result<bool, LedgerError> {
        self.inner.is_known_root(root).await
    }

    async fn is_nullifier_spent(&self, nullifier: B256) -> Result<bool, LedgerError> {
        self.inner.is_nullifier_spent(nullifier).await
    }

    async fn execute(&self, payload: &HookPayload) -> Result<LeafInsertion, LedgerError> {
        self.inner.execute(payload).await
    }

    async fn submit(&self, submission: &Submission) -> Result<SubmitReceipt, LedgerError> {
        self.inner.submit(submission).await
    }
}

/// Records every `leaf_insertions` range the client asks for.
pub struct CountingLedger {
    pub inner: MemoryLedger,
    pub ranges: Mutex<Vec<(u64, u64)>>,
}

impl CountingLedger {
    pub fn new(inner: MemoryLedger) -> Self {
        Self {
            inner,
            ranges: Mutex::new(Vec::new()),
        }
    }

    pub fn ranges(&self) -> Vec<(u64, u64)> {
        self.ranges.lock().unwrap().clone()
    }
}

impl Ledger for CountingLedger {
    async fn tip_height(&self) -> Result<u64, LedgerError> {
        self.inner.tip_height().await
    }

    async fn leaf_insertions(&self, from: u64, to: u64) -> Result<Vec<LeafInsertion>, LedgerError> {
        self.ranges.lock().unwrap().push((from, to));
        self.inner.leaf_insertions(from, to).await
    }

    async fn is_known_root(&self, root: B256) -> Result<bool, LedgerError> {
        self.inner.is_known_root(root).await
    }

    async fn is_nullifier_spent(&self, nullifier: B256) -> Result<bool, LedgerError> {
        self.inner.is_nullifier_spent(nullifier).await
    }

    async fn execute(&self, payload: &HookPayload) -> Result<LeafInsertion, LedgerError> {
        self.inner.execute(payload).await
    }

    async fn submit(&self, submission: &Submission) -> Result<SubmitReceipt, LedgerError> {
        self.inner.submit(submission).await
    }
}
