//! Privacy layer for the private swap and liquidity hooks.
//!
//! Every spend follows the same path regardless of operation kind:
//! replay the ledger's leaf-insertion log into a Merkle tree, locate the
//! caller's commitment, assemble the circuit witness, prove in the
//! background, verify locally, confirm the root is still accepted, then
//! submit positional calldata. [`Orchestrator`] drives that path for any
//! [`OperationKind`]; the individual stages are exposed for callers that
//! bring their own ledger access (the proof server does).

pub mod calldata;
pub mod config;
pub mod deriver;
pub mod error;
pub mod field;
pub mod freshness;
pub mod hook;
pub mod ledger;
pub mod operation;
pub mod orchestrator;
pub mod pipeline;
pub mod tree_builder;
pub mod witness;

pub use calldata::{format_submission, PoolKey, SolidityProof, Submission};
pub use config::ClientConfig;
pub use deriver::{derive, Derived};
pub use error::{LedgerError, PrivacyError, Revert};
pub use freshness::ensure_fresh;
pub use hook::{HookContext, HookPayload, SwapPattern};
pub use ledger::{Ledger, LeafInsertion, MemoryLedger, SubmitReceipt};
pub use operation::{
    CircuitId, Derivation, OperationDescriptor, OperationKind, OperationParams, SecretMaterial,
};
pub use orchestrator::{OriginReceipt, Orchestrator, WithdrawReceipt, WithdrawRequest};
pub use pipeline::{CancelToken, Groth16Prover, PipelineState, ProofPipeline, Prover, ProvingTask};
pub use tree_builder::{rebuild, Inclusion, RebuiltTree};
pub use witness::{CircuitInstance, Witness, WitnessAssembler, WitnessValue};

pub use unizwap_prover::ProofWithInputs;
