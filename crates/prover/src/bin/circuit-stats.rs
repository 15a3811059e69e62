//! Circuit statistics utility - reports constraint counts and proof timing
//!
//! Usage:
//!   cargo run --release --bin circuit-stats           # Just constraint counts
//!   cargo run --release --bin circuit-stats -- --time # Include proof timing (needs keys)

use std::path::Path;
use std::time::Instant;

use ark_bn254::Fr;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystem};

use unizwap_circuits::{
    position_commitment, token_commitment, MerkleTree, PositionRemoval, RemoveLiquidityCircuit,
    SwapWithdrawCircuit, TREE_DEPTH,
};
use unizwap_prover::{prove, setup::CircuitKeys};

fn count_constraints<C: ConstraintSynthesizer<Fr>>(circuit: C, name: &str) -> usize {
    let cs = ConstraintSystem::<Fr>::new_ref();
    circuit.generate_constraints(cs.clone()).unwrap();
    let count = cs.num_constraints();
    println!(
        "{:25} {:>8} constraints {:>4} public inputs",
        name,
        count,
        cs.num_instance_variables() - 1
    );
    count
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let include_timing = args.iter().any(|a| a == "--time");

    println!("=== Private hook circuit stats ===\n");
    println!("Tree depth: {}", TREE_DEPTH);
    println!("Leaf slots: {}\n", 1u64 << TREE_DEPTH);

    let swap_count = count_constraints(SwapWithdrawCircuit::empty(), "SwapWithdraw");
    let remove_count = count_constraints(RemoveLiquidityCircuit::empty(), "RemoveLiquidity");

    // Poseidon dominates: one H2 per tree level plus the commitment hashes
    let per_level = 240;
    println!(
        "\nMerkle path share: ~{} of {} / {}",
        per_level * TREE_DEPTH,
        swap_count,
        remove_count
    );

    if include_timing {
        let keys_path = Path::new("keys");
        if CircuitKeys::present_in(keys_path) {
            run_timing_benchmarks(keys_path);
        } else {
            println!("\nKeys not found. Generate keys first with:");
            println!("  cargo run --release --bin export-vks");
        }
    } else {
        println!("\n(Run with --time to include proof generation timing)");
    }
}

fn run_timing_benchmarks(keys_path: &Path) {
    println!("\nLoading keys from {:?}...", keys_path);
    let start = Instant::now();
    let keys = match CircuitKeys::load_from_directory(keys_path) {
        Ok(k) => k,
        Err(e) => {
            println!("Failed to load keys: {}", e);
            return;
        }
    };
    println!("Keys loaded in {:?}\n", start.elapsed());

    let (secret, nonce) = (Fr::from(111111u64), Fr::from(222222u64));
    let (token, amount) = (Fr::from(0xf335u64), Fr::from(1000u64));
    let swap_tree =
        MerkleTree::from_leaves(TREE_DEPTH, vec![token_commitment(token, amount, secret, nonce)]);

    let removal = PositionRemoval {
        token_a: Fr::from(1u64),
        token_b: Fr::from(2u64),
        token_id: Fr::from(23014u64),
        liquidity: Fr::from(1_000_000u64),
    };
    let lp_tree = MerkleTree::from_leaves(
        TREE_DEPTH,
        vec![position_commitment(secret, nonce, removal.token_id)],
    );

    const RUNS: u32 = 3;

    let start = Instant::now();
    for _ in 0..RUNS {
        let circuit = SwapWithdrawCircuit::new(token, amount, secret, nonce, swap_tree.path(0));
        prove::prove_swap_withdraw(&keys.swap_withdraw.proving_key, circuit)
            .expect("swap withdraw proof");
    }
    println!("SwapWithdraw      avg {:?}", start.elapsed() / RUNS);

    let start = Instant::now();
    for _ in 0..RUNS {
        let circuit = RemoveLiquidityCircuit::new(removal, secret, nonce, lp_tree.path(0));
        prove::prove_remove_liquidity(&keys.remove_liquidity.proving_key, circuit)
            .expect("remove liquidity proof");
    }
    println!("RemoveLiquidity   avg {:?}", start.elapsed() / RUNS);
}
