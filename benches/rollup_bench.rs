//! Rollup STARK benchmarks using Criterion
//!
//! Run with: cargo bench

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use rollup_stark_batch::{
    build_batch, RollupCircuitData, RollupConfig, RollupProver, RollupVerifier, WorldState,
};
use rollup_stark_inner::{derive_key, HashProofSystem, JoinSplitTx, RawInnerProof, ValueNote};

fn note(label: &str, seed: u64, value: u64) -> ValueNote {
    ValueNote {
        owner: derive_key(label, seed),
        value,
        asset_id: 1,
        secret: derive_key("secret", seed),
        nonce: seed,
    }
}

fn transfers(system: &HashProofSystem, count: usize) -> Vec<RawInnerProof> {
    (0..count as u64)
        .map(|seed| {
            let input = note("input", seed, 1_000);
            let output = note("output", seed, 990);
            let tx = JoinSplitTx {
                asset_id: 1,
                public_input: 0,
                public_output: 0,
                spending_key: derive_key("spending", seed),
                input_owner: input.owner,
                output_owner: output.owner,
                input_notes: vec![input],
                output_notes: vec![output],
            };
            system.prove(&tx.record().expect("transfer balances"))
        })
        .collect()
}

fn setup() -> (Arc<RollupCircuitData>, Arc<HashProofSystem>, WorldState) {
    let (circuit, system) =
        RollupCircuitData::with_mock_system(RollupConfig::testing()).expect("testing circuit");
    let state = WorldState::new(&circuit.config.depths).expect("testing depths");
    (Arc::new(circuit), system, state)
}

fn bench_assembly(c: &mut Criterion) {
    let (circuit, system, state) = setup();
    let mut group = c.benchmark_group("batch_assembly");

    for width in [1usize, 2, 4, 8] {
        let proofs = transfers(&system, width);
        group.throughput(Throughput::Elements(width as u64));
        group.bench_with_input(BenchmarkId::new("width", width), &width, |b, &width| {
            b.iter(|| {
                build_batch(black_box(&state), &circuit, width, black_box(&proofs))
                    .expect("batch assembly failed")
            })
        });
    }

    group.finish();
}

fn bench_proving(c: &mut Criterion) {
    let (circuit, system, state) = setup();
    let prover = RollupProver::new(circuit.clone());
    let mut group = c.benchmark_group("rollup_proving");
    group.sample_size(10);

    for width in [1usize, 2, 4] {
        let batch = build_batch(&state, &circuit, width, &transfers(&system, width))
            .expect("batch assembly failed");
        group.throughput(Throughput::Elements(width as u64));
        group.bench_with_input(BenchmarkId::new("width", width), &batch, |b, batch| {
            b.iter(|| prover.prove(black_box(batch)).expect("proof generation failed"))
        });
    }

    group.finish();
}

fn bench_verification(c: &mut Criterion) {
    let (circuit, system, state) = setup();
    let verifier = RollupVerifier::new(circuit.clone()).expect("testing options");
    let batch = build_batch(&state, &circuit, 2, &transfers(&system, 2)).expect("batch assembly failed");
    let proof = RollupProver::new(circuit.clone())
        .prove(&batch)
        .expect("proof generation failed");

    c.bench_function("rollup_verification", |b| {
        b.iter(|| {
            verifier
                .verify(black_box(&proof.proof_bytes))
                .expect("verification failed")
        })
    });
}

criterion_group!(benches, bench_assembly, bench_proving, bench_verification);
criterion_main!(benches);
