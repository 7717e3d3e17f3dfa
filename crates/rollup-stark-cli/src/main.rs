//! Rollup STARK CLI - sequencer simulation, proof verification and inspection
//!
//! This tool provides commands for:
//! - Simulating a sequencer: assembling, proving, verifying and committing
//!   batches of mock inner proofs over a fresh world state
//! - Verifying rollup proofs written by the simulation
//! - Inspecting the public inputs carried in a proof
//!
//! Every command runs against the testing circuit (small trees, fast proof
//! options) unless `--config` points at a JSON-encoded `RollupConfig`.

use anyhow::{bail, Context, Result};
use base64::Engine;
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use rollup_stark_batch::{
    build_batch, decode_proof_bytes, RollupCircuitData, RollupConfig, RollupProof, RollupProver,
    RollupResult, RollupVerifier, SerializableRollupProof, WorldState,
};
use rollup_stark_inner::{
    derive_key, AccountTx, HashProofSystem, JoinSplitTx, RawInnerProof, ValueNote,
};
use rollup_stark_primitives::{digest_is_zero, digest_to_hex, Digest, DIGEST_ZERO};

/// How simulated proofs are written to disk
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ProofFormat {
    /// Versioned JSON envelope with metadata
    Json,
    /// Raw proof bytes, base64-encoded
    Base64,
}

#[derive(Parser)]
#[command(name = "rollup-stark")]
#[command(author, version, about = "STARK rollup batch proofs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a sequencer over a fresh world state with mock inner proofs
    Simulate {
        /// Number of batches to produce
        #[arg(short, long, default_value = "2")]
        batches: usize,

        /// Transactions per batch
        #[arg(short, long, default_value = "3")]
        txs: usize,

        /// Requested batch width (rounded up to a supported width)
        #[arg(short, long, default_value = "4")]
        width: usize,

        /// Directory to write proofs to
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format for written proofs
        #[arg(long, value_enum, default_value = "json")]
        format: ProofFormat,

        /// Rollup configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Verify a rollup proof
    Verify {
        /// Proof file (JSON envelope or base64 proof bytes)
        #[arg(short, long)]
        proof: PathBuf,

        /// Rollup configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Decode and print the public inputs of a rollup proof
    Inspect {
        /// Proof file (JSON envelope or base64 proof bytes)
        #[arg(short, long)]
        proof: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            batches,
            txs,
            width,
            output,
            format,
            config,
        } => simulate(batches, txs, width, output, format, config),

        Commands::Verify { proof, config } => verify(proof, config),

        Commands::Inspect { proof } => inspect(proof),
    }
}

fn load_config(path: Option<&Path>) -> Result<RollupConfig> {
    let Some(path) = path else {
        return Ok(RollupConfig::testing());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: RollupConfig = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config in {}", path.display()))?;
    Ok(config)
}

/// A proof read from disk
struct LoadedProof {
    proof_bytes: Vec<u8>,
    /// Present when the file held a JSON envelope
    envelope: Option<RollupProof>,
}

fn load_proof(path: &Path) -> Result<LoadedProof> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read proof file {}", path.display()))?;
    let trimmed = contents.trim();

    if trimmed.starts_with('{') {
        let proof = SerializableRollupProof::from_json(trimmed)
            .context("Failed to parse proof JSON")?
            .into_proof();
        Ok(LoadedProof {
            proof_bytes: proof.proof_bytes.clone(),
            envelope: Some(proof),
        })
    } else {
        let proof_bytes = base64::engine::general_purpose::STANDARD
            .decode(trimmed)
            .context("Failed to decode base64 proof")?;
        Ok(LoadedProof {
            proof_bytes,
            envelope: None,
        })
    }
}

fn write_proof(dir: &Path, proof: &RollupProof, format: ProofFormat) -> Result<PathBuf> {
    let batch_id = proof.metadata.batch_id;
    let (path, contents) = match format {
        ProofFormat::Json => (
            dir.join(format!("batch_{batch_id:04}.json")),
            SerializableRollupProof::new(proof.clone()).to_json()?,
        ),
        ProofFormat::Base64 => (
            dir.join(format!("batch_{batch_id:04}.b64")),
            base64::engine::general_purpose::STANDARD.encode(&proof.proof_bytes),
        ),
    };
    fs::write(&path, contents)
        .with_context(|| format!("Failed to write proof to {}", path.display()))?;
    Ok(path)
}

/// Mock wallet driving the simulated transactions
///
/// Deposits mint notes, every third transaction spends the oldest unspent
/// note and every fifth registers an account.
struct Wallet {
    system: Arc<HashProofSystem>,
    unspent: Vec<ValueNote>,
    next_nonce: u64,
}

impl Wallet {
    const DEPOSIT: u64 = 1_000;
    const FEE: u64 = 10;
    const ASSET_ID: u32 = 1;

    fn new(system: Arc<HashProofSystem>) -> Self {
        Self {
            system,
            unspent: Vec::new(),
            next_nonce: 1,
        }
    }

    fn nonce(&mut self) -> u64 {
        let nonce = self.next_nonce;
        self.next_nonce += 1;
        nonce
    }

    fn note(&mut self, value: u64) -> ValueNote {
        let nonce = self.nonce();
        ValueNote {
            owner: derive_key("owner", nonce),
            value,
            asset_id: Self::ASSET_ID,
            secret: derive_key("secret", nonce),
            nonce,
        }
    }

    fn next_tx(&mut self, seq: usize) -> Result<RawInnerProof> {
        if seq % 5 == 4 {
            let alias_id = self.nonce();
            let record = AccountTx {
                alias_id,
                owner_key: derive_key("account", alias_id),
                signing_keys: [
                    derive_key("signing-a", alias_id),
                    derive_key("signing-b", alias_id),
                ],
                migrate: false,
            }
            .record();
            return Ok(self.system.prove(&record));
        }

        let spend = seq % 3 == 2 && !self.unspent.is_empty();
        let tx = if spend {
            let input = self.unspent.remove(0);
            let output = self.note(input.value.saturating_sub(Self::FEE));
            JoinSplitTx {
                asset_id: Self::ASSET_ID,
                public_input: 0,
                public_output: 0,
                spending_key: derive_key("spending", input.nonce),
                input_owner: input.owner,
                output_owner: output.owner,
                input_notes: vec![input],
                output_notes: vec![output],
            }
        } else {
            let output = self.note(Self::DEPOSIT - Self::FEE);
            JoinSplitTx {
                asset_id: Self::ASSET_ID,
                public_input: Self::DEPOSIT,
                public_output: 0,
                spending_key: DIGEST_ZERO,
                input_owner: DIGEST_ZERO,
                output_owner: output.owner,
                input_notes: Vec::new(),
                output_notes: vec![output],
            }
        };

        let record = tx.record().context("Failed to build join-split")?;
        self.unspent.extend(tx.output_notes);
        Ok(self.system.prove(&record))
    }
}

fn simulate(
    batches: usize,
    txs: usize,
    width: usize,
    output: Option<PathBuf>,
    format: ProofFormat,
    config: Option<PathBuf>,
) -> Result<()> {
    if batches == 0 || txs == 0 {
        bail!("--batches and --txs must be at least 1");
    }

    let config = load_config(config.as_deref())?;
    let (circuit, system) =
        RollupCircuitData::with_mock_system(config).context("Failed to set up rollup circuit")?;
    let circuit = Arc::new(circuit);
    let prover = RollupProver::new(circuit.clone());
    let verifier = RollupVerifier::new(circuit.clone()).context("Invalid proof options")?;

    let mut state = WorldState::new(&circuit.config.depths).context("Failed to create world state")?;
    let mut wallet = Wallet::new(system);

    if let Some(ref dir) = output {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }

    println!();
    println!("========================================");
    println!("  Rollup Sequencer Simulation");
    println!("========================================");
    println!();
    println!("Configuration:");
    println!("  Batches: {batches}");
    println!("  Transactions per batch: {txs}");
    println!("  Requested width: {width}");
    println!("  Supported widths: {:?}", circuit.config.supported_widths);
    println!(
        "  Tree depths: data {}, nullifier {}, roots {}",
        circuit.config.depths.data, circuit.config.depths.nullifier, circuit.config.depths.roots
    );
    println!();
    println!("Genesis data root: {}", digest_to_hex(&state.data_root()));
    println!();

    let mut total_proving_time = Duration::ZERO;
    let mut total_proof_size = 0;
    let mut seq = 0;

    for _ in 0..batches {
        let proofs = (0..txs)
            .map(|_| {
                let proof = wallet.next_tx(seq);
                seq += 1;
                proof
            })
            .collect::<Result<Vec<_>>>()?;

        let batch = build_batch(&state, &circuit, width, &proofs)
            .with_context(|| format!("Failed to assemble batch {}", state.next_batch_id()))?;

        println!("--- Batch {} ---", batch.batch_id);
        println!(
            "  Width: {} (requested {}), start index {}",
            batch.width, batch.requested_width, batch.data_start_index
        );
        println!("  Transactions: {} real, {} padding", batch.num_real(), batch.width - batch.num_real());

        let start = Instant::now();
        let proof = prover
            .prove(&batch)
            .with_context(|| format!("Failed to prove batch {}", batch.batch_id))?;
        let prove_time = start.elapsed();
        total_proving_time += prove_time;
        total_proof_size += proof.metadata.proof_size;
        println!("  Proved in {prove_time:?} ({} bytes)", proof.metadata.proof_size);

        let verification = verifier.verify_proof(&proof)?;
        if !verification.is_valid_transition_from(&state.roots()) {
            bail!(
                "Batch {} failed verification: {}",
                batch.batch_id,
                verification.error.as_deref().unwrap_or("does not extend the current state")
            );
        }
        println!("  Verified in {} ms", verification.verification_time_ms);

        batch
            .commit_to(&mut state)
            .with_context(|| format!("Failed to commit batch {}", batch.batch_id))?;
        println!("  Fees: {:?}", batch.total_fees);
        println!("  New data root: {}", digest_to_hex(&state.data_root()));

        if let Some(ref dir) = output {
            let path = write_proof(dir, &proof, format)?;
            println!("  Saved: {}", path.display());
        }
        println!();
    }

    info!(
        batches,
        data_size = state.data_size(),
        nullifiers = state.nullifiers().len(),
        "simulation complete"
    );

    println!("========================================");
    println!("  Simulation Complete");
    println!("========================================");
    println!();
    println!("Summary:");
    println!("  Batches: {batches}");
    println!("  Transactions: {seq}");
    println!("  Notes in data tree: {}", state.data_size());
    println!("  Nullifiers: {}", state.nullifiers().len());
    println!("  Total proving time: {total_proving_time:?}");
    println!("  Avg proving time/batch: {:?}", average(total_proving_time, batches));
    println!("  Total proof size: {total_proof_size} bytes");
    println!("  Final data root: {}", digest_to_hex(&state.data_root()));
    println!("  Final nullifier root: {}", digest_to_hex(&state.nullifier_root()));
    println!("  Final roots root: {}", digest_to_hex(&state.roots_root()));

    Ok(())
}

fn average(total: Duration, count: usize) -> Duration {
    if count == 0 {
        return Duration::ZERO;
    }
    total.div_f64(count as f64)
}

fn verify(proof: PathBuf, config: Option<PathBuf>) -> Result<()> {
    let config = load_config(config.as_deref())?;
    let loaded = load_proof(&proof)?;
    let (circuit, _) =
        RollupCircuitData::with_mock_system(config).context("Failed to set up rollup circuit")?;
    let verifier = RollupVerifier::new(Arc::new(circuit)).context("Invalid proof options")?;

    eprintln!("Verifying proof...");
    eprintln!("  Proof size: {} bytes", loaded.proof_bytes.len());

    let result = match &loaded.envelope {
        Some(envelope) => verifier.verify_proof(envelope),
        None => verifier.verify(&loaded.proof_bytes),
    }
    .context("Failed to decode proof public inputs")?;

    eprintln!("  Batch: {}", result.decoded.batch_id);
    eprintln!("  Width: {}", result.decoded.width);

    if result.verified {
        eprintln!("Proof VALID (verified in {} ms)", result.verification_time_ms);
        println!("VALID");
        Ok(())
    } else {
        let reason = result.error.unwrap_or_default();
        eprintln!("Proof INVALID: {reason}");
        println!("INVALID: {reason}");
        std::process::exit(1);
    }
}

fn inspect(proof: PathBuf) -> Result<()> {
    let loaded = load_proof(&proof)?;
    let result =
        decode_proof_bytes(&loaded.proof_bytes).context("Failed to decode proof public inputs")?;
    debug!(elements = rollup_stark_batch::public_input_len(result.width), "decoded public inputs");

    println!("Proof Inspection:");
    match &loaded.envelope {
        Some(envelope) => {
            let metadata = &envelope.metadata;
            println!("  Format: JSON with metadata");
            println!("  Proof Hash: {}", envelope.proof_hash);
            println!("  Hash Matches: {}", envelope.hash_matches());
            println!("  Prover Version: {}", metadata.prover_version);
            println!("  Proving Time: {} ms", metadata.proving_time_ms);
            println!("  Trace Length: {}", metadata.trace_length);
        }
        None => {
            println!("  Format: Raw base64");
            println!("  Proof Hash: {}", RollupProof::compute_hash(&loaded.proof_bytes).to_hex());
        }
    }
    println!("  Proof Size: {} bytes", loaded.proof_bytes.len());
    println!();
    print_public_inputs(&result);

    Ok(())
}

fn print_public_inputs(result: &RollupResult) {
    let hex = |digest: &Digest| digest_to_hex(digest);

    println!("Public Inputs:");
    println!("  Batch ID: {}", result.batch_id);
    println!("  Width: {}", result.width);
    println!("  Data Start Index: {}", result.data_start_index);
    println!("  Data Root: {} -> {}", hex(&result.old_data_root), hex(&result.new_data_root));
    println!(
        "  Nullifier Root: {} -> {}",
        hex(&result.old_nullifier_root),
        hex(&result.new_nullifier_root)
    );
    println!("  Roots Root: {} -> {}", hex(&result.old_roots_root), hex(&result.new_roots_root));
    println!("  Total Fees: {:?}", result.total_fees);
    println!("  Effective Transactions: {}", result.num_effective());
    println!();

    for (slot, record) in result.inner_proofs.iter().enumerate() {
        if record.is_zero_effect() {
            println!("  Slot {slot}: padding");
            continue;
        }
        println!("  Slot {slot}: {} (asset {}, fee {})", record.kind, record.asset_id, record.tx_fee);
        for note in record.notes().iter().filter(|n| !digest_is_zero(n)) {
            println!("    note      {}", hex(note));
        }
        for nullifier in record.nullifiers().iter().filter(|n| !digest_is_zero(n)) {
            println!("    nullifier {}", hex(nullifier));
        }
    }
}
