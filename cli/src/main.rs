//! # ssz-prover
//!
//! Compiles, proves and verifies the built-in SSZ circuit functions.
//!
//! ```text
//! ssz-prover --compile --circuit build
//! ssz-prover --prove   --circuit build --data data     # reads data/witness.json
//! ssz-prover --verify  --circuit build --data data     # reads data/proof.json
//! ```
//!
//! Exits non-zero on any failure, including a proof that does not verify.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{ArgGroup, Parser, ValueEnum};
use ssz_config::SszConfig;
use ssz_prover::{
    ArtifactPaths, Circuit, CircuitBuild, CircuitFunction, InclusionCircuit, ListRootCircuit,
    artifacts,
    witness::{InclusionWitness, ListWitness},
};
use tracing::{info, warn};

const INCLUSION_WITNESS_FILE: &str = "witness.json";
const LIST_WITNESS_FILE: &str = "leaves.json";

#[derive(Parser, Debug)]
#[command(name = "ssz-prover")]
#[command(about = "Groth16 proofs of SSZ Merkle inclusion", long_about = None)]
#[command(group(
    ArgGroup::new("mode")
        .required(true)
        .args(["compile", "prove", "verify", "sample_config"])
))]
struct Args {
    /// Compile the circuit, run setup and export the artifacts
    #[arg(long)]
    compile: bool,

    /// Prove the witness in the data directory
    #[arg(long)]
    prove: bool,

    /// Verify the proof in the data directory
    #[arg(long)]
    verify: bool,

    /// Print a sample configuration file
    #[arg(long)]
    sample_config: bool,

    /// Artifact directory (defaults to the configured build directory)
    #[arg(long, env = "SSZ_BUILD_DIR")]
    circuit: Option<PathBuf>,

    /// Directory holding the witness and the proof
    #[arg(long)]
    data: Option<PathBuf>,

    /// Which circuit to build or prove
    #[arg(long, value_enum, default_value_t = CircuitKind::Inclusion)]
    kind: CircuitKind,

    /// Inclusion proof depth (overrides the config)
    #[arg(long)]
    depth: Option<usize>,

    /// Leaves in the list root circuit (overrides the config)
    #[arg(long)]
    leaves: Option<usize>,

    /// Explicit config file
    #[arg(long, env = "SSZ_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum CircuitKind {
    Inclusion,
    ListRoot,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    if args.sample_config {
        print!("{}", SszConfig::generate_sample());
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => SszConfig::load_from(path)?,
        None => SszConfig::load()?,
    };
    if SszConfig::set_global(config.clone()).is_err() {
        warn!("Global config was already initialized");
    }

    let circuit_dir = args
        .circuit
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.artifacts.dir));
    let mut paths = ArtifactPaths::from_config(&config.artifacts, &circuit_dir);

    if args.compile {
        return compile(&args, &config, &paths);
    }

    let data_dir = args
        .data
        .clone()
        .context("--data is required with --prove and --verify")?;
    paths.proof = data_dir.join(&config.artifacts.proof);

    if args.prove {
        prove(&args, &paths, &data_dir)
    } else {
        verify(&paths)
    }
}

fn compile(args: &Args, config: &SszConfig, paths: &ArtifactPaths) -> Result<()> {
    match args.kind {
        CircuitKind::Inclusion => {
            let depth = args.depth.unwrap_or(config.circuit.depth);
            info!("Compiling inclusion circuit of depth {}", depth);
            build_and_export(CircuitFunction::new(InclusionCircuit::new(depth)?), paths)
        }
        CircuitKind::ListRoot => {
            let leaves = args.leaves.unwrap_or(config.circuit.list_leaves);
            info!("Compiling list root circuit over {} leaves", leaves);
            build_and_export(CircuitFunction::new(ListRootCircuit::new(leaves)?), paths)
        }
    }
}

fn build_and_export<C: Circuit + Clone>(
    function: CircuitFunction<C>,
    paths: &ArtifactPaths,
) -> Result<()> {
    let build = function.build().context("Failed to build circuit")?;
    build.export(paths).context("Failed to export artifacts")?;

    println!("Circuit id: {}", build.id()?);
    println!("Constraints: {}", build.r1cs().num_constraints);
    println!("Verifier contract: {}", paths.contract.display());
    Ok(())
}

fn prove(args: &Args, paths: &ArtifactPaths, data_dir: &Path) -> Result<()> {
    let build = CircuitBuild::import(paths).context("Failed to import build")?;

    match args.kind {
        CircuitKind::Inclusion => {
            let witness = InclusionWitness::load(&data_dir.join(INCLUSION_WITNESS_FILE))?;
            if !witness.is_consistent() {
                warn!(
                    "Witness path does not lead to root 0x{}",
                    hex::encode(witness.root)
                );
            }
            let function = CircuitFunction::new(witness.circuit()?);
            prove_and_save(function, &witness.input_bytes(), &build, paths)
        }
        CircuitKind::ListRoot => {
            let witness = ListWitness::load(&data_dir.join(LIST_WITNESS_FILE))?;
            let function = CircuitFunction::new(witness.circuit()?);
            prove_and_save(function, &witness.input_bytes(), &build, paths)
        }
    }
}

fn prove_and_save<C: Circuit + Clone>(
    mut function: CircuitFunction<C>,
    input: &[u8],
    build: &CircuitBuild,
    paths: &ArtifactPaths,
) -> Result<()> {
    let proof = function.prove(input, build).context("Failed to prove")?;

    let vk = artifacts::load_verifying_key(&paths.verifying_key)?;
    if !ssz_prover::verify(&vk, &proof)? {
        bail!("Fresh proof does not verify against {}", paths.verifying_key.display());
    }

    artifacts::save_proof(&paths.proof, &proof)?;
    println!("Input hash:  0x{}", hex::encode(proof.input_hash));
    println!("Output hash: 0x{}", hex::encode(proof.output_hash));
    println!("Proof: {}", paths.proof.display());
    Ok(())
}

fn verify(paths: &ArtifactPaths) -> Result<()> {
    let vk = artifacts::load_verifying_key(&paths.verifying_key)?;
    let proof = artifacts::load_proof(&paths.proof)?;

    if !ssz_prover::verify(&vk, &proof)? {
        bail!("Proof rejected: {}", paths.proof.display());
    }
    println!("Proof verified");
    Ok(())
}
