//! Groth16 circuit functions over BN254 with SSZ Merkle inclusion gadgets.
//!
//! A circuit function commits to its input and output bytes through two
//! truncated SHA-256 digests, the only public inputs of every proof:
//!
//! ```text
//! input bytes ──▶ Circuit::define ──▶ output bytes
//!      │                                   │
//!  sha256 & (2^253 - 1)             sha256 & (2^253 - 1)
//!      ▼                                   ▼
//!  input_hash (public)              output_hash (public)
//! ```

pub mod artifacts;
pub mod circuit;
pub mod circuits;
pub mod constants;
pub mod contract;
pub mod errors;
pub mod function;
pub mod native;
pub mod pipeline;
pub mod proof;
pub mod r1cs;
pub mod witness;


pub use artifacts::{Artifact, ArtifactPaths, load_verifying_key};
pub use circuits::{InclusionCircuit, ListRootCircuit};
pub use contract::VerifierContract;
pub use errors::{ErrorKind, ProverError, Result};
pub use function::{Circuit, CircuitFunction};
pub use pipeline::{CircuitBuild, verify};
pub use proof::Groth16Proof;
pub use r1cs::R1cs;
