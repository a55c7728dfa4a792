//! Error definitions for circuit construction, proving and artifact handling.
//!
//! Every variant belongs to exactly one [`ErrorKind`], so callers can tell a
//! forged witness apart from a missing file without matching on messages.
use std::path::PathBuf;

use ark_relations::r1cs::SynthesisError;
use ark_serialize::SerializationError;
use thiserror::Error;

use crate::artifacts::Artifact;

/// Broad failure categories. None of them is retried automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed circuit parameters; construction aborts.
    Configuration,
    /// The circuit could not be turned into a constraint system.
    Compilation,
    /// Key generation failed.
    Setup,
    /// The inputs violate a constraint or leave a wire unassigned.
    Witness,
    /// The proving backend failed on a satisfied witness.
    Proving,
    /// Reading or writing an artifact failed.
    Artifact,
    /// A proof or its public inputs could not be checked.
    Verification,
}

/// Errors that can occur while building, proving or verifying circuit functions
#[derive(Error, Debug)]
pub enum ProverError {
    /// Generalized index does not address a node at the depth implied by the proof
    #[error("Invalid gindex {gindex}: a proof of {proof_len} siblings needs a gindex in [2^{proof_len}, 2^{})", .proof_len + 1)]
    InvalidGIndex { gindex: u64, proof_len: usize },

    /// Proof is too long for a 64-bit generalized index
    #[error("Proof of {0} siblings is too deep for a 64-bit gindex")]
    ProofTooDeep(usize),

    /// Leaf count handed to the tree reduction is not a power of two
    #[error("Leaf count must be a non-zero power of two, got {0}")]
    LeafCountNotPowerOfTwo(usize),

    /// Leaf count whose input buffer would not fit in memory
    #[error("Too many leaves: {0}")]
    TooManyLeaves(usize),

    /// Fewer leaves supplied than the reduction was asked to consume
    #[error("Not enough leaves: need {needed}, got {got}")]
    NotEnoughLeaves { needed: usize, got: usize },

    /// A byte buffer has the wrong width
    #[error("Invalid length for {what}: expected {expected} bytes, got {got}")]
    InvalidLength {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    /// Constraint synthesis failed while compiling the circuit
    #[error("Compilation failed: {0}")]
    Compilation(SynthesisError),

    /// Key generation failed
    #[error("Setup failed: {0}")]
    Setup(SynthesisError),

    /// Constraint synthesis failed while computing a witness
    #[error("Synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),

    /// A witness value was needed but never assigned
    #[error("Witness incomplete: {0}")]
    WitnessMissing(&'static str),

    /// The witness does not satisfy the constraint system
    #[error("Unsatisfied constraint: {0}")]
    Unsatisfied(String),

    /// Witness shape does not match the compiled constraint system
    #[error("Witness does not match constraint system: expected {expected} {what}, got {got}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    /// The proving backend rejected a satisfied witness
    #[error("Proving failed: {0}")]
    Proving(SynthesisError),

    /// Reading or writing an artifact failed
    #[error("Failed to {action} {artifact} at {}: {source}", .path.display())]
    ArtifactIo {
        artifact: Artifact,
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An artifact was read but its encoding is corrupt or truncated
    #[error("Failed to decode {artifact}: {source}")]
    ArtifactDecode {
        artifact: Artifact,
        #[source]
        source: SerializationError,
    },

    /// An artifact could not be encoded
    #[error("Failed to encode {artifact}: {message}")]
    ArtifactEncode { artifact: Artifact, message: String },

    /// A JSON artifact could not be parsed or rendered
    #[error("Invalid JSON in {artifact}: {source}")]
    Json {
        artifact: Artifact,
        #[source]
        source: serde_json::Error,
    },

    /// Proof bytes or coordinates are not a valid Groth16 proof
    #[error("Malformed proof: {0}")]
    MalformedProof(String),

    /// A public input is not a canonical field element
    #[error("Invalid public input: {0}")]
    InvalidPublicInput(String),

    /// The verifier could not evaluate the proof
    #[error("Verification error: {0}")]
    Verification(SynthesisError),
}

impl ProverError {
    /// Category of this error, see [`ErrorKind`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidGIndex { .. }
            | Self::ProofTooDeep(_)
            | Self::LeafCountNotPowerOfTwo(_)
            | Self::TooManyLeaves(_)
            | Self::NotEnoughLeaves { .. } => ErrorKind::Configuration,
            Self::Compilation(_) => ErrorKind::Compilation,
            Self::Setup(_) => ErrorKind::Setup,
            Self::InvalidLength { .. }
            | Self::Synthesis(_)
            | Self::WitnessMissing(_)
            | Self::Unsatisfied(_)
            | Self::ShapeMismatch { .. } => ErrorKind::Witness,
            Self::Proving(_) => ErrorKind::Proving,
            Self::ArtifactIo { .. }
            | Self::ArtifactDecode { .. }
            | Self::ArtifactEncode { .. }
            | Self::Json { .. } => ErrorKind::Artifact,
            Self::MalformedProof(_) | Self::InvalidPublicInput(_) | Self::Verification(_) => {
                ErrorKind::Verification
            }
        }
    }

    /// Maps an error raised while synthesizing onto the backend's error type.
    ///
    /// `ConstraintSynthesizer` can only return `SynthesisError`, so anything
    /// that is not already one collapses to `Unsatisfiable`.
    pub(crate) fn into_synthesis(self) -> SynthesisError {
        match self {
            Self::Synthesis(e) => e,
            other => {
                tracing::error!("circuit definition failed: {}", other);
                SynthesisError::Unsatisfiable
            }
        }
    }
}

/// Result type for prover operations
pub type Result<T> = std::result::Result<T, ProverError>;
